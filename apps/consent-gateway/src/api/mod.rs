// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ErrorBody, ErrorKind},
    models::{
        ConsentListEntry, ConsentListResponse, ConsentRequest, GrantConsentResponse,
        HealthResponse, LivenessResponse, RevokeConsentResponse, VerifyConsentResponse,
    },
    state::AppState,
};

pub mod consent;
pub mod health;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let consent_routes = Router::new()
        .route("/grant", post(consent::grant_consent))
        .route("/revoke", post(consent::revoke_consent))
        .route("/verify/{child_id_hash}", get(consent::verify_consent))
        .route("/list", get(consent::list_consents));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/api/consent", consent_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        consent::grant_consent,
        consent::revoke_consent,
        consent::verify_consent,
        consent::list_consents
    ),
    components(
        schemas(
            ConsentRequest,
            GrantConsentResponse,
            RevokeConsentResponse,
            VerifyConsentResponse,
            ConsentListEntry,
            ConsentListResponse,
            HealthResponse,
            LivenessResponse,
            ErrorBody,
            ErrorKind
        )
    ),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Consent", description = "Parental consent registry")
    )
)]
struct ApiDoc;
