use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::handlers::ServerState;
use crate::makeover::{redesign, RedesignError};
use crate::utils::timing::{complete_request_timer, start_request_timer};

const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: imageBase64, mimeType, prompt";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedesignRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

impl IntoResponse for RedesignError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            RedesignError::Input(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            RedesignError::Configuration(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
            RedesignError::Upstream(_)
            | RedesignError::Unintelligible
            | RedesignError::ImageNotProduced => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to process redesign request",
                    "details": self.to_string()
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn handle_redesign(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<RedesignRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected redesign request body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(json!({ "error": format!("Invalid request body: {}", rejection.body_text()) })),
            )
                .into_response();
        }
    };

    let (Some(image_base64), Some(mime_type), Some(prompt)) = (
        non_blank(request.image_base64),
        non_blank(request.mime_type),
        non_blank(request.prompt),
    ) else {
        return RedesignError::Input(MISSING_FIELDS_MESSAGE.to_string()).into_response();
    };

    let mut timer = start_request_timer("redesign", "http", Some(&prompt));
    match redesign(&state.client, &image_base64, &mime_type, &prompt).await {
        Ok(outcome) => {
            complete_request_timer(
                &mut timer,
                "success",
                Some(format!(
                    "products={} dimensions={}",
                    outcome.products.len(),
                    outcome.estimated_dimensions.is_some()
                )),
            );
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(err) => {
            if err.is_input() {
                warn!("Rejected redesign request: {}", err);
            }
            complete_request_timer(&mut timer, "error", Some(err.kind().to_string()));
            err.into_response()
        }
    }
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}
