//! In-process stand-in for the Gemini REST API, used by tests.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub enum MockReply {
    /// A candidate whose only part is this text.
    Text(String),
    /// A candidate carrying an inline image after a short text part.
    Image { mime_type: String, data: String },
    /// A candidate with text but no image.
    Empty,
    Status(u16, Value),
}

impl MockReply {
    pub fn png(data: &str) -> Self {
        MockReply::Image {
            mime_type: "image/png".to_string(),
            data: data.to_string(),
        }
    }

    fn into_response(self) -> Response {
        match self {
            MockReply::Text(text) => Json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
            }))
            .into_response(),
            MockReply::Image { mime_type, data } => Json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [
                    { "text": "Here is the redesigned room." },
                    { "inlineData": { "mimeType": mime_type, "data": data } }
                ] } }]
            }))
            .into_response(),
            MockReply::Empty => Json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [
                    { "text": "I can only describe the room in words." }
                ] } }]
            }))
            .into_response(),
            MockReply::Status(code, body) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(body)).into_response()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub call: String,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct Recorded {
    brief: Vec<RecordedRequest>,
    image: Vec<RecordedRequest>,
}

#[derive(Clone)]
struct MockState {
    brief_reply: MockReply,
    image_reply: MockReply,
    recorded: Arc<Mutex<Recorded>>,
}

pub struct MockGemini {
    pub base_url: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockGemini {
    pub fn brief_calls(&self) -> usize {
        self.recorded.lock().brief.len()
    }

    pub fn image_calls(&self) -> usize {
        self.recorded.lock().image.len()
    }

    pub fn last_brief_request(&self) -> Option<RecordedRequest> {
        self.recorded.lock().brief.last().cloned()
    }

    pub fn last_image_request(&self) -> Option<RecordedRequest> {
        self.recorded.lock().image.last().cloned()
    }
}

async fn generate_content(
    State(state): State<MockState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request = RecordedRequest {
        call,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string()),
        body,
    };

    // Structured calls are the ones that declare a response schema.
    let is_brief = request
        .body
        .pointer("/generationConfig/responseSchema")
        .is_some();

    let mut recorded = state.recorded.lock();
    if is_brief {
        recorded.brief.push(request);
        state.brief_reply.into_response()
    } else {
        recorded.image.push(request);
        state.image_reply.into_response()
    }
}

/// Serves `POST /models/{model}:generateContent` on an ephemeral port.
pub async fn spawn_mock_gemini(brief_reply: MockReply, image_reply: MockReply) -> MockGemini {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let state = MockState {
        brief_reply,
        image_reply,
        recorded: recorded.clone(),
    };

    let app = Router::new()
        .route("/models/:call", post(generate_content))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock gemini listener");
    let addr = listener.local_addr().expect("mock gemini address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockGemini {
        base_url: format!("http://{addr}"),
        recorded,
    }
}
