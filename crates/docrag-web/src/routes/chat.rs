//! Chat endpoint: runs the RAG pipeline and relays the fragment stream.

use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub query: String,
    pub model: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Answer a documentation question, streaming the response as plain text.
///
/// Failures before the stream starts map to a 500 with a generic detail
/// message. Once fragments are flowing, a backend fault aborts the chunked
/// body instead; the caller must treat an unexpectedly closed stream as a
/// failed response. Dropping the connection drops the body stream, which
/// cancels the generation upstream.
pub async fn chat_query(
    State(state): State<AppState>,
    Json(chat): Json<ChatQuery>,
) -> Response {
    match state.pipeline.run(&chat.query, &chat.model).await {
        Ok(stream) => {
            let fragments = futures::stream::unfold(stream, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            });

            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(fragments),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "chat workflow failed before streaming");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    detail: "Internal server error during chat workflow.".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_query_deserialization() {
        let chat: ChatQuery = serde_json::from_str(
            r#"{"query": "what is cmd in golang", "model": "local-small-model"}"#,
        )
        .unwrap();

        assert_eq!(chat.query, "what is cmd in golang");
        assert_eq!(chat.model, "local-small-model");
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorBody {
            detail: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"detail": "boom"}));
    }
}
