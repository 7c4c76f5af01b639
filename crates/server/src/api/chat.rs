use crate::auth::Authorized;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONNECTION;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use docchat_core::AppResult;
use docchat_knowledge::{ChatRequest, StreamEvent};
use docchat_llm::sse::DONE_MARKER;
use futures::StreamExt;
use tracing::Instrument;

/// POST /api/chat: answer a question over the supplied documents.
///
/// Authorization is checked before the body is read. A body that does not
/// decode is a 400 and other pre-stream failures are 500s, all as JSON
/// errors; once streaming has started a failure closes
/// the connection without the `[DONE]` frame. Dropping the response body
/// (client disconnect) cancels generation.
pub async fn chat(
    _auth: Authorized,
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let span = tracing::info_span!(
        "chat",
        model = %request.model,
        documents = request.indexed_docs.len(),
        history = request.history.len()
    );

    let answer = state.pipeline.answer(request).instrument(span).await?;

    let events = answer.map(|item| item.and_then(to_sse_event));

    Ok(([(CONNECTION, "keep-alive")], Sse::new(events)))
}

/// Encode one answer event as a `data:` frame.
pub fn to_sse_event(event: StreamEvent) -> AppResult<Event> {
    match event {
        StreamEvent::Delta(delta) => Ok(Event::default().data(serde_json::to_string(&delta)?)),
        StreamEvent::Done => Ok(Event::default().data(DONE_MARKER)),
    }
}
