//! Streaming answer generation.
//!
//! The upstream model stream is driven by a spawned task that forwards each
//! delta into a bounded channel. The channel is the only link between the
//! producer and whoever consumes the answer: when the consumer goes away
//! the producer notices, drops the upstream stream and stops.

use crate::types::StreamEvent;
use docchat_core::{AppError, AppResult};
use docchat_llm::{LlmRequest, LlmStream, ResolvedModel};
use futures::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of one answer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Streaming,
    Completed,
    Failed,
    /// The consumer disconnected before the answer finished
    Cancelled,
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationState::Idle => "idle",
            GenerationState::Streaming => "streaming",
            GenerationState::Completed => "completed",
            GenerationState::Failed => "failed",
            GenerationState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Opens streaming completions and relays them as [`StreamEvent`]s.
#[derive(Debug, Clone)]
pub struct Generator {
    buffer: usize,
    temperature: f32,
}

impl Generator {
    pub fn new(buffer: usize, temperature: f32) -> Self {
        Self {
            buffer: buffer.max(1),
            temperature,
        }
    }

    /// Open the upstream stream and start relaying it.
    ///
    /// Errors returned here happen before any event was produced. Every
    /// delta event carries `sources` when the list is non-empty.
    pub async fn start(
        &self,
        resolved: &ResolvedModel,
        prompt: String,
        sources: Vec<String>,
    ) -> AppResult<AnswerStream> {
        let request = LlmRequest::new(prompt, &resolved.model)
            .with_streaming()
            .with_temperature(self.temperature);

        debug!(
            provider = %resolved.provider,
            model = %resolved.model,
            state = %GenerationState::Idle,
            "Opening answer stream"
        );

        let upstream = resolved.client.stream(&request).await?;

        let sources = (!sources.is_empty()).then_some(sources);
        let (tx, rx) = mpsc::channel(self.buffer);
        let handle = tokio::spawn(relay(upstream, tx, sources.clone(), resolved.model.clone()));

        Ok(AnswerStream {
            rx,
            handle,
            sources,
        })
    }
}

/// Forward upstream chunks until completion, failure or disconnect.
async fn relay(
    mut upstream: LlmStream,
    tx: mpsc::Sender<AppResult<StreamEvent>>,
    sources: Option<Vec<String>>,
    model: String,
) -> GenerationState {
    let mut deltas = 0usize;

    let state = loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => break GenerationState::Cancelled,
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                if !chunk.content.is_empty() {
                    deltas += 1;
                    let event = StreamEvent::delta(chunk.content, sources.clone());
                    if tx.send(Ok(event)).await.is_err() {
                        break GenerationState::Cancelled;
                    }
                }
                if chunk.done {
                    break finish(&tx).await;
                }
            }
            Some(Err(e)) => {
                warn!(model = %model, deltas, "Answer stream failed: {}", e);
                let err = match e {
                    AppError::Stream(message) => AppError::Stream(message),
                    other => AppError::Stream(other.to_string()),
                };
                let _ = tx.send(Err(err)).await;
                break GenerationState::Failed;
            }
            None => break finish(&tx).await,
        }
    };

    // Releases the upstream connection before the state is reported.
    drop(upstream);

    match state {
        GenerationState::Completed => info!(model = %model, deltas, "Answer completed"),
        GenerationState::Cancelled => info!(model = %model, deltas, "Answer cancelled by client"),
        _ => {}
    }

    state
}

async fn finish(tx: &mpsc::Sender<AppResult<StreamEvent>>) -> GenerationState {
    match tx.send(Ok(StreamEvent::Done)).await {
        Ok(()) => GenerationState::Completed,
        Err(_) => GenerationState::Cancelled,
    }
}

/// Consumer side of an answer.
///
/// Yields delta events, then exactly one [`StreamEvent::Done`] on normal
/// completion or one error on failure. Dropping it cancels generation.
#[derive(Debug)]
pub struct AnswerStream {
    rx: mpsc::Receiver<AppResult<StreamEvent>>,
    handle: JoinHandle<GenerationState>,
    sources: Option<Vec<String>>,
}

impl AnswerStream {
    /// Citation labels attached to every delta, if any.
    pub fn sources(&self) -> Option<&[String]> {
        self.sources.as_deref()
    }

    /// Split into the event receiver and the producer task.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Receiver<AppResult<StreamEvent>>,
        JoinHandle<GenerationState>,
    ) {
        (self.rx, self.handle)
    }
}

impl Stream for AnswerStream {
    type Item = AppResult<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::{FixedResolver, ScriptedLlm, StreamTail};
    use docchat_llm::ModelResolver;
    use std::sync::Arc;
    use std::time::Duration;

    fn resolved(llm: &Arc<ScriptedLlm>) -> ResolvedModel {
        FixedResolver::new(llm.clone()).resolve("gpt-4o").unwrap()
    }

    async fn drain(answer: AnswerStream) -> Vec<AppResult<StreamEvent>> {
        answer.collect().await
    }

    #[tokio::test]
    async fn test_relays_deltas_then_done() {
        let llm = Arc::new(ScriptedLlm::new("", &["Hel", "lo"]));
        let answer = Generator::new(4, 0.7)
            .start(&resolved(&llm), "prompt".to_string(), vec!["Policy".to_string()])
            .await
            .unwrap();

        assert_eq!(answer.sources(), Some(&["Policy".to_string()][..]));
        let events: Vec<StreamEvent> = drain(answer).await.into_iter().map(|e| e.unwrap()).collect();

        assert_eq!(
            events,
            vec![
                StreamEvent::delta("Hel", Some(vec!["Policy".to_string()])),
                StreamEvent::delta("lo", Some(vec!["Policy".to_string()])),
                StreamEvent::Done,
            ]
        );

        let request = &llm.recorded()[0];
        assert!(request.stream);
        assert_eq!(request.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_exhausted_stream_completes() {
        let llm = Arc::new(ScriptedLlm::new("", &["a", "", "b"]).with_tail(StreamTail::Exhausted));
        let (mut rx, handle) = Generator::new(4, 0.7)
            .start(&resolved(&llm), "prompt".to_string(), Vec::new())
            .await
            .unwrap()
            .into_parts();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event.unwrap());
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::delta("a", None),
                StreamEvent::delta("b", None),
                StreamEvent::Done
            ]
        );
        assert_eq!(handle.await.unwrap(), GenerationState::Completed);
    }

    #[tokio::test]
    async fn test_mid_stream_error_has_no_done() {
        let llm = Arc::new(
            ScriptedLlm::new("", &["partial"]).with_tail(StreamTail::Error("reset".to_string())),
        );
        let (mut rx, handle) = Generator::new(4, 0.7)
            .start(&resolved(&llm), "prompt".to_string(), Vec::new())
            .await
            .unwrap()
            .into_parts();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().content(), "partial");
        assert!(matches!(events[1], Err(AppError::Stream(_))));
        assert_eq!(handle.await.unwrap(), GenerationState::Failed);
    }

    #[tokio::test]
    async fn test_open_failure_is_returned() {
        let llm = Arc::new(ScriptedLlm::new("", &[]).with_open_error("bad request"));
        let result = Generator::new(4, 0.7)
            .start(&resolved(&llm), "prompt".to_string(), Vec::new())
            .await;

        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_consumer_drop_cancels_upstream() {
        let chunks = ["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9"];
        let llm = Arc::new(ScriptedLlm::new("", &chunks).with_tail(StreamTail::Pending));
        let (mut rx, handle) = Generator::new(1, 0.7)
            .start(&resolved(&llm), "prompt".to_string(), Vec::new())
            .await
            .unwrap()
            .into_parts();

        assert_eq!(rx.recv().await.unwrap().unwrap().content(), "c0");
        assert_eq!(rx.recv().await.unwrap().unwrap().content(), "c1");
        drop(rx);

        let state = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("producer did not stop")
            .unwrap();

        assert_eq!(state, GenerationState::Cancelled);
        assert!(llm.was_dropped());
    }

    #[tokio::test]
    async fn test_idle_consumer_on_pending_upstream_cancels() {
        let llm = Arc::new(ScriptedLlm::new("", &[]).with_tail(StreamTail::Pending));
        let (rx, handle) = Generator::new(1, 0.7)
            .start(&resolved(&llm), "prompt".to_string(), Vec::new())
            .await
            .unwrap()
            .into_parts();

        drop(rx);
        let state = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("producer did not stop")
            .unwrap();
        assert_eq!(state, GenerationState::Cancelled);
        assert!(llm.was_dropped());
    }
}
