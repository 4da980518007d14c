use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use parley_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletion, ChatCompletionChunk};

struct StreamState {
    sse: Sse,
    // Events decoded from a chunk but not yet handed out. One chunk may carry
    // both a content delta and a finish reason.
    pending_events: VecDeque<ModelResponseEvent>,
    done: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    /// A chat completion response, streamed or delivered whole.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        buffered_events: VecDeque<ModelResponseEvent>,
    }
}

impl OpenAIResponse {
    /// Creates a response that decodes completion chunks from `sse`.
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let stream_state = StreamState {
            sse,
            pending_events: Default::default(),
            done: false,
        };
        let next_event_fut = async move { next_event(stream_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
            buffered_events: Default::default(),
        }
    }

    /// Creates a response from a fully received completion.
    ///
    /// The whole text is delivered as one message delta.
    pub fn from_completion(completion: ChatCompletion) -> Result<Self, Error> {
        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(Error::new(
                "completion has no choices",
                ErrorKind::InvalidResponse,
            ));
        };

        let mut buffered_events = VecDeque::with_capacity(2);
        let content = choice.message.content.unwrap_or_default();
        if !content.is_empty() {
            buffered_events.push_back(ModelResponseEvent::MessageDelta(content));
        }
        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(ModelFinishReason::from_wire)
            .unwrap_or(ModelFinishReason::Stop);
        buffered_events.push_back(ModelResponseEvent::Completed(finish_reason));

        Ok(Self {
            next_event_fut: None,
            buffered_events,
        })
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        if let Some(event) = this.buffered_events.pop_front() {
            return Poll::Ready(Ok(Some(event)));
        }

        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, stream_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), stream_state)) => (event, stream_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(stream_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut stream_state: StreamState,
) -> Result<(Option<ModelResponseEvent>, StreamState), Error> {
    loop {
        if let Some(event) = stream_state.pending_events.pop_front() {
            return Ok((Some(event), stream_state));
        }
        if stream_state.done {
            return Ok((None, stream_state));
        }

        let sse_event = match stream_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                stream_state.done = true;
                continue;
            }
            Err(err) => {
                return Err(Error::new(
                    format!("failed to read event stream: {err:?}"),
                    ErrorKind::Network,
                ));
            }
        };
        trace!("got sse event: {sse_event}");
        if sse_event == "[DONE]" {
            stream_state.done = true;
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
            .map_err(|err| {
                Error::new(
                    format!("malformed completion chunk: {err}"),
                    ErrorKind::InvalidResponse,
                )
            })?;

        // Usage reports arrive as chunks without choices.
        let Some(choice) = chunk.choices.into_iter().next() else {
            continue;
        };

        // The order of events is important. Always emit the message delta
        // first, then the finish reason of the same chunk.
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            stream_state
                .pending_events
                .push_back(ModelResponseEvent::MessageDelta(content));
        }
        if let Some(finish_reason) = choice.finish_reason {
            stream_state.pending_events.push_back(
                ModelResponseEvent::Completed(ModelFinishReason::from_wire(
                    &finish_reason,
                )),
            );
        }
    }
}
