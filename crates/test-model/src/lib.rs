//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use parley_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

const PRESET_FAILURE: Error = Error {
    message: "preset failure",
    kind: ErrorKind::Network,
};

pub struct TestModelResponse {
    events: VecDeque<ModelResponseEvent>,
    fail_after: Option<usize>,
    delivered: usize,
    exhausted: bool,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.exhausted {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let delay = this.delay;
        let pending_sleep =
            this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(pending_sleep.as_mut().poll(cx));
        this.sleep = None;

        if this.fail_after == Some(this.delivered) {
            this.exhausted = true;
            return Poll::Ready(Err(PRESET_FAILURE));
        }
        let Some(event) = this.events.pop_front() else {
            this.exhausted = true;
            return Poll::Ready(Ok(None));
        };
        this.delivered += 1;
        Poll::Ready(Ok(Some(event)))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to queue the preset responses. Each
/// request consumes the next one in order, and if there are no presets
/// left an error is returned. Every request is recorded and can be
/// inspected with [`requests`](Self::requests).
///
/// Streaming requests receive the preset events one by one. Non-streaming
/// requests receive the concatenated text as a single message delta.
///
/// Clones share the same script.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Queues a preset response.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock_script().responses.push_back(preset);
    }

    /// Sets the delay before each event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock_script().requests.clone()
    }

    /// Returns the number of queued presets not yet consumed.
    pub fn remaining_responses(&self) -> usize {
        self.lock_script().responses.len()
    }

    fn lock_script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn make_response(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        let mut script = self.lock_script();
        script.requests.push(req.clone());

        let Some(preset) = script.responses.pop_front() else {
            return Err(Error {
                message: "no enough presets",
                kind: ErrorKind::RateLimitExceeded,
            });
        };
        if preset.fail_after == Some(0) {
            return Err(PRESET_FAILURE);
        }

        let (mut events, fail_after) = if req.stream {
            let events = preset
                .events
                .iter()
                .map(|event| match event {
                    PresetEvent::MessageDelta(delta) => {
                        ModelResponseEvent::MessageDelta(delta.clone())
                    }
                })
                .collect::<VecDeque<_>>();
            (events, preset.fail_after)
        } else {
            // A non-streaming reply is all or nothing.
            let text = preset.text();
            let events = if text.is_empty() {
                VecDeque::new()
            } else {
                VecDeque::from([ModelResponseEvent::MessageDelta(text)])
            };
            (events, preset.fail_after.map(|_| 0))
        };
        events.push_back(ModelResponseEvent::Completed(ModelFinishReason::Stop));

        Ok(TestModelResponse {
            events,
            fail_after,
            delivered: 0,
            exhausted: false,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.make_response(req))
    }
}
