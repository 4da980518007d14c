use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use parley_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoProviderError(ErrorKind);

impl Display for EchoProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoProviderError {}

impl ModelProviderError for EchoProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Repeats the last user message back, one word per event when streaming.
#[derive(Debug)]
struct EchoResponse {
    pending: VecDeque<String>,
    completed: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn new(input: &str, stream: bool) -> Self {
        let reply = format!("You said {input}");
        let pending = if stream {
            let words: Vec<_> = reply.split(' ').collect();
            let last = words.len() - 1;
            words
                .into_iter()
                .enumerate()
                .map(|(idx, word)| {
                    if idx == last {
                        word.to_owned()
                    } else {
                        format!("{word} ")
                    }
                })
                .collect()
        } else {
            VecDeque::from([reply])
        };
        Self {
            pending,
            completed: false,
            sleep: None,
        }
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(delay.as_mut().poll(cx));
        this.sleep = None;

        if let Some(item) = this.pending.pop_front() {
            return Poll::Ready(Ok(Some(ModelResponseEvent::MessageDelta(
                item,
            ))));
        }
        if !this.completed {
            this.completed = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            ))));
        }
        Poll::Ready(Ok(None))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoProviderError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user_input = req.messages.iter().rev().find_map(|msg| {
            match msg {
                ModelMessage::User(text) => Some(text.as_str()),
                _ => None,
            }
        });
        let result = match last_user_input {
            Some(input) => Ok(EchoResponse::new(input, req.stream)),
            None => Err(EchoProviderError(ErrorKind::Other)),
        };
        ready(result)
    }
}

async fn collect(mut resp: EchoResponse) -> (Vec<String>, bool) {
    let mut deltas = Vec::new();
    let mut completed = false;
    loop {
        let event =
            std::future::poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
                .await;
        match event {
            Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                deltas.push(delta);
            }
            Ok(Some(ModelResponseEvent::Completed(reason))) => {
                assert_eq!(reason, ModelFinishReason::Stop);
                completed = true;
            }
            Ok(None) => break,
            Err(err) => unreachable!("unexpected error: {err:?}"),
        }
    }
    (deltas, completed)
}

#[tokio::test]
async fn test_streaming_completion() {
    let req = ModelRequest {
        messages: vec![
            ModelMessage::System("Be brief.".to_owned()),
            ModelMessage::User("Good morning".to_owned()),
        ],
        stream: true,
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();
    let (deltas, completed) = collect(resp).await;

    assert!(completed);
    assert_eq!(deltas, ["You ", "said ", "Good ", "morning"]);
    assert_eq!(deltas.concat(), "You said Good morning");
}

#[tokio::test]
async fn test_non_streaming_completion() {
    let req = ModelRequest {
        messages: vec![ModelMessage::User("Good morning".to_owned())],
        stream: false,
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();
    let (deltas, completed) = collect(resp).await;

    assert!(completed);
    assert_eq!(deltas, ["You said Good morning"]);
}

#[tokio::test]
async fn test_error() {
    let req = ModelRequest {
        messages: vec![ModelMessage::System("Be brief.".to_owned())],
        stream: true,
    };
    let err = EchoProvider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn test_message_content() {
    let msg = ModelMessage::Assistant("こんにちは".to_owned());
    assert_eq!(msg.content(), "こんにちは");
}

#[test]
fn test_finish_reason_from_wire() {
    assert_eq!(ModelFinishReason::from_wire("stop"), ModelFinishReason::Stop);
    assert_eq!(
        ModelFinishReason::from_wire("length"),
        ModelFinishReason::Length
    );
    assert_eq!(
        ModelFinishReason::from_wire("tool_calls"),
        ModelFinishReason::Other
    );
}

#[test]
fn test_error_kind_display() {
    assert_eq!(ErrorKind::RateLimitExceeded.to_string(), "rate limit exceeded");
    assert_eq!(ErrorKind::Network.to_string(), "network failure");
}
