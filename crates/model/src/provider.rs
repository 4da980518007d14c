use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns what kind of failure this is.
    fn kind(&self) -> ErrorKind;
}

/// A completion backend that turns a transcript into a reply.
///
/// Providers are stateless from the caller's point of view: every request
/// carries the whole conversation, and nothing is remembered between
/// requests. A provider may be dropped at any time, even with responses
/// still in flight.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Sends a completion request.
    ///
    /// The returned future resolves once the reply starts, and the reply
    /// itself is read from the response events.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
