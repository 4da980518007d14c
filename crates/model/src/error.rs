use std::fmt::{self, Display, Formatter};

/// What went wrong while talking to a model provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential was rejected.
    Unauthorized,
    /// Too many requests, or the quota is used up.
    RateLimitExceeded,
    /// The content is moderated.
    Moderated,
    /// The provider sent something we cannot understand.
    InvalidResponse,
    /// The connection failed or was interrupted.
    Network,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::Moderated => "moderated",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::Network => "network failure",
            ErrorKind::Other => "other",
        })
    }
}
