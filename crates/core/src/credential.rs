//! Credential resolution.

use std::env;
use std::fmt::{self, Debug, Formatter};

use crate::Error;

/// The environment variable consulted when no credential is given.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// A secret token for the completion endpoint.
///
/// The value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Resolves the credential once.
    ///
    /// An explicit, non-blank value wins. Otherwise `env_var` is read, if
    /// given. Blank values count as missing.
    pub fn resolve(
        explicit: Option<String>,
        env_var: Option<&str>,
    ) -> Result<Self, Error> {
        if let Some(key) = explicit.filter(|key| !key.trim().is_empty()) {
            return Ok(Self(key));
        }

        let from_env = env_var
            .and_then(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty());
        match from_env {
            Some(key) => {
                debug!(env_var, "using API key from the environment");
                Ok(Self(key))
            }
            None => Err(Error::MissingCredential {
                env_var: env_var.map(ToOwned::to_owned),
            }),
        }
    }

    /// Returns the secret value.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consumes the credential and returns the secret value.
    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests only read variables that are never set, so they don't race
    // with each other.
    const UNSET_VAR: &str = "PARLEY_TEST_CREDENTIAL_NEVER_SET";

    #[test]
    fn test_explicit_wins() {
        let credential =
            Credential::resolve(Some("sk-explicit".to_owned()), Some(UNSET_VAR))
                .unwrap();
        assert_eq!(credential.expose(), "sk-explicit");
    }

    #[test]
    fn test_missing_everywhere() {
        let err = Credential::resolve(None, Some(UNSET_VAR)).unwrap_err();
        match err {
            Error::MissingCredential { env_var } => {
                assert_eq!(env_var.as_deref(), Some(UNSET_VAR));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let err = Credential::resolve(Some("  ".to_owned()), None).unwrap_err();
        assert!(matches!(err, Error::MissingCredential { env_var: None }));
        assert_eq!(err.to_string(), "missing API key: provide one as a parameter");
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential =
            Credential::resolve(Some("sk-secret".to_owned()), None).unwrap();
        assert!(!format!("{credential:?}").contains("sk-secret"));
    }
}
