//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into [`crate::CclClient`].
//! The library never reads environment variables itself; binaries read them and hand the raw
//! values to [`ClientConfig::from_env_values`].

use crate::logging::Verbosity;
use crate::{CclError, CclResult};

/// Client configuration resolved at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientConfig {
    verbosity: Verbosity,
    exclude_mine: bool,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    pub fn new(verbosity: Verbosity, exclude_mine: bool) -> Self {
        Self {
            verbosity,
            exclude_mine,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Default for whether calls omit the leading `'MINE'` argument.
    pub fn exclude_mine(&self) -> bool {
        self.exclude_mine
    }

    /// Build a configuration from optional raw string values.
    ///
    /// `None` or empty/whitespace values fall back to the defaults (verbosity `none`, `MINE`
    /// included).
    pub fn from_env_values(
        verbosity: Option<String>,
        exclude_mine: Option<String>,
    ) -> CclResult<Self> {
        let verbosity = non_blank(verbosity)
            .map(|v| v.parse::<Verbosity>())
            .transpose()?
            .unwrap_or_default();
        let exclude_mine = non_blank(exclude_mine)
            .map(|v| parse_flag(&v))
            .transpose()?
            .unwrap_or(false);

        Ok(Self::new(verbosity, exclude_mine))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> CclResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(CclError::InvalidInput(format!(
            "expected a boolean flag, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_values_missing() {
        let config = ClientConfig::from_env_values(None, None).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.verbosity(), Verbosity::None);
        assert!(!config.exclude_mine());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config =
            ClientConfig::from_env_values(Some("  ".into()), Some(String::new())).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_parses_values() {
        let config =
            ClientConfig::from_env_values(Some("info".into()), Some("TRUE".into())).unwrap();
        assert_eq!(config.verbosity(), Verbosity::Info);
        assert!(config.exclude_mine());
    }

    #[test]
    fn test_rejects_bad_flag() {
        let err = ClientConfig::from_env_values(None, Some("maybe".into()))
            .expect_err("should reject");
        assert!(matches!(err, CclError::InvalidInput(msg) if msg.contains("maybe")));
    }
}
