//! Text labels for the numeric `readyState` and `status` values of an `XMLCclRequest`.

use serde::Serialize;
use std::fmt;

/// Lifecycle position of a native request.
///
/// Native values 0 to 4 map to `Uninitialized` through `Completed`; anything else is
/// `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XmlCclReadyState {
    Uninitialized,
    Loading,
    Loaded,
    Interactive,
    Completed,
    Unknown,
}

impl XmlCclReadyState {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Uninitialized,
            1 => Self::Loading,
            2 => Self::Loaded,
            3 => Self::Interactive,
            4 => Self::Completed,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Interactive => "interactive",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for XmlCclReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive result for a native status code.
///
/// 418 ("im a teapot") is not a Discern status: it marks a response that never reached
/// PowerChart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum XmlCclResult {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "method not allowed")]
    MethodNotAllowed,
    #[serde(rename = "invalid state")]
    InvalidState,
    #[serde(rename = "im a teapot")]
    ImATeapot,
    #[serde(rename = "non-fatal error")]
    NonFatalError,
    #[serde(rename = "memory error")]
    MemoryError,
    #[serde(rename = "internal server exception")]
    InternalServerException,
    #[serde(rename = "unknown")]
    Unknown,
}

impl XmlCclResult {
    pub fn from_status(status: i32) -> Self {
        match status {
            200 => Self::Success,
            405 => Self::MethodNotAllowed,
            409 => Self::InvalidState,
            418 => Self::ImATeapot,
            492 => Self::NonFatalError,
            493 => Self::MemoryError,
            500 => Self::InternalServerException,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::MethodNotAllowed => "method not allowed",
            Self::InvalidState => "invalid state",
            Self::ImATeapot => "im a teapot",
            Self::NonFatalError => "non-fatal error",
            Self::MemoryError => "memory error",
            Self::InternalServerException => "internal server exception",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for XmlCclResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
