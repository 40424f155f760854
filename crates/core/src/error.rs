#[derive(Debug, thiserror::Error)]
pub enum CclError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("params can only be string, number, or CclCallParam (got {0})")]
    InvalidParamType(String),
    #[error("XMLCclRequest encountered a network error.")]
    Network,
    #[error("Request failed with status: {status} and status text: {status_text}")]
    RequestFailed { status: i32, status_text: String },
    /// Unexpected exception raised by the host bridge, message kept unchanged.
    #[error("{0}")]
    Host(String),
    #[error("failed to decode response payload: {0}")]
    PayloadDecode(serde_json::Error),
    #[error("XMLCclRequest was dropped before the request completed")]
    Abandoned,
}

pub type CclResult<T> = std::result::Result<T, CclError>;

/// Synchronous failure reported by the host bridge while creating, opening or sending a
/// request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The host bridge does not exist in this environment (not running inside PowerChart).
    #[error("host bridge unavailable: {0}")]
    Unavailable(String),
    /// Any other exception raised by the host.
    #[error("{0}")]
    Exception(String),
}

pub type HostResult<T> = std::result::Result<T, HostError>;
