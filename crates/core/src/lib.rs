//! # CCL Core
//!
//! Client-side adapter for invoking CCL (Cerner Command Language) programs through the
//! `XMLCclRequest` host object that PowerChart exposes to MPages.
//!
//! This crate contains:
//! - Parameter serialisation into the literal argument string `XMLCclRequest::send` expects
//! - Labels for native `readyState` and `status` values
//! - The host bridge boundary, with detached and scripted implementations
//! - [`CclClient`], which turns the event-driven native request into one `async` call
//!
//! Outside PowerChart the host bridge is absent; calls then resolve with
//! `in_power_chart == false` instead of failing, so the same code runs in local development.
//!
//! **No transport concerns**: retries, timeouts and cancellation belong to the caller.

pub mod config;
pub mod constants;
pub mod host;
pub mod logging;
pub mod params;
pub mod request;
pub mod response;
pub mod status;

mod error;

pub use config::ClientConfig;
pub use error::{CclError, CclResult, HostError, HostResult};
pub use host::{DetachedHost, HostBridge, XmlCclRequest};
pub use logging::{LogLevel, LogSink, Logger, TracingSink, Verbosity};
pub use params::{format_params, format_values, CclParam, ParamKind, ParamValue};
pub use request::CclClient;
pub use response::CclRequestResponse;
pub use status::{XmlCclReadyState, XmlCclResult};

pub use ccl_types::ProgramName;
