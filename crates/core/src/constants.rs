//! Constants used throughout the CCL core crate.
//!
//! This module contains the fixed values of the `XMLCclRequest` contract so that the
//! formatter, the orchestrator and the boundary adapters agree on them.

/// Sentinel first argument most CCL programs expect (output device "MINE").
pub const MINE_PARAM: &str = "MINE";

/// HTTP-like verb used for every CCL request. Only GET is supported by this adapter.
pub const REQUEST_METHOD: &str = "GET";

/// Native `readyState` value of a finished request.
pub const READY_STATE_COMPLETED: i32 = 4;

/// Inclusive lower bound of the successful status range.
pub const SUCCESS_STATUS_MIN: i32 = 200;

/// Exclusive upper bound of the successful status range.
pub const SUCCESS_STATUS_MAX: i32 = 300;

/// Status code reported when the call never reached PowerChart.
pub const TEAPOT_STATUS: i32 = 418;

/// Host objects whose absence means we are running outside PowerChart.
pub const HOST_BRIDGE_MARKERS: [&str; 4] = [
    "MPAGES_EVENT",
    "XMLCclRequest",
    "APPLINK",
    "DiscernObjectFactory",
];

/// Suffix a JavaScript-style host reports when one of the markers is missing.
pub const NOT_A_FUNCTION_SUFFIX: &str = " is not a function";
