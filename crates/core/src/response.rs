//! The value a CCL call resolves to.

use crate::constants::TEAPOT_STATUS;
use crate::host::XmlCclRequest;
use crate::status::{XmlCclReadyState, XmlCclResult};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Everything returned from an `XMLCclRequest`, with descriptive labels.
///
/// Field names deliberately differ from the native properties:
///
/// | `CclRequestResponse` | `XMLCclRequest`                  |
/// |----------------------|----------------------------------|
/// | `code`               | `status`                         |
/// | `result`             | label of `status`                |
/// | `status`             | label of `readyState`            |
/// | `details`            | `statusText`                     |
/// | `data`               | parsed JSON of `responseText`    |
/// | `request`            | the native request itself        |
///
/// When `in_power_chart` is false the call never reached a host: `code` is 418, `result` is
/// "im a teapot", `status` is "uninitialized" and `data` is absent.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CclRequestResponse<T> {
    pub in_power_chart: bool,
    pub code: i32,
    pub result: XmlCclResult,
    pub status: XmlCclReadyState,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip)]
    pub request: Option<Arc<dyn XmlCclRequest>>,
}

impl<T> CclRequestResponse<T> {
    /// The value a call starts with before the host reports anything.
    pub fn provisional() -> Self {
        Self {
            in_power_chart: true,
            code: TEAPOT_STATUS,
            result: XmlCclResult::ImATeapot,
            status: XmlCclReadyState::Uninitialized,
            details: String::new(),
            data: None,
            request: None,
        }
    }

    /// The mock response returned outside PowerChart.
    pub fn not_in_power_chart() -> Self {
        Self {
            in_power_chart: false,
            ..Self::provisional()
        }
    }

    pub fn is_success(&self) -> bool {
        self.in_power_chart && self.result == XmlCclResult::Success
    }
}

impl<T: fmt::Debug> fmt::Debug for CclRequestResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CclRequestResponse")
            .field("in_power_chart", &self.in_power_chart)
            .field("code", &self.code)
            .field("result", &self.result)
            .field("status", &self.status)
            .field("details", &self.details)
            .field("data", &self.data)
            .field("request", &self.request.as_ref().map(|_| "XMLCclRequest"))
            .finish()
    }
}
