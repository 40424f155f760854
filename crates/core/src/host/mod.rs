//! Boundary to the PowerChart host bridge.
//!
//! Inside PowerChart, `window.external.XMLCclRequest()` hands out an event-driven request
//! object. This module models that object as the [`XmlCclRequest`] trait and the factory as
//! [`HostBridge`], so the orchestrator can run against the real host, a detached environment
//! ([`DetachedHost`]) or a scripted substitute ([`mock::MockHost`]).
//!
//! Bridges report a missing host explicitly with [`HostError::Unavailable`]. Bridges that only
//! see an exception message (for example a script engine raising `TypeError`) can use
//! [`HostError::classify`] to turn it into the right variant.

pub mod mock;

use crate::constants::{HOST_BRIDGE_MARKERS, NOT_A_FUNCTION_SUFFIX};
use crate::{HostError, HostResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback invoked on every `readyState` transition.
pub type ReadyStateHandler = Box<dyn FnMut() + Send>;

/// Callback invoked when the native request hits a transport error.
pub type ErrorHandler = Box<dyn FnMut() + Send>;

/// The native `XMLCclRequest` contract.
///
/// Handlers are registered before `open`/`send`. The host fires the ready-state handler on
/// each transition and the error handler on transport failure; the completed transition
/// (ready state 4) and the error handler are mutually exclusive.
pub trait XmlCclRequest: Send + Sync {
    fn open(&self, method: &str, target: &str) -> HostResult<()>;
    fn send(&self, body: &str) -> HostResult<()>;
    fn ready_state(&self) -> i32;
    fn status(&self) -> i32;
    fn status_text(&self) -> String;
    fn response_text(&self) -> String;
    fn set_on_ready_state_change(&self, handler: ReadyStateHandler);
    fn set_on_error(&self, handler: ErrorHandler);

    /// Part of the native contract; never called by this crate.
    fn abort(&self) {}
}

/// Factory for native requests, one per call.
pub trait HostBridge {
    fn xml_ccl_request(&self) -> HostResult<Arc<dyn XmlCclRequest>>;
}

impl<B: HostBridge + ?Sized> HostBridge for &B {
    fn xml_ccl_request(&self) -> HostResult<Arc<dyn XmlCclRequest>> {
        (**self).xml_ccl_request()
    }
}

impl<B: HostBridge + ?Sized> HostBridge for Arc<B> {
    fn xml_ccl_request(&self) -> HostResult<Arc<dyn XmlCclRequest>> {
        (**self).xml_ccl_request()
    }
}

impl<B: HostBridge + ?Sized> HostBridge for Box<B> {
    fn xml_ccl_request(&self) -> HostResult<Arc<dyn XmlCclRequest>> {
        (**self).xml_ccl_request()
    }
}

/// Bridge for environments without PowerChart, such as local development.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedHost;

impl HostBridge for DetachedHost {
    fn xml_ccl_request(&self) -> HostResult<Arc<dyn XmlCclRequest>> {
        Err(HostError::Unavailable("XMLCclRequest is not a function".into()))
    }
}

impl HostError {
    /// Classify an exception message raised by the host.
    ///
    /// Messages reporting that one of the host bridge entry points is not a function
    /// (case-insensitive) mean the code is running outside PowerChart.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if indicates_not_in_power_chart(&message) {
            HostError::Unavailable(message)
        } else {
            HostError::Exception(message)
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, HostError::Unavailable(_))
    }
}

/// Returns true if `message` reports a missing host bridge entry point.
pub fn indicates_not_in_power_chart(message: &str) -> bool {
    let message = message.to_lowercase();
    HOST_BRIDGE_MARKERS.iter().any(|marker| {
        let needle = format!("{marker}{NOT_A_FUNCTION_SUFFIX}").to_lowercase();
        message.contains(&needle)
    })
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_detects_missing_bridge_in_any_case() {
        for message in [
            "XMLCclRequest is not a function",
            "xmlcclrequest IS NOT A FUNCTION",
            "TypeError: window.external.XMLCclRequest is not a function",
            "MPAGES_EVENT is not a function",
            "APPLINK is not a function",
            "DiscernObjectFactory is not a function",
        ] {
            assert!(
                HostError::classify(message).is_unavailable(),
                "expected unavailable for {message:?}"
            );
        }
    }

    #[test]
    fn test_classify_keeps_other_messages() {
        for message in [
            "test error",
            "XMLCclRequest failed",
            "foo is not a function",
            "XMLCclRequest is a function",
        ] {
            assert_eq!(
                HostError::classify(message),
                HostError::Exception(message.to_string())
            );
        }
    }

    #[test]
    fn test_detached_host_is_unavailable() {
        let err = DetachedHost.xml_ccl_request().err().expect("should be absent");
        assert!(err.is_unavailable());
    }
}
