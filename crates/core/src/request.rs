//! Request orchestration: one `async` call per CCL program invocation.
//!
//! A call validates its input, asks the [`HostBridge`] for a native request, wires the
//! ready-state and error handlers to a single-resolution channel, then opens and sends the
//! request. The future completes when the host reports ready state 4 (or a transport error).
//!
//! Outcomes:
//! - ready state 4 with a status in `[200, 300)` resolves with the populated response
//! - ready state 4 with any other status fails with [`CclError::RequestFailed`]
//! - the error handler fails with [`CclError::Network`]
//! - [`HostError::Unavailable`] resolves with `in_power_chart == false`
//! - [`HostError::Exception`] fails with [`CclError::Host`], message unchanged
//!
//! The first outcome wins; anything the host reports afterwards is ignored.

use crate::config::ClientConfig;
use crate::constants::{
    READY_STATE_COMPLETED, REQUEST_METHOD, SUCCESS_STATUS_MAX, SUCCESS_STATUS_MIN,
};
use crate::host::{lock, HostBridge, XmlCclRequest};
use crate::logging::{LogLevel, Logger};
use crate::params::{format_params, parse_values, CclParam};
use crate::response::CclRequestResponse;
use crate::status::{XmlCclReadyState, XmlCclResult};
use crate::{CclError, CclResult, HostError, HostResult};
use ccl_types::ProgramName;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::oneshot;

type Outcome<T> = CclResult<CclRequestResponse<T>>;

/// The provisional response and the channel it resolves through.
///
/// Owned by the call; handlers reach it through an `Arc` and settle it at most once.
struct Pending<T> {
    response: Option<CclRequestResponse<T>>,
    tx: Option<oneshot::Sender<Outcome<T>>>,
}

impl<T> Pending<T> {
    fn new(tx: oneshot::Sender<Outcome<T>>) -> Self {
        Self {
            response: Some(CclRequestResponse::provisional()),
            tx: Some(tx),
        }
    }

    /// Apply `finish` to the provisional response and deliver the result.
    ///
    /// Returns false if the call was already settled.
    fn settle(&mut self, finish: impl FnOnce(CclRequestResponse<T>) -> Outcome<T>) -> bool {
        let (Some(tx), Some(response)) = (self.tx.take(), self.response.take()) else {
            return false;
        };
        // The receiver only goes away when the caller dropped the future.
        let _ = tx.send(finish(response));
        true
    }
}

type SharedPending<T> = Arc<Mutex<Pending<T>>>;

/// Client for invoking CCL programs through a host bridge.
///
/// # Example
///
/// ```no_run
/// use ccl_core::{CclClient, ClientConfig, DetachedHost};
///
/// # async fn run() -> ccl_core::CclResult<()> {
/// let client = CclClient::new(DetachedHost, ClientConfig::default());
/// let res = client
///     .request::<serde_json::Value>("1_MP_GET_PATIENT", &["12345".into()], None)
///     .await?;
/// assert!(!res.in_power_chart);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CclClient<B> {
    bridge: B,
    config: ClientConfig,
    logger: Logger,
}

impl<B: HostBridge> CclClient<B> {
    /// Creates a client logging through `tracing` at the configured verbosity.
    pub fn new(bridge: B, config: ClientConfig) -> Self {
        Self {
            bridge,
            logger: Logger::new(config.verbosity()),
            config,
        }
    }

    /// Replace the logger, for example to inject a custom sink.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Invoke `program` with `params`.
    ///
    /// `exclude_mine` overrides the configured default for whether the leading `'MINE'`
    /// argument is sent. The response text is parsed as JSON into `T`; text that is not JSON
    /// leaves `data` empty.
    ///
    /// # Errors
    ///
    /// - [`CclError::InvalidInput`] if `program` is empty or whitespace (the bridge is never
    ///   touched)
    /// - [`CclError::RequestFailed`] if the request completes outside `[200, 300)`
    /// - [`CclError::Network`] if the host reports a transport error
    /// - [`CclError::Host`] if the host raises an unexpected exception
    /// - [`CclError::PayloadDecode`] if the response is JSON that does not fit `T`
    /// - [`CclError::Abandoned`] if the host drops the request without completing it
    pub async fn request<T>(
        &self,
        program: &str,
        params: &[CclParam],
        exclude_mine: Option<bool>,
    ) -> CclResult<CclRequestResponse<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let program = self.program_name(program, params.len())?;
        let body = self.formatted_params(&program, params, exclude_mine);
        self.dispatch(program, body).await
    }

    /// Like [`CclClient::request`], with untyped JSON parameters.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`CclClient::request`], returns
    /// [`CclError::InvalidParamType`] for a parameter that is not a string, a number or an
    /// explicit `{"type", "param"}` object. Validation happens before the bridge is touched.
    pub async fn request_values<T>(
        &self,
        program: &str,
        values: &[Value],
        exclude_mine: Option<bool>,
    ) -> CclResult<CclRequestResponse<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let program = self.program_name(program, values.len())?;
        let params = parse_values(values).inspect_err(|e| {
            self.logger.log(LogLevel::Error, program.as_str(), || e.to_string());
        })?;
        let body = self.formatted_params(&program, &params, exclude_mine);
        self.dispatch(program, body).await
    }

    fn program_name(&self, program: &str, param_count: usize) -> CclResult<ProgramName> {
        self.logger.log(LogLevel::Debug, program, || {
            format!("CCL request called with prg: {program} ({param_count} params)")
        });
        ProgramName::new(program).map_err(|_| {
            let error = CclError::InvalidInput("The CCL program name cannot be empty.".into());
            self.logger.log(LogLevel::Error, program, || error.to_string());
            error
        })
    }

    fn formatted_params(
        &self,
        program: &ProgramName,
        params: &[CclParam],
        exclude_mine: Option<bool>,
    ) -> String {
        let exclude_mine = exclude_mine.unwrap_or(self.config.exclude_mine());
        let body = format_params(params, exclude_mine);
        self.logger.log(LogLevel::Debug, program.as_str(), || {
            format!("Formatted CCL params: {body}")
        });
        body
    }

    async fn dispatch<T>(&self, program: ProgramName, body: String) -> Outcome<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let pending: SharedPending<T> = Arc::new(Mutex::new(Pending::new(tx)));

        self.logger.log(LogLevel::Info, program.as_str(), || {
            format!("Making CCL request for program: {program}")
        });

        // Held until the call resolves; handlers only keep a weak reference.
        let request = match self.start(&program, &body, &pending) {
            Ok(request) => Some(request),
            Err(HostError::Unavailable(reason)) => {
                self.logger.log(LogLevel::Warning, program.as_str(), || {
                    format!(
                        "Not in PowerChart environment ({reason}). Returning mock response for '{program}'."
                    )
                });
                lock(&pending).settle(|mut res| {
                    res.in_power_chart = false;
                    Ok(res)
                });
                None
            }
            Err(HostError::Exception(message)) => {
                self.logger.log(LogLevel::Error, program.as_str(), || {
                    format!(
                        "An unexpected error occurred during CCL request for '{program}': {message}"
                    )
                });
                lock(&pending).settle(|_| Err(CclError::Host(message)));
                None
            }
        };
        drop(pending);

        let outcome = rx.await.unwrap_or(Err(CclError::Abandoned));
        drop(request);
        outcome
    }

    fn start<T>(
        &self,
        program: &ProgramName,
        body: &str,
        pending: &SharedPending<T>,
    ) -> HostResult<Arc<dyn XmlCclRequest>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = self.bridge.xml_ccl_request()?;

        let weak = Arc::downgrade(&request);
        let shared = Arc::clone(pending);
        let logger = self.logger.clone();
        let name = program.clone();
        request.set_on_ready_state_change(Box::new(move || {
            on_ready_state_change(&weak, &shared, &logger, &name);
        }));

        let shared = Arc::clone(pending);
        let logger = self.logger.clone();
        let name = program.clone();
        request.set_on_error(Box::new(move || {
            logger.log(LogLevel::Error, name.as_str(), || {
                format!("CCL request for program '{name}' encountered a network error.")
            });
            if !lock(&shared).settle(|_| Err(CclError::Network)) {
                logger.log(LogLevel::Debug, name.as_str(), || {
                    "Ignoring network error for an already settled request.".into()
                });
            }
        }));

        request.open(REQUEST_METHOD, program.as_str())?;
        request.send(body)?;
        Ok(request)
    }
}

fn on_ready_state_change<T>(
    request: &Weak<dyn XmlCclRequest>,
    pending: &Mutex<Pending<T>>,
    logger: &Logger,
    program: &ProgramName,
) where
    T: DeserializeOwned,
{
    let Some(request) = request.upgrade() else {
        return;
    };
    let ready_state = request.ready_state();
    let status = request.status();
    logger.log(LogLevel::Debug, program.as_str(), || {
        format!("CCL request readyState changed to: {ready_state} (status {status})")
    });
    if ready_state != READY_STATE_COMPLETED {
        return;
    }

    logger.log(LogLevel::Info, program.as_str(), || {
        format!("CCL request for program '{program}' completed.")
    });

    let status_text = request.status_text();
    let settled = if (SUCCESS_STATUS_MIN..SUCCESS_STATUS_MAX).contains(&status) {
        logger.log(LogLevel::Info, program.as_str(), || {
            format!("CCL request for program '{program}' was successful ({status} {status_text}).")
        });
        lock(pending).settle(|mut res| {
            res.in_power_chart = true;
            res.code = status;
            res.result = XmlCclResult::from_status(status);
            res.status = XmlCclReadyState::from_code(ready_state);
            res.details = status_text.clone();
            res.data = parse_response_text(&request.response_text(), logger, program)?;
            res.request = Some(Arc::clone(&request));
            Ok(res)
        })
    } else {
        logger.log(LogLevel::Error, program.as_str(), || {
            format!("CCL request for program '{program}' failed ({status} {status_text}).")
        });
        lock(pending).settle(|_| {
            Err(CclError::RequestFailed {
                status,
                status_text: status_text.clone(),
            })
        })
    };

    if !settled {
        logger.log(LogLevel::Debug, program.as_str(), || {
            "Ignoring completion of an already settled request.".into()
        });
    }
}

/// Parse the response text as JSON.
///
/// Text that is not JSON at all yields `None`; JSON that does not fit `T` is an error.
fn parse_response_text<T>(
    response_text: &str,
    logger: &Logger,
    program: &ProgramName,
) -> CclResult<Option<T>>
where
    T: DeserializeOwned,
{
    match serde_json::from_str::<T>(response_text) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.is_syntax() || e.is_eof() => {
            logger.log(LogLevel::Warning, program.as_str(), || {
                format!("Failed to parse response text as JSON: {e}")
            });
            Ok(None)
        }
        Err(e) => {
            logger.log(LogLevel::Error, program.as_str(), || {
                format!("An unexpected error occurred during response text parsing: {e}")
            });
            Err(CclError::PayloadDecode(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::{MockHost, MockScript};
    use crate::logging::{RecordingSink, Verbosity};
    use serde_json::json;

    fn mock_client(script: MockScript) -> CclClient<MockHost> {
        CclClient::new(MockHost::new(script), ClientConfig::default())
    }

    #[tokio::test]
    async fn test_empty_program_name_rejected_before_host() {
        let client = mock_client(MockScript::new());
        for name in ["", "   ", "\t"] {
            let err = client
                .request::<Value>(name, &[], None)
                .await
                .expect_err("should reject empty name");
            assert!(
                matches!(&err, CclError::InvalidInput(msg) if msg == "The CCL program name cannot be empty.")
            );
        }
        assert_eq!(client.bridge().attempts(), 0);
    }

    #[tokio::test]
    async fn test_invalid_param_rejected_before_send() {
        let client = mock_client(MockScript::new());
        let err = client
            .request_values::<Value>("TEST", &[json!("ok"), json!(true)], None)
            .await
            .expect_err("should reject boolean param");
        assert!(matches!(err, CclError::InvalidParamType(_)));
        assert_eq!(client.bridge().attempts(), 0);
    }

    #[tokio::test]
    async fn test_detached_host_resolves_not_in_power_chart() {
        let client = CclClient::new(crate::DetachedHost, ClientConfig::default());
        let res = client
            .request::<Value>("TEST", &[CclParam::string("param1")], None)
            .await
            .expect("should resolve");
        assert!(!res.in_power_chart);
        assert_eq!(res.code, 418);
        assert_eq!(res.result, XmlCclResult::ImATeapot);
        assert_eq!(res.status, XmlCclReadyState::Uninitialized);
        assert!(res.data.is_none());
    }

    #[tokio::test]
    async fn test_missing_bridge_message_in_any_case_resolves() {
        for message in ["XMLCclRequest is not a function", "XMLCCLREQUEST IS NOT A FUNCTION"] {
            let script = MockScript::new().send_error(HostError::classify(message));
            let client = mock_client(script);
            let res = client
                .request::<Value>("TEST", &[], None)
                .await
                .expect("should resolve outside PowerChart");
            assert!(!res.in_power_chart);
            assert_eq!(res.code, 418);
            assert_eq!(res.status, XmlCclReadyState::Uninitialized);
        }
    }

    #[tokio::test]
    async fn test_unexpected_host_error_propagates() {
        let script = MockScript::new().send_error(HostError::classify("test error"));
        let client = mock_client(script);
        let err = client
            .request::<Value>("TEST", &[], None)
            .await
            .expect_err("should propagate");
        assert!(matches!(&err, CclError::Host(msg) if msg == "test error"));
        assert_eq!(err.to_string(), "test error");
    }

    #[tokio::test]
    async fn test_open_error_propagates() {
        let script = MockScript::new().open_error(HostError::Exception("denied".into()));
        let client = mock_client(script);
        let err = client
            .request::<Value>("TEST", &[], None)
            .await
            .expect_err("should propagate");
        assert!(matches!(err, CclError::Host(msg) if msg == "denied"));
        let request = client.bridge().last_request().unwrap();
        assert!(request.sent_body().is_none());
    }

    #[tokio::test]
    async fn test_success_populates_response() {
        let client = mock_client(
            MockScript::new()
                .status(200)
                .status_text("OK")
                .response_text(r#"{"patients":[{"id":1}]}"#),
        );
        let res = client
            .request::<Value>("1_MP_GET_PATIENTS", &["test".into(), 1.into()], None)
            .await
            .expect("should resolve");

        assert!(res.in_power_chart);
        assert_eq!(res.code, 200);
        assert_eq!(res.result, XmlCclResult::Success);
        assert_eq!(res.status, XmlCclReadyState::Completed);
        assert_eq!(res.details, "OK");
        assert_eq!(res.data, Some(json!({ "patients": [{ "id": 1 }] })));
        assert!(res.request.is_some());
        assert!(res.is_success());

        let request = client.bridge().last_request().unwrap();
        assert_eq!(
            request.opened(),
            Some(("GET".into(), "1_MP_GET_PATIENTS".into()))
        );
        assert_eq!(request.sent_body().as_deref(), Some("'MINE','test',1"));
    }

    #[tokio::test]
    async fn test_typed_payload() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Patient {
            name: String,
        }

        let client = mock_client(MockScript::new().response_text(r#"{"name":"Jane"}"#));
        let res = client
            .request::<Patient>("TEST", &[], None)
            .await
            .expect("should resolve");
        assert_eq!(
            res.data,
            Some(Patient {
                name: "Jane".into()
            })
        );
    }

    #[tokio::test]
    async fn test_success_range_is_half_open() {
        let client = mock_client(MockScript::new().status(204).response_text("null"));
        let res = client.request::<Value>("TEST", &[], None).await.unwrap();
        assert_eq!(res.code, 204);
        assert_eq!(res.result, XmlCclResult::Unknown);

        let client = mock_client(MockScript::new().status(300));
        let err = client.request::<Value>("TEST", &[], None).await.unwrap_err();
        assert!(matches!(err, CclError::RequestFailed { status: 300, .. }));
    }

    #[tokio::test]
    async fn test_server_failure_rejects_with_status() {
        let client = mock_client(
            MockScript::new()
                .status(500)
                .status_text("Internal Server Error"),
        );
        let err = client
            .request::<Value>("TEST", &[], None)
            .await
            .expect_err("should reject");
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_non_json_response_leaves_data_empty() {
        for text in ["<html>not json</html>", "", "{\"unterminated\": "] {
            let client = mock_client(MockScript::new().response_text(text));
            let res = client
                .request::<Value>("TEST", &[], None)
                .await
                .expect("should resolve");
            assert!(res.in_power_chart);
            assert_eq!(res.code, 200);
            assert!(res.data.is_none(), "expected no data for {text:?}");
        }
    }

    #[tokio::test]
    async fn test_json_of_wrong_shape_rejects() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Patient {
            name: String,
        }

        let client = mock_client(MockScript::new().response_text(r#"{"name": 42}"#));
        let err = client
            .request::<Patient>("TEST", &[], None)
            .await
            .expect_err("should reject");
        assert!(matches!(err, CclError::PayloadDecode(_)));
    }

    #[tokio::test]
    async fn test_network_error_rejects() {
        let client = mock_client(MockScript::new().network_error());
        let err = client
            .request::<Value>("TEST", &[], None)
            .await
            .expect_err("should reject");
        assert!(matches!(err, CclError::Network));
        assert_eq!(err.to_string(), "XMLCclRequest encountered a network error.");
    }

    #[tokio::test]
    async fn test_exclude_mine_argument_and_default() {
        let client = mock_client(MockScript::new());
        client
            .request::<Value>("TEST", &[CclParam::number(7)], Some(true))
            .await
            .unwrap();
        let body = client.bridge().last_request().unwrap().sent_body();
        assert_eq!(body.as_deref(), Some("7"));

        let client = CclClient::new(
            MockHost::new(MockScript::new()),
            ClientConfig::new(Verbosity::None, true),
        );
        client.request::<Value>("TEST", &[], None).await.unwrap();
        let body = client.bridge().last_request().unwrap().sent_body();
        assert_eq!(body.as_deref(), Some(""));

        client.request::<Value>("TEST", &[], Some(false)).await.unwrap();
        let body = client.bridge().last_request().unwrap().sent_body();
        assert_eq!(body.as_deref(), Some("'MINE'"));
    }

    #[tokio::test]
    async fn test_resolves_only_once() {
        let client = mock_client(MockScript::new().deferred().response_text("[1]"));
        let (res, ()) = tokio::join!(client.request::<Value>("TEST", &[], None), async {
            let request = loop {
                match client.bridge().last_request() {
                    Some(request) if request.sent_body().is_some() => break request,
                    _ => tokio::task::yield_now().await,
                }
            };
            request.complete();
            request.fail_network();
            request.complete();
        });
        let res = res.expect("first outcome wins");
        assert_eq!(res.data, Some(json!([1])));
    }

    #[tokio::test]
    async fn test_dropped_handlers_abandon_request() {
        let client = mock_client(MockScript::new().deferred());
        let (res, ()) = tokio::join!(client.request::<Value>("TEST", &[], None), async {
            let request = loop {
                match client.bridge().last_request() {
                    Some(request) if request.sent_body().is_some() => break request,
                    _ => tokio::task::yield_now().await,
                }
            };
            request.clear_handlers();
        });
        assert!(matches!(res, Err(CclError::Abandoned)));
    }

    #[tokio::test]
    async fn test_logging_does_not_change_result() {
        let sink = Arc::new(RecordingSink::default());
        let client = mock_client(MockScript::new().response_text("not json"))
            .with_logger(Logger::with_sink(Verbosity::Debug, sink.clone()));
        let res = client.request::<Value>("TEST", &[], None).await.unwrap();
        assert!(res.data.is_none());

        let entries = sink.entries.lock().unwrap();
        assert!(entries
            .iter()
            .any(|(level, msg)| *level == LogLevel::Info && msg.contains("completed")));
        assert!(entries
            .iter()
            .any(|(level, msg)| *level == LogLevel::Warning && msg.contains("JSON")));
        assert!(entries
            .iter()
            .any(|(level, msg)| *level == LogLevel::Debug && msg.contains("readyState")));
    }
}
