//! Scripted substitute for the PowerChart host bridge.
//!
//! [`MockHost`] hands out [`MockRequest`]s that follow a [`MockScript`]: on `send` they walk
//! the ready states 1 to 4 (or raise a network error) and fire the registered handlers, the
//! same order PowerChart uses. A deferred script leaves completion to the caller, which lets
//! tests observe a call while it is suspended.

use super::{lock, ErrorHandler, HostBridge, ReadyStateHandler, XmlCclRequest};
use crate::constants::READY_STATE_COMPLETED;
use crate::{HostError, HostResult};
use std::sync::{Arc, Mutex};

/// What a [`MockRequest`] does when it is created, opened and sent.
#[derive(Clone, Debug)]
pub struct MockScript {
    status: i32,
    status_text: String,
    response_text: String,
    network_error: bool,
    deferred: bool,
    create_error: Option<HostError>,
    open_error: Option<HostError>,
    send_error: Option<HostError>,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            status: 200,
            status_text: "OK".into(),
            response_text: String::new(),
            network_error: false,
            deferred: false,
            create_error: None,
            open_error: None,
            send_error: None,
        }
    }
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    pub fn status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn response_text(mut self, response_text: impl Into<String>) -> Self {
        self.response_text = response_text.into();
        self
    }

    /// Fire the error handler instead of completing.
    pub fn network_error(mut self) -> Self {
        self.network_error = true;
        self
    }

    /// Do nothing on `send`; completion is driven through [`MockRequest::complete`] or
    /// [`MockRequest::fail_network`].
    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn create_error(mut self, error: HostError) -> Self {
        self.create_error = Some(error);
        self
    }

    pub fn open_error(mut self, error: HostError) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn send_error(mut self, error: HostError) -> Self {
        self.send_error = Some(error);
        self
    }
}

/// Bridge that creates scripted requests and keeps them for inspection.
#[derive(Debug, Default)]
pub struct MockHost {
    script: MockScript,
    requests: Mutex<Vec<Arc<MockRequest>>>,
    attempts: Mutex<usize>,
}

impl MockHost {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
        }
    }

    /// Number of times a request was asked for, including failed attempts.
    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }

    pub fn last_request(&self) -> Option<Arc<MockRequest>> {
        lock(&self.requests).last().cloned()
    }
}

impl HostBridge for MockHost {
    fn xml_ccl_request(&self) -> HostResult<Arc<dyn XmlCclRequest>> {
        *lock(&self.attempts) += 1;
        if let Some(error) = &self.script.create_error {
            return Err(error.clone());
        }
        let request = Arc::new(MockRequest::new(self.script.clone()));
        lock(&self.requests).push(Arc::clone(&request));
        Ok(request)
    }
}

#[derive(Debug, Default)]
struct MockState {
    ready_state: i32,
    status: i32,
    status_text: String,
    response_text: String,
    opened: Option<(String, String)>,
    sent: Option<String>,
}

/// A scripted native request.
pub struct MockRequest {
    script: MockScript,
    state: Mutex<MockState>,
    on_ready_state_change: Mutex<Option<ReadyStateHandler>>,
    on_error: Mutex<Option<ErrorHandler>>,
}

impl MockRequest {
    fn new(script: MockScript) -> Self {
        Self {
            script,
            state: Mutex::new(MockState::default()),
            on_ready_state_change: Mutex::new(None),
            on_error: Mutex::new(None),
        }
    }

    /// Method and target passed to `open`.
    pub fn opened(&self) -> Option<(String, String)> {
        lock(&self.state).opened.clone()
    }

    /// Body passed to `send`.
    pub fn sent_body(&self) -> Option<String> {
        lock(&self.state).sent.clone()
    }

    /// Walk the ready states to completion using the scripted status and response.
    pub fn complete(&self) {
        for ready_state in 1..=READY_STATE_COMPLETED {
            {
                let mut state = lock(&self.state);
                state.ready_state = ready_state;
                if ready_state == READY_STATE_COMPLETED {
                    state.status = self.script.status;
                    state.status_text = self.script.status_text.clone();
                    state.response_text = self.script.response_text.clone();
                }
            }
            fire(&self.on_ready_state_change);
        }
    }

    pub fn fail_network(&self) {
        fire(&self.on_error);
    }

    /// Drop both handlers, as a host tearing down a request would.
    pub fn clear_handlers(&self) {
        lock(&self.on_ready_state_change).take();
        lock(&self.on_error).take();
    }
}

impl std::fmt::Debug for MockRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRequest")
            .field("script", &self.script)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}

// Handlers are taken out of their slot while running so they can call back into the request.
fn fire(slot: &Mutex<Option<Box<dyn FnMut() + Send>>>) {
    let handler = lock(slot).take();
    if let Some(mut handler) = handler {
        handler();
        let mut slot = lock(slot);
        if slot.is_none() {
            *slot = Some(handler);
        }
    }
}

impl XmlCclRequest for MockRequest {
    fn open(&self, method: &str, target: &str) -> HostResult<()> {
        if let Some(error) = &self.script.open_error {
            return Err(error.clone());
        }
        lock(&self.state).opened = Some((method.to_string(), target.to_string()));
        Ok(())
    }

    fn send(&self, body: &str) -> HostResult<()> {
        if let Some(error) = &self.script.send_error {
            return Err(error.clone());
        }
        lock(&self.state).sent = Some(body.to_string());
        if self.script.deferred {
            return Ok(());
        }
        if self.script.network_error {
            self.fail_network();
        } else {
            self.complete();
        }
        Ok(())
    }

    fn ready_state(&self) -> i32 {
        lock(&self.state).ready_state
    }

    fn status(&self) -> i32 {
        lock(&self.state).status
    }

    fn status_text(&self) -> String {
        lock(&self.state).status_text.clone()
    }

    fn response_text(&self) -> String {
        lock(&self.state).response_text.clone()
    }

    fn set_on_ready_state_change(&self, handler: ReadyStateHandler) {
        *lock(&self.on_ready_state_change) = Some(handler);
    }

    fn set_on_error(&self, handler: ErrorHandler) {
        *lock(&self.on_error) = Some(handler);
    }
}
