//! Connection status
//!
//! The connection collaborator reports lifecycle events; this module turns
//! them into the banner status shown by the panel. Status is informational:
//! it never changes how commands are mediated.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Banner state presented to the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub show_banner: bool,
    pub message: String,
}

impl ConnectionStatus {
    /// Control channel up, nothing to show
    pub fn connected() -> Self {
        Self {
            connected: true,
            show_banner: false,
            message: String::new(),
        }
    }

    /// Disconnected with a banner message
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self {
            connected: false,
            show_banner: true,
            message: message.into(),
        }
    }
}

/// Lifecycle events raised by the connection collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Websocket to the processor opened
    WebSocketConnected,
    /// Control channel established; signals now flow
    ControlConnected,
    WebSocketError,
    AuthenticationFailed,
    NotAuthorized,
    WebSocketDisconnected,
    ControlDisconnected,
    /// No panel runtime is loaded in this environment
    RuntimeUnavailable,
    /// No processor host was given
    HostNotConfigured,
}

impl ConnectionEvent {
    /// Status this event leads to, or `None` if it leaves the status unchanged
    pub fn status(&self, host: &str) -> Option<ConnectionStatus> {
        let status = match self {
            ConnectionEvent::WebSocketConnected => return None,
            ConnectionEvent::ControlConnected => ConnectionStatus::connected(),
            ConnectionEvent::WebSocketError => ConnectionStatus::disconnected(format!(
                "WebSocket error while connecting to {}. Check processor availability and TLS settings.",
                host
            )),
            ConnectionEvent::AuthenticationFailed => ConnectionStatus::disconnected(format!(
                "Authentication failed for processor {}. Verify auth token/credentials.",
                host
            )),
            ConnectionEvent::NotAuthorized => ConnectionStatus::disconnected(format!(
                "Not authorized for processor {}. Confirm user access and room permissions.",
                host
            )),
            ConnectionEvent::WebSocketDisconnected => ConnectionStatus::disconnected(format!(
                "WebSocket disconnected from processor {}. Check processor/network status.",
                host
            )),
            ConnectionEvent::ControlDisconnected => ConnectionStatus::disconnected(format!(
                "Control channel disconnected from processor {}. Reconnect or verify control subsystem.",
                host
            )),
            ConnectionEvent::RuntimeUnavailable => ConnectionStatus::disconnected(
                "Panel runtime is unavailable. Load the panel in its runtime to connect to a processor.",
            ),
            ConnectionEvent::HostNotConfigured => ConnectionStatus::disconnected(
                "Processor host is not configured. Set a valid host/IP to connect.",
            ),
        };
        Some(status)
    }
}

/// Trim a configured host; `None` if nothing is left
pub fn normalize_host(host: &str) -> Option<String> {
    let host = host.trim();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    status: ConnectionStatus,
    host: String,
    /// Bumped on every connect attempt so stale watchdogs do nothing
    attempt: u64,
    control_up: bool,
}

/// Tracks connection status and the connect watchdog
#[derive(Debug)]
pub(crate) struct ConnectionMonitor {
    timeout: Duration,
    state: Mutex<MonitorState>,
}

impl ConnectionMonitor {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: Mutex::new(MonitorState::default()),
        }
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        self.state.lock().status.clone()
    }

    /// Start a connect attempt and arm the watchdog
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn begin(self: &Arc<Self>, host: &str) -> ConnectionStatus {
        let Some(host) = normalize_host(host) else {
            return self.handle(ConnectionEvent::HostNotConfigured);
        };

        let attempt = {
            let mut state = self.state.lock();
            state.attempt += 1;
            state.host = host.clone();
            state.control_up = false;
            state.status = ConnectionStatus::default();
            state.attempt
        };
        tracing::info!(host = %host, timeout_ms = self.timeout.as_millis() as u64, "Connecting to processor");

        let monitor = Arc::clone(self);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            monitor.expire(attempt);
        });

        ConnectionStatus::default()
    }

    fn expire(&self, attempt: u64) {
        let mut state = self.state.lock();
        if state.attempt != attempt || state.control_up {
            return;
        }
        state.status = ConnectionStatus::disconnected(format!(
            "Unable to connect to processor at {}. Verify host/IP and network access.",
            state.host
        ));
        tracing::warn!(host = %state.host, "Processor connection timed out");
    }

    /// Apply a lifecycle event and return the resulting status
    pub(crate) fn handle(&self, event: ConnectionEvent) -> ConnectionStatus {
        let mut state = self.state.lock();
        match event {
            ConnectionEvent::ControlConnected => state.control_up = true,
            ConnectionEvent::ControlDisconnected | ConnectionEvent::WebSocketDisconnected => {
                state.control_up = false
            }
            _ => {}
        }

        if let Some(status) = event.status(&state.host) {
            if status.show_banner {
                tracing::warn!(event = ?event, message = %status.message, "Connection status");
            } else {
                tracing::info!(event = ?event, "Connection status");
            }
            state.status = status;
        }
        state.status.clone()
    }
}
