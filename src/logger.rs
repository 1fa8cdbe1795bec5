//! Warning, error and status reporting for accessor instances.
//!
//! The host decides where node diagnostics end up. [`LogSink`] forwards
//! them to the `log` facade; [`RecordingSink`] keeps them in memory.

use std::sync::Mutex;

use crate::accessor::status::NodeStatus;

/// Prefix of every log line emitted by [`LogSink`].
pub const LOGGER_NAME: &str = "Persistent Values";

/// Receiver of node-level diagnostics. Fire-and-forget.
pub trait NodeSink: Send + Sync {
    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Show a status summary for the node. Ignored by default.
    fn status(&self, status: &NodeStatus) {
        let _ = status;
    }
}

/// Sink forwarding to the `log` crate.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    node: String,
}

impl LogSink {
    /// Create a sink labelling every line with `node`.
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }

    fn label(&self) -> String {
        if self.node.is_empty() {
            format!("[{}]", LOGGER_NAME)
        } else {
            format!("[{}] [{}]", LOGGER_NAME, self.node)
        }
    }
}

impl NodeSink for LogSink {
    fn warn(&self, message: &str) {
        log::warn!("{} {}", self.label(), message);
    }

    fn error(&self, message: &str) {
        log::error!("{} {}", self.label(), message);
    }

    fn status(&self, status: &NodeStatus) {
        log::info!("{} status: {}", self.label(), status);
    }
}

/// Sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    statuses: Mutex<Vec<NodeStatus>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn statuses(&self) -> Vec<NodeStatus> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_status(&self) -> Option<NodeStatus> {
        self.statuses.lock().ok().and_then(|s| s.last().cloned())
    }

    /// Whether any warning contains `needle`.
    pub fn warned(&self, needle: &str) -> bool {
        self.warnings().iter().any(|w| w.contains(needle))
    }

    /// Whether any error contains `needle`.
    pub fn errored(&self, needle: &str) -> bool {
        self.errors().iter().any(|e| e.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut w) = self.warnings.lock() {
            w.clear();
        }
        if let Ok(mut e) = self.errors.lock() {
            e.clear();
        }
        if let Ok(mut s) = self.statuses.lock() {
            s.clear();
        }
    }
}

impl NodeSink for RecordingSink {
    fn warn(&self, message: &str) {
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(message.to_string());
        }
    }

    fn error(&self, message: &str) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message.to_string());
        }
    }

    fn status(&self, status: &NodeStatus) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push(status.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::status::{StatusFill, StatusShape};

    #[test]
    fn test_recording_sink_collects() {
        let sink = RecordingSink::new();
        sink.warn("first warning");
        sink.error("some error");
        sink.status(&NodeStatus {
            fill: StatusFill::Green,
            shape: StatusShape::Dot,
            text: "23 [number,global,default]".to_string(),
        });

        assert!(sink.warned("first"));
        assert!(!sink.warned("second"));
        assert!(sink.errored("error"));
        assert_eq!(sink.last_status().unwrap().fill, StatusFill::Green);

        sink.clear();
        assert!(sink.warnings().is_empty());
        assert!(sink.errors().is_empty());
        assert!(sink.statuses().is_empty());
    }

    #[test]
    fn test_log_sink_label() {
        assert_eq!(LogSink::default().label(), "[Persistent Values]");
        assert_eq!(LogSink::new("pv").label(), "[Persistent Values] [pv]");
        // Forwarding must not panic without an installed logger.
        LogSink::new("pv").warn("ignored");
    }
}
