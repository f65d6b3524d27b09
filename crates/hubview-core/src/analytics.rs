//! Analytics events.
//!
//! Controllers report screen views, named events with a JSON payload, and
//! errors through [`AnalyticsSink`]. The bundled [`TracingAnalytics`] writes
//! them to the log under the `analytics` target.

use crate::error::NetworkError;
use serde_json::Value;
use tracing::{error, info};

/// Event names emitted by the controllers.
pub struct EventName;

impl EventName {
    pub const SCREEN_VIEW: &'static str = "screen_view";
    pub const USER_LIST_LOADED: &'static str = "user_list_loaded";
    pub const CACHED_USERS_LOADED: &'static str = "cached_users_loaded";
    pub const USER_DETAIL_VIEWED: &'static str = "user_detail_viewed";
    pub const NETWORK_ERROR: &'static str = "network_error";
}

/// Screen names passed to [`AnalyticsSink::track_screen_view`].
pub struct ScreenName;

impl ScreenName {
    pub const USER_LIST: &'static str = "UserListView";
}

/// Destination for analytics events.
pub trait AnalyticsSink: Send + Sync {
    fn track_screen_view(&self, screen: &str);

    /// Record a named event. `parameters` is a JSON object or `Value::Null`.
    fn track_event(&self, name: &str, parameters: Value);

    fn track_error(&self, error: &NetworkError);
}

/// Analytics sink that logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track_screen_view(&self, screen: &str) {
        info!(target: "analytics", event = EventName::SCREEN_VIEW, "Screen View: {}", screen);
    }

    fn track_event(&self, name: &str, parameters: Value) {
        info!(target: "analytics", event = name, "Event: {}, Parameters: {}", name, parameters);
    }

    fn track_error(&self, error: &NetworkError) {
        error!(target: "analytics", error_id = error.id(), "Tracked Error: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_logs_under_analytics_target() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = TracingAnalytics;
            sink.track_screen_view(ScreenName::USER_LIST);
            sink.track_event(
                EventName::USER_LIST_LOADED,
                json!({"page": 0, "user_count": 20}),
            );
            sink.track_error(&NetworkError::MaxRetriesExceeded { attempts: 4 });
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.contains("analytics")));

        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("Screen View: UserListView"));
        assert!(lines[1].contains("Event: user_list_loaded"));
        assert!(lines[1].contains(r#"{"page":0,"user_count":20}"#));
        assert!(lines[2].contains("ERROR"));
        assert!(lines[2].contains("Tracked Error: Max retries exceeded after 4 attempts"));
    }
}
