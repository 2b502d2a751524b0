use std::sync::{Mutex, PoisonError};

/// Fire-and-forget sink for user-visible notifications.
///
/// Delivery (system tray, push, chat message) is the embedder's problem;
/// the engine only decides when a notification is warranted and what it
/// says.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that writes through the log. The default for headless runs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!("{title}: {body}");
    }
}

/// Notifier that records every notification, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> RecordingNotifier {
        RecordingNotifier::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_string(), body.to_string()));
    }
}
