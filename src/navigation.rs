use std::sync::Mutex;

use tracing::warn;

/// Where the gateway sends the user when authentication cannot be recovered.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Emits the redirect as a log event; for hosts that watch the log stream.
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        warn!(route, "navigation.redirect");
    }
}

/// Remembers every redirect in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route.to_string());
    }
}
