#![allow(dead_code)]

use std::sync::Arc;

use syntaxly_gateway::{Config, Gateway, RecordingNavigator, Session};
use wiremock::MockServer;

pub fn config(server: &MockServer) -> Config {
    Config::from_values(server.uri(), None, None)
}

pub fn gateway(server: &MockServer) -> (Gateway, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let gateway =
        Gateway::with_navigator(&config(server), navigator.clone()).expect("gateway builds");
    (gateway, navigator)
}

pub fn session(server: &MockServer) -> (Session, Arc<RecordingNavigator>) {
    let (gateway, navigator) = gateway(server);
    (Session::new(gateway), navigator)
}
