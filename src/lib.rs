//! Authenticated access to the Syntaxly API.
//!
//! [`Gateway`] attaches bearer credentials to outbound requests and recovers
//! from an expired credential by running a single shared refresh exchange and
//! replaying every request that hit the 401. [`Session`] keeps the signed-in
//! user's credential current on top of it.

pub mod auth;
pub mod config;
mod errors;
pub mod gateway;
pub mod navigation;
pub mod refresh;
pub mod session;
pub mod telemetry;
pub mod types;

pub use auth::AuthApi;
pub use config::{Config, ConfigLocation, read_config};
pub use errors::Error;
pub use gateway::{Gateway, RequestOptions};
pub use navigation::{Navigator, RecordingNavigator, TracingNavigator};
pub use session::{Session, SessionState};
