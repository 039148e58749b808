//! Evently: form-encoded event ingestion over a cached MongoDB connection.

pub mod config;
pub mod db;
pub mod error;
pub mod event;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use db::{ConnectionCache, Connector, MongoCache, MongoConnector};
pub use error::{AppError, ConfigError};
pub use event::{EventPayload, EventRecord};
pub use routes::{common_routes, event_routes};
pub use state::AppState;
