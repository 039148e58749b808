//! Shared application state for all routes. The connection cache is owned
//! here and passed explicitly, never looked up through a global.

use crate::config::Settings;
use crate::db::{ConnectionCache, MongoCache, MongoConnector};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<MongoCache>,
    pub collection: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        AppState {
            cache: Arc::new(ConnectionCache::new(MongoConnector::new(settings))),
            collection: settings.collection.clone(),
        }
    }
}
