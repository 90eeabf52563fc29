//! Web front end: bank selection, consent redirect, results and downloads.

pub mod error;
pub mod pages;
pub mod routes;

use bankflow_application::ConsentFlowService;
use bankflow_infrastructure::FsAccountDataStore;
use pages::Pages;
use std::sync::Arc;

pub use error::WebError;
pub use routes::create_router;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub flows: Arc<ConsentFlowService>,
    pub downloads: Arc<FsAccountDataStore>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(
        flows: Arc<ConsentFlowService>,
        downloads: Arc<FsAccountDataStore>,
    ) -> bankflow_core::Result<Self> {
        Ok(Self {
            flows,
            downloads,
            pages: Arc::new(Pages::new()?),
        })
    }
}
