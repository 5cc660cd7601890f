//! Application state.

use std::sync::Arc;

use ugc_storage::StorageClient;
use ugc_store::StoreClient;
use ugc_workflow::WorkflowClient;

use crate::auth::TokenVerifier;
use crate::config::ApiConfig;
use crate::services::GenerationService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: StoreClient,
    pub storage: Arc<StorageClient>,
    pub verifier: Arc<TokenVerifier>,
    pub generation: GenerationService,
}

impl AppState {
    /// Create application state from the environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = StoreClient::from_env()?;
        let storage = Arc::new(StorageClient::from_env()?);
        let workflow = Arc::new(WorkflowClient::from_env()?);
        let verifier = Arc::new(TokenVerifier::from_env()?);

        Ok(Self::with_clients(config, store, storage, workflow, verifier))
    }

    /// Create state with explicit collaborators (used by tests).
    pub fn with_clients(
        config: ApiConfig,
        store: StoreClient,
        storage: Arc<StorageClient>,
        workflow: Arc<WorkflowClient>,
        verifier: Arc<TokenVerifier>,
    ) -> Self {
        let generation =
            GenerationService::new(store.clone(), Arc::clone(&storage), Arc::clone(&workflow));

        Self {
            config,
            store,
            storage,
            verifier,
            generation,
        }
    }
}
