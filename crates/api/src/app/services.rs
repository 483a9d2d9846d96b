use std::sync::Arc;

use thiserror::Error;

use toolcrib_infra::{
    AppConfig, Detector, DetectorError, DisabledDetector, InMemoryRecordStore, ReconcileError, Reconciler,
    RecordStore, SheetsRecordStore, StoreError, VisionDetector,
};
use toolcrib_inventory::ReconciliationResult;

pub type DynReconciler = Reconciler<Arc<dyn Detector>, Arc<dyn RecordStore>>;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("detector setup failed: {0}")]
    Detector(#[from] DetectorError),

    #[error("record store setup failed: {0}")]
    Store(#[from] StoreError),
}

/// Everything a request handler needs: the reconciler and the loaded configuration.
pub struct AppServices {
    reconciler: DynReconciler,
    config: AppConfig,
}

impl AppServices {
    pub fn new(detector: Arc<dyn Detector>, store: Arc<dyn RecordStore>, config: AppConfig) -> Self {
        Self {
            reconciler: Reconciler::new(detector, store),
            config,
        }
    }

    /// Wire real adapters from configuration.
    ///
    /// Without spreadsheet settings the store is in-memory (dev); without a Vision key
    /// every ingest fails with a service error.
    pub fn from_config(config: AppConfig) -> Result<Self, ServicesError> {
        let detector: Arc<dyn Detector> = match &config.vision_api_key {
            Some(key) => Arc::new(VisionDetector::with_endpoint(key.clone(), config.vision_endpoint.clone())?),
            None => {
                tracing::warn!("VISION_API_KEY not set; image detection is disabled");
                Arc::new(DisabledDetector::new("image detection is not configured (VISION_API_KEY)"))
            }
        };

        let store: Arc<dyn RecordStore> = match &config.sheets {
            Some(sheets) => {
                tracing::info!(
                    inventory_tab = %sheets.inventory_tab,
                    catalog_tab = ?sheets.catalog_tab,
                    "using spreadsheet record store"
                );
                Arc::new(
                    SheetsRecordStore::new(
                        sheets.spreadsheet_id.clone(),
                        sheets.access_token.clone(),
                        sheets.inventory_tab.clone(),
                    )?
                    .with_catalog_tab(sheets.catalog_tab.clone()),
                )
            }
            None => {
                tracing::warn!("SHEETS_SPREADSHEET_ID not set; using in-memory record store (dev only)");
                Arc::new(InMemoryRecordStore::default())
            }
        };

        Ok(Self::new(detector, store, config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// One reconciliation for one image, under the configured policy with the
    /// request's `allow_unknown` override applied.
    pub async fn ingest(
        &self,
        image_url: &str,
        allow_unknown: Option<bool>,
    ) -> Result<ReconciliationResult, ReconcileError> {
        let policy = self.config.policy(allow_unknown);
        self.reconciler.reconcile(image_url, &policy).await
    }
}
