//! Boundaries the reconciler talks to: an image detector and a record store.
//!
//! Both are async because every real implementation does network IO. In-memory
//! implementations exist for tests/dev (see `detector::StaticDetector` and
//! `store::InMemoryRecordStore`).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use toolcrib_core::DomainError;
use toolcrib_inventory::{Detection, InventoryRecord};

/// Image detector failure. Always fatal to the reconciliation that triggered it.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The call could not be completed (connect, timeout, client setup).
    #[error("detector unavailable: {0}")]
    Unavailable(String),

    /// The detector answered with a failure status or an error payload.
    #[error("detector rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("detector response could not be decoded: {0}")]
    Decode(String),
}

/// Record store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record store rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    /// A fetched row failed typed parsing; the whole fetch is unusable.
    #[error("row {row}: {source}")]
    Malformed {
        row: usize,
        #[source]
        source: DomainError,
    },
}

/// Produces labelled detections for an image reference.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detections scoring below `min_score` are not returned.
    async fn detect(&self, image_ref: &str, min_score: f32) -> Result<Vec<Detection>, DetectorError>;
}

/// Durable home of inventory and catalog records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Empty when no catalog is configured.
    async fn fetch_catalog(&self) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Insert-or-replace by record name. Returns the number of records written.
    async fn upsert(&self, records: &[InventoryRecord]) -> Result<usize, StoreError>;
}

#[async_trait]
impl<T> Detector for Arc<T>
where
    T: Detector + ?Sized,
{
    async fn detect(&self, image_ref: &str, min_score: f32) -> Result<Vec<Detection>, DetectorError> {
        (**self).detect(image_ref, min_score).await
    }
}

#[async_trait]
impl<T> RecordStore for Arc<T>
where
    T: RecordStore + ?Sized,
{
    async fn fetch_inventory(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        (**self).fetch_inventory().await
    }

    async fn fetch_catalog(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        (**self).fetch_catalog().await
    }

    async fn upsert(&self, records: &[InventoryRecord]) -> Result<usize, StoreError> {
        (**self).upsert(records).await
    }
}
