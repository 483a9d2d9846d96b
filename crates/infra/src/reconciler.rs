//! Reconciliation orchestration (application-level).
//!
//! ```text
//! image reference
//!   ↓
//! 1. Detector.detect (min score from the policy)
//!   ↓
//! 2. Store.fetch_inventory, Store.fetch_catalog (once each, never cached)
//!   ↓
//! 3. ReconciliationPlan::prepare (aggregate, index, resolve; pure)
//!   ↓
//! 4. Store.upsert(working set), skipped when nothing resolved
//!   ↓
//! 5. ReconciliationPlan::finish (restock evaluation, summary)
//! ```
//!
//! Any detector or store failure aborts the call. Nothing is persisted unless every
//! step before the single upsert succeeded. There is no retry here; callers decide.

use chrono::{DateTime, Utc};
use thiserror::Error;

use toolcrib_inventory::{ReconcilePolicy, ReconciliationPlan, ReconciliationResult};

use crate::ports::{Detector, DetectorError, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReconcileError {
    /// A fetched record could not be parsed (as opposed to a service being unreachable).
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, ReconcileError::Store(StoreError::Malformed { .. }))
    }
}

/// Runs one reconciliation per call against an injected detector and store.
///
/// Holds no state between calls.
#[derive(Debug)]
pub struct Reconciler<D, S> {
    detector: D,
    store: S,
}

impl<D, S> Reconciler<D, S> {
    pub fn new(detector: D, store: S) -> Self {
        Self { detector, store }
    }

    pub fn into_parts(self) -> (D, S) {
        (self.detector, self.store)
    }
}

impl<D, S> Reconciler<D, S>
where
    D: Detector,
    S: RecordStore,
{
    pub async fn reconcile(
        &self,
        image_ref: &str,
        policy: &ReconcilePolicy,
    ) -> Result<ReconciliationResult, ReconcileError> {
        self.reconcile_at(image_ref, policy, Utc::now()).await
    }

    /// Same as [`reconcile`](Self::reconcile) with an explicit observation time.
    #[tracing::instrument(
        name = "reconcile",
        skip(self, policy, now),
        fields(allow_unknown = policy.allow_unknown, min_score = policy.min_score)
    )]
    pub async fn reconcile_at(
        &self,
        image_ref: &str,
        policy: &ReconcilePolicy,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationResult, ReconcileError> {
        let detections = self.detector.detect(image_ref, policy.min_score).await.map_err(|e| {
            tracing::warn!(error = %e, "detector call failed");
            e
        })?;

        let inventory = self.store.fetch_inventory().await?;
        let catalog = self.store.fetch_catalog().await?;
        tracing::debug!(
            detections = detections.len(),
            inventory = inventory.len(),
            catalog = catalog.len(),
            "inputs fetched"
        );

        let plan = ReconciliationPlan::prepare(&detections, inventory, catalog, policy, now);

        for c in plan.collisions() {
            tracing::warn!(
                key = %c.key,
                replaced = %c.replaced,
                winner = %c.winner,
                "alias shared by two records; later record wins"
            );
        }

        for record in plan.to_persist() {
            tracing::debug!(
                name = record.name(),
                quantity = record.quantity(),
                min_quantity = record.min_quantity(),
                "record resolved"
            );
        }

        let updated_rows = if plan.to_persist().is_empty() {
            0
        } else {
            self.store.upsert(plan.to_persist()).await.map_err(|e| {
                tracing::warn!(error = %e, records = plan.to_persist().len(), "upsert failed");
                e
            })?
        };

        let result = plan.finish(updated_rows);
        tracing::info!(
            detected = result.detected_items.len(),
            upserted = result.upserted_items.len(),
            restock = result.restock_items.len(),
            updated_rows = result.updated_rows,
            "reconciliation complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;
    use toolcrib_core::DomainError;
    use toolcrib_inventory::{Detection, InventoryRecord};

    use super::*;
    use crate::detector::StaticDetector;
    use crate::store::InMemoryRecordStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    /// Counts calls and delegates to an in-memory store.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryRecordStore,
        inventory_fetches: AtomicUsize,
        catalog_fetches: AtomicUsize,
        upserts: AtomicUsize,
        fail_catalog: bool,
    }

    #[async_trait]
    impl RecordStore for CountingStore {
        async fn fetch_inventory(&self) -> Result<Vec<InventoryRecord>, StoreError> {
            self.inventory_fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_inventory().await
        }

        async fn fetch_catalog(&self) -> Result<Vec<InventoryRecord>, StoreError> {
            self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_catalog {
                return Err(StoreError::Malformed {
                    row: 3,
                    source: DomainError::malformed("Min Quantity", "expected a non-negative integer, got `few`"),
                });
            }
            self.inner.fetch_catalog().await
        }

        async fn upsert(&self, records: &[InventoryRecord]) -> Result<usize, StoreError> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            self.inner.upsert(records).await
        }
    }

    struct DownDetector;

    #[async_trait]
    impl Detector for DownDetector {
        async fn detect(&self, _image_ref: &str, _min_score: f32) -> Result<Vec<Detection>, DetectorError> {
            Err(DetectorError::Unavailable("connection refused".to_string()))
        }
    }

    fn impact_driver() -> InventoryRecord {
        InventoryRecord::new("Impact Driver")
            .unwrap()
            .with_sku("123")
            .with_aliases(["driver", "drill"])
            .with_quantity(5)
            .with_min_quantity(2)
    }

    #[tokio::test]
    async fn matches_inventory_alias_and_flags_restock() {
        let store = Arc::new(CountingStore {
            inner: InMemoryRecordStore::new(vec![impact_driver()], vec![]),
            ..Default::default()
        });
        let detector = StaticDetector::new(vec![Detection::new("drill", 0.9, 2)]);
        let reconciler = Reconciler::new(detector, store.clone());

        let result = reconciler
            .reconcile_at("http://example.com/photo.jpg", &ReconcilePolicy::default(), now())
            .await
            .unwrap();

        assert_eq!(result.detected_items, vec!["drill"]);
        assert_eq!(result.updated_rows, 1);
        assert_eq!(result.restock_items, vec!["Impact Driver"]);
        assert!(result.upserted_items.is_empty());

        let persisted = store.inner.inventory_snapshot();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].quantity(), 2);
        assert_eq!(persisted[0].last_detected_at(), Some(now()));

        assert_eq!(store.inventory_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.catalog_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn flags_restock_when_count_falls_below_minimum() {
        let gloves = InventoryRecord::new("Safety Gloves")
            .unwrap()
            .with_sku("glove-001")
            .with_aliases(["glove", "gloves"])
            .with_quantity(5)
            .with_min_quantity(3);
        let store = InMemoryRecordStore::new(vec![gloves], vec![]);
        let detector = StaticDetector::new(vec![Detection::new("glove", 0.8, 2)]);
        let reconciler = Reconciler::new(detector, store);

        let result = reconciler
            .reconcile("http://example.com/photo.jpg", &ReconcilePolicy::default())
            .await
            .unwrap();

        assert!(result.restock_items.contains(&"Safety Gloves".to_string()));
    }

    #[tokio::test]
    async fn unknown_label_is_seeded_from_catalog() {
        let hex_keys = InventoryRecord::new("Hex Key Set")
            .unwrap()
            .with_sku("hex-007")
            .with_aliases(["allen key", "hex key"])
            .with_min_quantity(4)
            .with_location("Tool Wall");
        let store = Arc::new(InMemoryRecordStore::new(vec![], vec![hex_keys]));
        let detector = StaticDetector::new(vec![Detection::new("allen key", 0.92, 3)]);
        let reconciler = Reconciler::new(detector, store.clone());

        let result = reconciler
            .reconcile_at("http://example.com/photo.jpg", &ReconcilePolicy::default(), now())
            .await
            .unwrap();

        assert_eq!(result.upserted_items, vec!["Hex Key Set"]);
        assert_eq!(result.restock_items, vec!["Hex Key Set"]);

        let persisted = store.inventory_snapshot();
        assert_eq!(persisted[0].min_quantity(), 4);
        assert_eq!(persisted[0].quantity(), 3);
        assert_eq!(persisted[0].location(), Some("Tool Wall"));
    }

    #[tokio::test]
    async fn two_aliases_of_one_catalog_item_are_reported_per_label() {
        let hex_keys = InventoryRecord::new("Hex Key Set")
            .unwrap()
            .with_aliases(["allen key", "hex key"])
            .with_min_quantity(4);
        let store = Arc::new(InMemoryRecordStore::new(vec![], vec![hex_keys]));
        let detector = StaticDetector::new(vec![
            Detection::new("allen key", 0.9, 3),
            Detection::new("hex key", 0.9, 2),
        ]);
        let reconciler = Reconciler::new(detector, store.clone());

        let result = reconciler.reconcile_at("img", &ReconcilePolicy::default(), now()).await.unwrap();

        assert_eq!(result.upserted_items, vec!["Hex Key Set", "Hex Key Set"]);
        assert_eq!(result.restock_items, vec!["Hex Key Set", "Hex Key Set"]);
        assert_eq!(result.updated_rows, 2);

        let persisted = store.inventory_snapshot();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].quantity(), 2);
    }

    #[tokio::test]
    async fn disallowed_unknown_labels_persist_nothing() {
        let store = Arc::new(CountingStore::default());
        let detector = StaticDetector::new(vec![Detection::new("ladder", 0.9, 1)]);
        let reconciler = Reconciler::new(detector, store.clone());
        let policy = ReconcilePolicy::default().with_allow_unknown(false);

        let result = reconciler.reconcile_at("img", &policy, now()).await.unwrap();

        assert_eq!(result.detected_items, vec!["ladder"]);
        assert!(result.upserted_items.is_empty());
        assert_eq!(result.updated_rows, 0);
        assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
        assert!(store.inner.inventory_snapshot().is_empty());
    }

    #[tokio::test]
    async fn allowed_unknown_label_is_synthesized_with_default_minimum() {
        let store = Arc::new(InMemoryRecordStore::default());
        let detector = StaticDetector::new(vec![Detection::new("ladder rack", 0.9, 1)]);
        let reconciler = Reconciler::new(detector, store.clone());
        let policy = ReconcilePolicy::default().with_default_min_quantity(2);

        let result = reconciler.reconcile_at("img", &policy, now()).await.unwrap();

        assert_eq!(result.upserted_items, vec!["Ladder Rack"]);
        assert_eq!(result.restock_items, vec!["Ladder Rack"]);
        assert_eq!(store.inventory_snapshot()[0].aliases(), ["ladder rack".to_string()]);
    }

    #[tokio::test]
    async fn empty_detections_have_no_effect() {
        let store = Arc::new(CountingStore {
            inner: InMemoryRecordStore::new(vec![impact_driver()], vec![]),
            ..Default::default()
        });
        let reconciler = Reconciler::new(StaticDetector::new(vec![]), store.clone());

        let result = reconciler.reconcile_at("img", &ReconcilePolicy::default(), now()).await.unwrap();

        assert_eq!(result, ReconciliationResult::default());
        assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
        assert_eq!(store.inner.inventory_snapshot()[0].quantity(), 5);
    }

    #[tokio::test]
    async fn detector_failure_aborts_before_touching_the_store() {
        let store = Arc::new(CountingStore::default());
        let reconciler = Reconciler::new(DownDetector, store.clone());

        let err = reconciler.reconcile("img", &ReconcilePolicy::default()).await.unwrap_err();

        assert!(matches!(err, ReconcileError::Detector(DetectorError::Unavailable(_))));
        assert!(!err.is_malformed_record());
        assert_eq!(store.inventory_fetches.load(Ordering::SeqCst), 0);
        assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_catalog_fails_the_call_without_persisting() {
        let store = Arc::new(CountingStore {
            inner: InMemoryRecordStore::new(vec![impact_driver()], vec![]),
            fail_catalog: true,
            ..Default::default()
        });
        let detector = StaticDetector::new(vec![Detection::new("drill", 0.9, 1)]);
        let reconciler = Reconciler::new(detector, store.clone());

        let err = reconciler.reconcile("img", &ReconcilePolicy::default()).await.unwrap_err();

        assert!(err.is_malformed_record());
        assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
        assert_eq!(store.inner.inventory_snapshot()[0].quantity(), 5);
    }

    #[tokio::test]
    async fn low_scoring_detections_are_ignored() {
        let store = Arc::new(InMemoryRecordStore::new(vec![impact_driver()], vec![]));
        let detector = StaticDetector::new(vec![
            Detection::new("drill", 0.3, 1),
            Detection::new("driver", 0.7, 4),
        ]);
        let reconciler = Reconciler::new(detector, store.clone());

        let result = reconciler.reconcile_at("img", &ReconcilePolicy::default(), now()).await.unwrap();

        assert_eq!(result.detected_items, vec!["driver"]);
        assert!(result.restock_items.is_empty());
        assert_eq!(store.inventory_snapshot()[0].quantity(), 4);
    }
}
