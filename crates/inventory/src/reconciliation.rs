//! The pure half of a reconciliation pass.
//!
//! [`ReconciliationPlan::prepare`] takes already-fetched detections and records and
//! decides what to persist; [`ReconciliationPlan::finish`] turns the persisted count
//! into the caller-facing summary. Fetching and persisting live in the infra layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alias_index::{AliasCollision, AliasIndex};
use crate::detection::{aggregate, AggregatedDetection, Detection};
use crate::policy::ReconcilePolicy;
use crate::record::InventoryRecord;
use crate::resolver::{MatchResolver, WorkingSet};
use crate::restock::restock_needed;

/// Summary returned to callers of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Unique labels observed, in aggregation order.
    pub detected_items: Vec<String>,
    /// Names of catalog-derived or synthesized records, in resolution order.
    pub upserted_items: Vec<String>,
    /// Names whose post-update quantity is at or below their minimum.
    pub restock_items: Vec<String>,
    /// Records written by the store.
    pub updated_rows: usize,
}

/// Resolved, not yet persisted.
#[derive(Debug, Clone)]
pub struct ReconciliationPlan {
    aggregated: Vec<AggregatedDetection>,
    working_set: WorkingSet,
    collisions: Vec<AliasCollision>,
}

impl ReconciliationPlan {
    pub fn prepare(
        detections: &[Detection],
        inventory: Vec<InventoryRecord>,
        catalog: Vec<InventoryRecord>,
        policy: &ReconcilePolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let aggregated = aggregate(detections);
        let inventory = AliasIndex::build(inventory);
        let catalog = AliasIndex::build(catalog);

        let working_set = MatchResolver::new(&inventory, &catalog, policy, now).resolve_all(&aggregated);

        let mut collisions = inventory.collisions().to_vec();
        collisions.extend_from_slice(catalog.collisions());

        Self {
            aggregated,
            working_set,
            collisions,
        }
    }

    pub fn aggregated(&self) -> &[AggregatedDetection] {
        &self.aggregated
    }

    /// Records to hand to the store, in resolution order.
    pub fn to_persist(&self) -> &[InventoryRecord] {
        self.working_set.records()
    }

    /// Keys re-pointed between distinct records while indexing inventory and catalog.
    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }

    /// Evaluate restock over what was persisted and build the summary.
    pub fn finish(self, updated_rows: usize) -> ReconciliationResult {
        ReconciliationResult {
            detected_items: self.aggregated.into_iter().map(|a| a.label).collect(),
            upserted_items: self.working_set.upserted_names().to_vec(),
            restock_items: restock_needed(self.working_set.records()),
            updated_rows,
        }
    }
}
