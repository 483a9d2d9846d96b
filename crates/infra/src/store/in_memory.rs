use std::sync::RwLock;

use async_trait::async_trait;

use toolcrib_core::Entity;
use toolcrib_inventory::InventoryRecord;

use crate::ports::{RecordStore, StoreError};

/// In-memory record store.
///
/// Intended for tests/dev. Upserts replace by record identity (normalized name) and
/// append otherwise, preserving row order like a spreadsheet would.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inventory: RwLock<Vec<InventoryRecord>>,
    catalog: RwLock<Vec<InventoryRecord>>,
}

impl InMemoryRecordStore {
    pub fn new(inventory: Vec<InventoryRecord>, catalog: Vec<InventoryRecord>) -> Self {
        Self {
            inventory: RwLock::new(inventory),
            catalog: RwLock::new(catalog),
        }
    }

    /// Current inventory rows, in storage order.
    pub fn inventory_snapshot(&self) -> Vec<InventoryRecord> {
        self.inventory
            .read()
            .map(|rows| rows.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        Ok(self.inventory.read().map_err(|_| poisoned())?.clone())
    }

    async fn fetch_catalog(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        Ok(self.catalog.read().map_err(|_| poisoned())?.clone())
    }

    async fn upsert(&self, records: &[InventoryRecord]) -> Result<usize, StoreError> {
        let mut rows = self.inventory.write().map_err(|_| poisoned())?;

        for record in records {
            match rows.iter_mut().find(|row| row.id() == record.id()) {
                Some(row) => *row = record.clone(),
                None => rows.push(record.clone()),
            }
        }

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, quantity: u32) -> InventoryRecord {
        InventoryRecord::new(name).unwrap().with_quantity(quantity)
    }

    #[tokio::test]
    async fn upsert_replaces_by_name_and_appends_new_rows() {
        let store = InMemoryRecordStore::new(vec![record("Tape Measure", 4), record("Hammer", 1)], vec![]);

        let written = store
            .upsert(&[record("  tape measure ", 2), record("Utility Knife", 6)])
            .await
            .unwrap();

        assert_eq!(written, 2);
        let rows = store.inventory_snapshot();
        let names: Vec<&str> = rows.iter().map(InventoryRecord::name).collect();
        assert_eq!(names, vec!["  tape measure ", "Hammer", "Utility Knife"]);
        assert_eq!(rows[0].quantity(), 2);
    }

    #[tokio::test]
    async fn catalog_is_read_only_from_the_port() {
        let store = InMemoryRecordStore::new(vec![], vec![record("Hex Key Set", 0)]);

        store.upsert(&[record("Hex Key Set", 3)]).await.unwrap();

        assert_eq!(store.fetch_catalog().await.unwrap()[0].quantity(), 0);
        assert_eq!(store.fetch_inventory().await.unwrap()[0].quantity(), 3);
    }

    #[tokio::test]
    async fn empty_store_fetches_nothing() {
        let store = InMemoryRecordStore::default();
        assert!(store.fetch_inventory().await.unwrap().is_empty());
        assert!(store.fetch_catalog().await.unwrap().is_empty());
    }
}
