use std::collections::HashMap;

use toolcrib_core::{AliasKey, Entity};

use crate::record::InventoryRecord;

/// A key that was re-pointed from one record to a different record while building
/// an index. The later record wins; callers decide whether to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCollision {
    pub key: AliasKey,
    pub replaced: String,
    pub winner: String,
}

/// Lookup from normalized identifiers (name, SKU, aliases) to records.
///
/// The index owns its records and maps each key to a *position* in that collection,
/// so a record reachable through several keys is still a single value. Built fresh
/// for every reconciliation call.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    records: Vec<InventoryRecord>,
    keys: HashMap<AliasKey, usize>,
    collisions: Vec<AliasCollision>,
}

impl AliasIndex {
    /// Build an index from records in priority order (last write wins per key).
    pub fn build(records: impl IntoIterator<Item = InventoryRecord>) -> Self {
        let records: Vec<InventoryRecord> = records.into_iter().collect();
        let mut keys: HashMap<AliasKey, usize> = HashMap::new();
        let mut collisions = Vec::new();

        for (pos, record) in records.iter().enumerate() {
            for key in record.identifying_keys() {
                if let Some(prev) = keys.insert(key.clone(), pos) {
                    let previous = &records[prev];
                    if prev != pos && previous.id() != record.id() {
                        collisions.push(AliasCollision {
                            key,
                            replaced: previous.name().to_string(),
                            winner: record.name().to_string(),
                        });
                    }
                }
            }
        }

        Self {
            records,
            keys,
            collisions,
        }
    }

    /// Position of the record a label resolves to.
    pub fn position(&self, label: &str) -> Option<usize> {
        let key = AliasKey::normalize(label)?;
        self.keys.get(&key).copied()
    }

    pub fn lookup(&self, label: &str) -> Option<&InventoryRecord> {
        self.position(label).map(|pos| &self.records[pos])
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
