use std::collections::HashMap;

use chrono::{DateTime, Utc};

use toolcrib_core::{AliasKey, Entity};

use crate::alias_index::AliasIndex;
use crate::detection::AggregatedDetection;
use crate::policy::ReconcilePolicy;
use crate::record::InventoryRecord;

/// Outcome of resolving one aggregated label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Existing inventory record, re-observed.
    Matched(InventoryRecord),
    /// New record seeded from a catalog definition.
    FromCatalog(InventoryRecord),
    /// New record built from the label alone.
    Synthesized(InventoryRecord),
    /// No match and unknown labels are not allowed (or the label is blank).
    Unmatched,
}

impl Resolution {
    pub fn record(&self) -> Option<&InventoryRecord> {
        match self {
            Resolution::Matched(r) | Resolution::FromCatalog(r) | Resolution::Synthesized(r) => Some(r),
            Resolution::Unmatched => None,
        }
    }

    /// Whether the resolution created a record that was not in inventory.
    pub fn is_new(&self) -> bool {
        matches!(self, Resolution::FromCatalog(_) | Resolution::Synthesized(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Matched(_) => "inventory",
            Resolution::FromCatalog(_) => "catalog",
            Resolution::Synthesized(_) => "synthesized",
            Resolution::Unmatched => "unmatched",
        }
    }
}

/// Records touched during one reconciliation pass, one entry per resolved label, in
/// resolution order.
///
/// Two labels that resolve to the same record yield two entries. Admitting a later
/// copy refreshes the earlier ones, so every entry for a record carries the values
/// of its last observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    records: Vec<InventoryRecord>,
    positions: HashMap<AliasKey, Vec<usize>>,
    upserted: Vec<String>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a resolution. `Unmatched` is ignored.
    pub fn admit(&mut self, resolution: Resolution) {
        let is_new = resolution.is_new();
        let record = match resolution {
            Resolution::Matched(r) | Resolution::FromCatalog(r) | Resolution::Synthesized(r) => r,
            Resolution::Unmatched => return,
        };

        if is_new {
            self.upserted.push(record.name().to_string());
        }

        let positions = self.positions.entry(record.id().clone()).or_default();
        for &pos in positions.iter() {
            self.records[pos] = record.clone();
        }
        positions.push(self.records.len());
        self.records.push(record);
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    /// Names of catalog-derived or synthesized records, in resolution order.
    pub fn upserted_names(&self) -> &[String] {
        &self.upserted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Maps aggregated labels to inventory records.
///
/// Priority per label: inventory alias, then (if unknown labels are allowed) catalog
/// alias, then a synthesized record. Records are returned as copies; the indexes are
/// never mutated.
#[derive(Debug)]
pub struct MatchResolver<'a> {
    inventory: &'a AliasIndex,
    catalog: &'a AliasIndex,
    policy: &'a ReconcilePolicy,
    now: DateTime<Utc>,
}

impl<'a> MatchResolver<'a> {
    pub fn new(
        inventory: &'a AliasIndex,
        catalog: &'a AliasIndex,
        policy: &'a ReconcilePolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            inventory,
            catalog,
            policy,
            now,
        }
    }

    pub fn resolve(&self, detection: &AggregatedDetection) -> Resolution {
        let label = detection.label.as_str();
        let count = detection.count;

        if let Some(existing) = self.inventory.lookup(label) {
            return Resolution::Matched(existing.observed(count, self.now));
        }

        if !self.policy.allow_unknown {
            return Resolution::Unmatched;
        }

        if let Some(entry) = self.catalog.lookup(label) {
            return Resolution::FromCatalog(self.from_catalog(entry, label, count));
        }

        match InventoryRecord::new(title_case(label)) {
            Ok(record) => Resolution::Synthesized(
                record
                    .with_aliases([label])
                    .with_quantity(count)
                    .with_min_quantity(self.policy.default_min_quantity)
                    .with_last_detected_at(self.now),
            ),
            Err(_) => Resolution::Unmatched,
        }
    }

    pub fn resolve_all(&self, detections: &[AggregatedDetection]) -> WorkingSet {
        let mut set = WorkingSet::new();
        for detection in detections {
            set.admit(self.resolve(detection));
        }
        set
    }

    fn from_catalog(&self, entry: &InventoryRecord, label: &str, count: u32) -> InventoryRecord {
        let aliases: Vec<String> = if entry.aliases().is_empty() {
            vec![label.to_string()]
        } else {
            entry.aliases().to_vec()
        };
        let min_quantity = match entry.min_quantity() {
            0 => self.policy.default_min_quantity,
            n => n,
        };

        // Name, SKU and location carry over from the catalog entry.
        entry
            .observed(count, self.now)
            .with_aliases(aliases)
            .with_min_quantity(min_quantity)
    }
}

/// Capitalize the first letter of every alphabetic run and lower-case the rest
/// (`"allen key"` → `"Allen Key"`, `"3d printer"` → `"3D Printer"`).
pub fn title_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_word = false;
    for ch in label.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}
