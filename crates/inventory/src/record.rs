use chrono::{DateTime, Utc};
use serde::Serialize;

use toolcrib_core::{AliasKey, DomainError, DomainResult, Entity};

/// A physical item tracked in the tool crib (inventory row or catalog definition).
///
/// Identity is the normalized name: the record store upserts by name, and the
/// reconciliation working set never holds two records with the same name key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRecord {
    #[serde(skip)]
    key: AliasKey,
    name: String,
    sku: Option<String>,
    aliases: Vec<String>,
    quantity: u32,
    min_quantity: u32,
    location: Option<String>,
    last_detected_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    /// Create a record with zero quantity, zero minimum, and no optional fields.
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let key = AliasKey::normalize(&name)
            .ok_or_else(|| DomainError::validation("record name cannot be empty"))?;
        Ok(Self {
            key,
            name,
            sku: None,
            aliases: Vec::new(),
            quantity: 0,
            min_quantity: 0,
            location: None,
            last_detected_at: None,
        })
    }

    /// Blank SKUs are treated as absent.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        let sku = sku.into();
        self.sku = if sku.trim().is_empty() { None } else { Some(sku) };
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_min_quantity(mut self, min_quantity: u32) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    /// Blank locations are treated as absent.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        self.location = if location.trim().is_empty() { None } else { Some(location) };
        self
    }

    pub fn with_last_detected_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_detected_at = Some(at);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn min_quantity(&self) -> u32 {
        self.min_quantity
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn last_detected_at(&self) -> Option<DateTime<Utc>> {
        self.last_detected_at
    }

    /// Every normalized key this record can be recognized by: name, then SKU, then
    /// aliases. Blank entries are skipped; duplicates are kept (harmless for indexing).
    pub fn identifying_keys(&self) -> Vec<AliasKey> {
        let mut keys = Vec::with_capacity(2 + self.aliases.len());
        keys.push(self.key.clone());
        keys.extend(self.sku.as_deref().and_then(AliasKey::normalize));
        keys.extend(self.aliases.iter().filter_map(|a| AliasKey::normalize(a)));
        keys
    }

    /// A copy of this record observed `count` times at `at`.
    ///
    /// Quantity is overwritten, never incremented: a detection reports what is on the
    /// shelf now, not a movement.
    pub fn observed(&self, count: u32, at: DateTime<Utc>) -> Self {
        Self {
            quantity: count,
            last_detected_at: Some(at),
            ..self.clone()
        }
    }

    /// At or below the minimum counts as needing restock.
    pub fn needs_restock(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

impl Entity for InventoryRecord {
    type Id = AliasKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}
