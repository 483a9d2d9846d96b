//! Detection reconciliation engine.
//!
//! This crate contains the matching rules that map detector labels onto inventory
//! records, implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). Callers fetch records, hand them in, and persist what comes out.

pub mod alias_index;
pub mod detection;
pub mod policy;
pub mod reconciliation;
pub mod record;
pub mod resolver;
pub mod restock;

pub use alias_index::{AliasCollision, AliasIndex};
pub use detection::{aggregate, AggregatedDetection, Detection};
pub use policy::ReconcilePolicy;
pub use reconciliation::{ReconciliationPlan, ReconciliationResult};
pub use record::InventoryRecord;
pub use resolver::{title_case, MatchResolver, Resolution, WorkingSet};
pub use restock::restock_needed;
