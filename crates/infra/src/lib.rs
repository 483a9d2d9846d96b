//! Infrastructure layer: ports, adapters, orchestration, config.

pub mod config;
pub mod detector;
pub mod ports;
pub mod reconciler;
pub mod sheet_rows;
pub mod store;

pub use config::{AppConfig, ConfigError, SheetsConfig};
pub use detector::{DisabledDetector, StaticDetector, VisionDetector};
pub use ports::{Detector, DetectorError, RecordStore, StoreError};
pub use reconciler::{ReconcileError, Reconciler};
pub use store::{InMemoryRecordStore, SheetsRecordStore};
