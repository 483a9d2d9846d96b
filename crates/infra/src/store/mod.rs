//! Record store adapters.

pub mod in_memory;
pub mod sheets;

pub use in_memory::InMemoryRecordStore;
pub use sheets::SheetsRecordStore;
