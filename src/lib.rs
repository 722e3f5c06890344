pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod types;
pub mod validation;

pub use db::CrmDb;
pub use error::{CrmError, Result};
pub use store::{open_store, CrmStore, MemoryStore, SharedStore, StorageConfig};
pub use types::*;
