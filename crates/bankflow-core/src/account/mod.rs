//! Account data downloaded at the end of a consent flow.

pub mod model;
pub mod repository;

pub use model::{AccountData, AccountDataBundle, AccountDataKind, StorageKey};
pub use repository::AccountDataStore;
