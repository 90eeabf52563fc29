pub mod logo_repository;
pub mod paths;
pub mod settings_service;
pub mod storage;

pub use crate::logo_repository::FileLogoRepository;
pub use crate::settings_service::SettingsService;
pub use crate::storage::{FsAccountDataStore, MemoryAccountDataStore};
