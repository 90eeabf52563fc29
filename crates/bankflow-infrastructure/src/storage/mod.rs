//! Account data storage backends.

pub mod fs_account_store;
pub mod memory_account_store;

pub use fs_account_store::FsAccountDataStore;
pub use memory_account_store::MemoryAccountDataStore;
