//! Durable credential storage.
//!
//! [`plumber_core::MemoryStore`] covers the non-durable case.

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "file")]
pub use file::FileStore;
