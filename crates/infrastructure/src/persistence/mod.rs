//! Client-side persistence.

mod file_store;

pub use file_store::FileStore;
