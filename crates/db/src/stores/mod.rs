//! Transactional adapters implementing the `vnt-core` persistence ports.
//!
//! Each store owns one transaction. Callers drive the core algorithm
//! against it and then [`commit`](PgChapterStore::commit); dropping a store
//! without committing rolls everything back.

pub mod chapter;
pub mod screenshot;

pub use chapter::PgChapterStore;
pub use screenshot::PgScreenshotStore;
