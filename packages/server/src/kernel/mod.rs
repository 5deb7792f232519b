//! Kernel module - server infrastructure and dependencies.

pub mod blob_store;
pub mod deps;
pub mod postgres_store;
pub mod test_dependencies;
pub mod traits;

pub use blob_store::FsBlobStore;
pub use deps::{ServerDeps, TwilioAdapter};
pub use postgres_store::PgStore;
pub use test_dependencies::{
    InMemoryBlobStore, InMemoryStore, MockMessagingService, SentMessage, TestDependencies,
    TEST_JWT_ISSUER, TEST_JWT_SECRET,
};
pub use traits::*;

/// Bucket holding receipt files.
pub const RECEIPTS_BUCKET: &str = "receipts";
