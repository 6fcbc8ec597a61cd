//! 基础设施层
//!
//! 持有各个内容来源，只暴露 get/put/fetch 能力，不关心解析顺序。

pub mod canonical_source;
pub mod corpus;
pub mod ephemeral_cache;
pub mod store;

pub use canonical_source::{BibleApiSource, CanonicalSource};
pub use corpus::StaticCorpus;
pub use ephemeral_cache::{EphemeralCache, MemoryCache};
pub use store::{FileStore, HttpStore, PersistentStore};
