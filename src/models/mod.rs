pub mod batch;
pub mod books;
pub mod content;
pub mod key;

pub use batch::{BatchRun, BatchStatus};
pub use books::Book;
pub use content::{CacheEntry, FluidContent, Verse, VerseSet};
pub use key::{canonical_book, normalize_book, ChapterKey};
