pub mod chapter_flow;

pub use chapter_flow::{ChapterResolver, Generated, PersistMode, PersistOutcome};
