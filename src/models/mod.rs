pub mod batch;
pub mod item;
pub mod loaders;

pub use batch::{Batch, BatchOutcome, BatchReport, RunReport, RunStatus};
pub use item::{ChapterNumber, Item};
pub use loaders::{apply_range, scan_items};
