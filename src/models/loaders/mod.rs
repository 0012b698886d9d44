pub mod chapter_loader;

pub use chapter_loader::{apply_range, scan_items};
