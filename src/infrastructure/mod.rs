pub mod extractors;
pub mod fs;
pub mod memory;
pub mod watcher;
