pub mod file;
pub mod memory;

pub use file::FilePlaybookProvider;
pub use memory::MemoryPlaybookProvider;
