pub mod json_file;
pub mod memory;

pub use json_file::{read_saved_job, JsonFileSink, SavedJob};
pub use memory::MemorySink;
