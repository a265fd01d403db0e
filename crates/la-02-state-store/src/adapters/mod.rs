mod file;
mod memory;

pub use file::FileStateStore;
pub use memory::InMemoryStateStore;
