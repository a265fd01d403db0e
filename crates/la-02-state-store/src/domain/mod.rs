pub mod errors;
pub mod index;
pub mod page;
pub mod updates;

pub use errors::*;
pub use index::{CommitStatus, RecordIndex};
pub use page::{Page, PageSpecification};
pub use updates::StateUpdates;
