pub mod validators;

pub use validators::{AcceptWellFormed, FnValidator};
