//! JSON input problems and result records for the command line.

pub mod problem;
pub mod report;

pub use problem::{Blocks, Problem};
pub use report::{SplitRecord, SystemRecord};
