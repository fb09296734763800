pub mod commands;
pub mod report;

pub use commands::Commands;
pub use report::{KeyReport, StatusReport};
