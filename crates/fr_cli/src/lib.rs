pub mod commands;

pub use commands::{Pipeline, RunOptions, RunSummary};
