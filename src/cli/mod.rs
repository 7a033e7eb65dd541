pub mod commands;
pub mod analyze;
pub mod search;
pub mod check;
pub mod validate;
pub mod progress;

pub use commands::{Cli, Commands};
