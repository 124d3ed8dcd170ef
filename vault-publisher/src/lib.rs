pub mod cli;
pub mod github;
pub mod load_config;
pub mod vault;

pub use cli::{run, Cli, Commands};
