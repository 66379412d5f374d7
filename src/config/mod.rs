//! Configuration module

pub mod cli;
pub mod pipeline_config;

pub use cli::{CliArgs, DEFAULT_DIM};
pub use pipeline_config::PipelineConfig;
