pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::{toml_config::TomlConfig, MetadataConfig};
pub use crate::core::{engine::MetadataEngine, pipeline::MoviePipeline, resolver::MetadataResolver};
pub use domain::model::{Metadata, MovieRecord, MovieRequest, MovieResponse, Source};
pub use utils::error::{MetaError, ProviderError, Result};
