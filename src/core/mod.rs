pub mod engine;
pub mod matcher;
pub mod pipeline;
pub mod rating;
pub mod resolver;

pub use crate::domain::model::{Metadata, MovieRecord, MovieRequest, MovieResponse, Source};
pub use crate::domain::ports::{MetadataProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
