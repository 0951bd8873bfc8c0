pub mod aggregate;
pub mod checkpoint;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod paginator;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod resolver;

pub use config::CrawlConfig;
pub use error::{FetchError, PipelineError, ResolveError};
pub use pipeline::{Pipeline, RunOutput};
