//! Line-oriented configuration loading and struct binding.

mod bind;
mod builder;
mod error;
mod store;

pub use builder::ConfigBuilder;
pub use error::ConfigError;
pub use store::{parse_bool, Config, DEFAULT_SEPARATOR};
