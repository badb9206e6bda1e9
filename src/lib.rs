//! Flat `name = value` configuration files, loaded into a lookup table and
//! bound onto `serde`-derived structs.

pub mod config;

pub use config::{Config, ConfigBuilder, ConfigError};
