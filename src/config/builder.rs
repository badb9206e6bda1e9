use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;

use super::store::DEFAULT_SEPARATOR;
use super::{Config, ConfigError};

/// A step in the loading pipeline.
#[derive(Debug)]
enum ConfigSource {
    Default { name: String, value: String },
    File { path: PathBuf, required: bool },
    Text(String),
}

/// Builder for loading configuration from several files and strings.
///
/// Sources are applied in registration order, so a later source overrides
/// keys set by an earlier one. Defaults only fill in names that no source
/// provides, wherever they are registered.
///
/// ## Example
///
/// ```no_run
/// use dragon_kv::Config;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     port: u16,
/// }
///
/// let config: MyConfig = Config::builder()
///     .with_default("port", "8080")
///     .with_file("config/default.conf", true)
///     .with_file("config/local.conf", false)
///     .build()?;
/// # Ok::<(), dragon_kv::ConfigError>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    separator: char,
    sources: Vec<ConfigSource>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl ConfigBuilder {
    /// Splits lines on `separator` instead of `=`.
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Registers a fallback value for `name`.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Default {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file to be loaded.
    ///
    /// If `required` is `true`, the build fails if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(ConfigSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds literal configuration text.
    pub fn with_str(mut self, content: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Text(content.into()));
        self
    }

    /// Loads every source into a fresh [`Config`].
    pub fn build_store(self) -> Result<Config, ConfigError> {
        let mut config = Config::with_separator(self.separator);

        for source in self.sources {
            match source {
                ConfigSource::Default { name, value } => config.set_default(&name, &value),
                ConfigSource::File { path, required: true } => config.load_file(&path)?,
                ConfigSource::File { path, required: false } => {
                    if !config.load_optional_file(&path)? {
                        debug!("skipping missing config file {}", path.display());
                    }
                }
                ConfigSource::Text(content) => config.load_str(&content)?,
            }
        }

        Ok(config)
    }

    /// Loads every source and binds the result onto `T`.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        self.build_store()?.bind()
    }
}
