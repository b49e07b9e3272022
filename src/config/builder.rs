use std::path::{Path, PathBuf};

use super::file::{load_file, Format};
use super::lookup::{prefix_for_path, Env, Lookup, Prefixed};
use super::record::{overlay, Record};
use super::ConfigError;

/// How lookup keys are prefixed before the overlay queries its source.
#[derive(Debug, Clone, Default)]
enum KeyPrefix {
    #[default]
    None,
    FromFile,
    Fixed(String),
}

/// Builder for populating a record from a config file, then from a
/// key/value source.
///
/// The file is applied first. The source (the process environment unless
/// replaced) is overlaid second, so a non-empty variable always wins over the
/// file. If the file step fails, no overlay happens.
///
/// ## Example
///
/// ```no_run
/// use confbind::{Config, Format, Record};
///
/// #[derive(Default, Record)]
/// #[env(rename_all = "PascalCase")]
/// struct Settings {
///     port: u16,
///     #[env(key = "DATABASE_URL")]
///     connection_string: String,
/// }
///
/// let settings: Settings = Config::builder()
///     .with_file("config/settings.json")
///     .with_format(Format::Json)
///     .load()?;
/// # Ok::<(), confbind::ConfigError>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .load() or .load_into() is called"]
pub struct Config<L = Env> {
    file: Option<PathBuf>,
    format: Format,
    lookup: Option<L>,
    prefix: KeyPrefix,
}

impl Config<Env> {
    /// Creates a builder with no file and the process environment as source.
    pub fn builder() -> Self {
        Self {
            file: None,
            format: Format::default(),
            lookup: Some(Env),
            prefix: KeyPrefix::None,
        }
    }
}

impl Default for Config<Env> {
    fn default() -> Self {
        Self::builder()
    }
}

impl<L: Lookup> Config<L> {
    /// Sets the config file. An empty path skips the file step.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the document format of the config file.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Replaces the overlay source.
    pub fn with_lookup<M: Lookup>(self, lookup: M) -> Config<M> {
        Config {
            file: self.file,
            format: self.format,
            lookup: Some(lookup),
            prefix: self.prefix,
        }
    }

    /// Prefixes every lookup key with the upper-cased file stem and `_`,
    /// so `example.json` reads `Port` from `EXAMPLE_Port`.
    pub fn with_file_prefix(mut self) -> Self {
        self.prefix = KeyPrefix::FromFile;
        self
    }

    /// Prefixes every lookup key with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = KeyPrefix::Fixed(prefix.into());
        self
    }

    /// Skips the overlay step entirely.
    pub fn without_env(mut self) -> Self {
        self.lookup = None;
        self
    }

    /// Populates `target` in place: file first, then the overlay.
    ///
    /// A failed file step leaves `target` exactly as it was.
    pub fn load_into<T: Record + Default>(&self, target: &mut T) -> Result<(), ConfigError> {
        let path = self.file.as_deref().unwrap_or_else(|| Path::new(""));
        load_file(path, self.format, target)?;

        let Some(lookup) = &self.lookup else {
            return Ok(());
        };
        let prefix = match &self.prefix {
            KeyPrefix::None => None,
            KeyPrefix::FromFile => Some(prefix_for_path(path)),
            KeyPrefix::Fixed(prefix) => Some(prefix.clone()),
        };
        match prefix {
            Some(prefix) => overlay(target, &Prefixed::new(prefix, |key: &str| lookup.lookup(key))),
            None => overlay(target, lookup),
        }
        Ok(())
    }

    /// Builds a fresh `T` from its default and populates it.
    pub fn load<T: Record + Default>(&self) -> Result<T, ConfigError> {
        let mut target = T::default();
        self.load_into(&mut target)?;
        Ok(target)
    }
}

/// Populates `target` from the YAML/JSON file at `path`, then from the
/// process environment.
///
/// An empty `path` skips the file step. Environment variables are looked up
/// by each field's key without any prefix.
pub fn get_config<T: Record + Default>(path: impl AsRef<Path>, target: &mut T) -> Result<(), ConfigError> {
    Config::builder().with_file(path).load_into(target)
}
