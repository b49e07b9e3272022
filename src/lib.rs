//! Populate a typed configuration record from a JSON/YAML file, then
//! overlay values from environment variables.
//!
//! ```no_run
//! use confbind::{get_config, Record};
//!
//! #[derive(Debug, Default, Record)]
//! #[env(rename_all = "PascalCase")]
//! struct Settings {
//!     port: u16,
//!     #[env(key = "DATABASE_URL")]
//!     connection_string: String,
//!     hosts: Vec<String>,
//! }
//!
//! let mut settings = Settings::default();
//! get_config("config/settings.yaml", &mut settings)?;
//! # Ok::<(), confbind::ConfigError>(())
//! ```

extern crate self as confbind;

pub mod config;

pub use config::{
    bind_record_entry, bind_record_node, bind_record_text, get_config, load_file, overlay,
    prefix_for_path, Bind, BindError, Case, Config, ConfigCache, ConfigError, Env, Field,
    FieldKind, Format, Lookup, Mode, Node, Prefixed, Record, SyntaxError, Walk, MAX_DEPTH,
};
pub use confbind_macros::Record;
