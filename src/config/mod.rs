//! Configuration loading: a file step followed by a key/value overlay.

mod bind;
mod builder;
mod cache;
mod error;
mod file;
mod lookup;
mod record;

pub use bind::{Bind, Case, FieldKind, Mode, Node, Walk, MAX_DEPTH};
pub use builder::{get_config, Config};
pub use cache::ConfigCache;
pub use error::{BindError, ConfigError, SyntaxError};
pub use file::{load_file, Format};
pub use lookup::{prefix_for_path, Env, Lookup, Prefixed};
pub use record::{bind_record_entry, bind_record_node, bind_record_text, overlay, Field, Record};
