//! File-based configuration source.

use std::path::Path;

use tracing::{debug, trace};

use super::bind::Node;
use super::error::SyntaxError;
use super::record::{decode_document, Record};
use super::ConfigError;

/// Document format of a config file.
///
/// Chosen by the caller, never guessed from the file extension. YAML is the
/// default since it also accepts JSON documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    #[default]
    Yaml,
}

/// Loads `path` into `target`.
///
/// An empty path is a no-op. Keys of the document are matched against the
/// record's field names, and the fields of embedded records are matched as
/// if declared on the record itself. Fields the document does not mention
/// keep their current value; on any error `target` is left untouched.
pub fn load_file<T: Record + Default>(
    path: impl AsRef<Path>,
    format: Format,
    target: &mut T,
) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        trace!("no config file given, skipping file step");
        return Ok(());
    }

    let contents = read_config_file(path)?;
    let document = parse_document(&contents, format).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let Some(document) = document else {
        debug!(path = %path.display(), "config file is empty");
        return Ok(());
    };
    if !document.is_object() {
        return Err(ConfigError::NotAMapping(path.to_path_buf()));
    }

    decode_document(target, &document).map_err(|e| ConfigError::DecodeError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), ?format, "loaded config file");
    Ok(())
}

fn read_config_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Returns `None` for a YAML file with no document in it.
fn parse_document(contents: &[u8], format: Format) -> Result<Option<Node>, SyntaxError> {
    match format {
        Format::Json => Ok(Some(serde_json::from_slice(contents)?)),
        Format::Yaml => {
            if contents.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            let node: Node = serde_yaml::from_slice(contents)?;
            Ok((!node.is_null()).then_some(node))
        }
    }
}
