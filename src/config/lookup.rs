//! Key/value sources the overlay reads from.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::Path;

/// A read-only `key -> value` source, usually the process environment.
pub trait Lookup {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The process environment. Unset and non-UTF-8 variables are absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Env;

impl Lookup for Env {
    fn lookup(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> Lookup for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Lookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Looks every key up as `{prefix}{key}` in the wrapped source.
#[derive(Debug, Clone)]
pub struct Prefixed<L> {
    prefix: String,
    inner: L,
}

impl<L> Prefixed<L> {
    pub fn new(prefix: impl Into<String>, inner: L) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    /// Uses the prefix derived from a config file name, see [`prefix_for_path`].
    pub fn from_path(path: impl AsRef<Path>, inner: L) -> Self {
        Self::new(prefix_for_path(path), inner)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<L: Lookup> Lookup for Prefixed<L> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.inner.lookup(&format!("{}{}", self.prefix, key))
    }
}

/// Upper-cased file stem followed by `_`, e.g. `./_config/example.json`
/// gives `EXAMPLE_`. An empty path gives an empty prefix.
pub fn prefix_for_path(path: impl AsRef<Path>) -> String {
    match path.as_ref().file_stem() {
        Some(stem) => format!("{}_", stem.to_string_lossy().to_uppercase()),
        None => String::new(),
    }
}
