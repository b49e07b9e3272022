//! Field descriptor tables and the walks that drive them.

use tracing::{debug, trace};

use super::bind::{describe, Bind, Case, Mode, Node, Walk};
use super::lookup::Lookup;
use super::BindError;

/// Descriptor of one named field of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Declared name. Default lookup key and match key inside documents.
    pub name: &'static str,
    /// Explicit lookup key overriding `name`.
    pub key: Option<&'static str>,
    /// Embedded fields have no key identity of their own and are never bound.
    pub embedded: bool,
}

impl Field {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            embedded: false,
        }
    }

    pub const fn keyed(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            key: Some(key),
            embedded: false,
        }
    }

    pub const fn embedded(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            embedded: true,
        }
    }

    /// The external key for this field: the override if present and
    /// non-empty, otherwise the declared name.
    pub fn lookup_key(&self) -> &'static str {
        match self.key {
            Some(key) if !key.is_empty() => key,
            _ => self.name,
        }
    }
}

/// A structured value whose fields can be walked by name.
///
/// Usually derived with `#[derive(Record)]`; a hand-written impl lists its
/// fields in declaration order and returns a mutable accessor per index.
pub trait Record: Bind {
    /// Fields visible to the engine, in declaration order.
    fn fields() -> &'static [Field];

    /// Accessor for the field at `index` in [`fields`](Self::fields).
    ///
    /// Returns `None` for out-of-range indices.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Bind>;
}

/// Position of the non-embedded field matching `key`.
fn find_field(fields: &[Field], key: &str, case: Case) -> Option<usize> {
    fields
        .iter()
        .position(|field| !field.embedded && case.matches(field.name, key))
}

/// Decodes `text` as a JSON object and binds it into `record`.
pub fn bind_record_text<R: Record>(record: &mut R, text: &str, walk: Walk) -> Result<(), BindError> {
    let node: Node = serde_json::from_str(text)?;
    if !node.is_object() {
        return Err(BindError::Unexpected {
            expected: "an object",
            found: describe(&node),
        });
    }
    bind_record_node(record, &node, walk)
}

/// Binds each key of an object node into the sub-field of the same name.
///
/// Unknown keys are ignored. A string node is decoded as JSON text first.
pub fn bind_record_node<R: Record>(record: &mut R, node: &Node, walk: Walk) -> Result<(), BindError> {
    let map = match node {
        Node::Object(map) => map,
        Node::String(text) => return bind_record_text(record, text, walk),
        other => {
            return Err(BindError::Unexpected {
                expected: "an object",
                found: describe(other),
            })
        }
    };

    let walk = walk.descend()?;
    for (key, value) in map {
        let bound = bind_record_entry(record, key, value, walk, Case::Exact).or_else(|| {
            match walk.mode() {
                Mode::Decode => bind_record_entry(record, key, value, walk, Case::Insensitive),
                Mode::Overlay => None,
            }
        });
        match bound {
            Some(result) => result?,
            None => trace!(key = %key, "no field for key"),
        }
    }

    Ok(())
}

/// Binds one `key` of an object into `record`, comparing names with `case`.
///
/// Own fields are matched first. In decode mode a key with no own field is
/// offered to the embedded fields in declaration order, so their fields read
/// as if declared on `record`. Returns `None` when nothing takes the key.
pub fn bind_record_entry<R: Record>(
    record: &mut R,
    key: &str,
    value: &Node,
    walk: Walk,
    case: Case,
) -> Option<Result<(), BindError>> {
    let fields = R::fields();
    if let Some(index) = find_field(fields, key, case) {
        let name = fields[index].name;
        let slot = record.field_mut(index)?;
        return Some(walk.settle(slot.bind_node(value, walk), |e| e.in_field(name)));
    }

    if walk.mode() != Mode::Decode {
        return None;
    }
    for (index, field) in fields.iter().enumerate() {
        if !field.embedded {
            continue;
        }
        let Some(slot) = record.field_mut(index) else {
            continue;
        };
        if let Some(result) = slot.bind_entry(key, value, walk, case) {
            return Some(result.map_err(|e| e.in_field(field.name)));
        }
    }
    None
}

/// Overlays `record` from `lookup`, best-effort.
///
/// Each field is looked up by its key; a missing or empty value leaves the
/// field as it is, and so does a value that fails to convert. Records and
/// sequences read their whole value from the field's own key as JSON text.
/// Embedded fields are skipped.
pub fn overlay<R, L>(record: &mut R, lookup: &L)
where
    R: Record,
    L: Lookup + ?Sized,
{
    let walk = Walk::overlay();

    for (index, field) in R::fields().iter().enumerate() {
        if field.embedded {
            continue;
        }
        let key = field.lookup_key();
        let Some(value) = lookup.lookup(key).filter(|value| !value.is_empty()) else {
            continue;
        };
        let Some(slot) = record.field_mut(index) else {
            continue;
        };

        match slot.bind_text(&value, walk) {
            Ok(()) => trace!(key, field = field.name, "field overlaid"),
            Err(e) => debug!(
                key,
                field = field.name,
                kind = %slot.kind(),
                error = %e,
                "value not convertible, field left unchanged"
            ),
        }
    }
}

/// Binds a decoded document into `record`, failing on the first value that
/// does not convert.
///
/// The document is bound into a scratch default first; `record` is written
/// only once that pass succeeds, so a failure leaves it as it was.
pub(crate) fn decode_document<R: Record + Default>(
    record: &mut R,
    document: &Node,
) -> Result<(), BindError> {
    bind_record_node(&mut R::default(), document, Walk::decode())?;
    bind_record_node(record, document, Walk::decode())
}
