//! Conversion rules from external text (or a decoded document node) into
//! typed field values.
//!
//! Every bindable type implements [`Bind`]. Scalars parse text; records and
//! sequences accept a structured value, either as an already-decoded node or
//! as JSON text that is decoded first. A failed conversion never writes a
//! partial value.

use std::fmt;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use tracing::debug;

use super::BindError;

/// A decoded structured value (JSON object, array or scalar).
pub type Node = serde_json::Value;

/// Maximum record/sequence nesting followed by a single walk.
pub const MAX_DEPTH: usize = 64;

/// Type tag of a bindable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int(u32),
    Uint(u32),
    Float(u32),
    Bool,
    String,
    Record,
    Sequence,
    Optional,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(bits) => write!(f, "i{bits}"),
            Self::Uint(bits) => write!(f, "u{bits}"),
            Self::Float(bits) => write!(f, "f{bits}"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Record => f.write_str("record"),
            Self::Sequence => f.write_str("sequence"),
            Self::Optional => f.write_str("optional"),
        }
    }
}

/// How failures below the current level are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Best-effort: a failing field or element is logged and left as it was.
    Overlay,
    /// Strict: the first failure is returned with its field path.
    Decode,
}

/// How a document key is compared with field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Exact,
    /// ASCII case-insensitive.
    Insensitive,
}

impl Case {
    pub fn matches(self, name: &str, key: &str) -> bool {
        match self {
            Self::Exact => name == key,
            Self::Insensitive => name.eq_ignore_ascii_case(key),
        }
    }
}

/// State carried down a single binding walk.
#[derive(Debug, Clone, Copy)]
pub struct Walk {
    mode: Mode,
    depth: usize,
}

impl Walk {
    pub fn overlay() -> Self {
        Self {
            mode: Mode::Overlay,
            depth: 0,
        }
    }

    pub fn decode() -> Self {
        Self {
            mode: Mode::Decode,
            depth: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Steps one level into a record or sequence.
    pub fn descend(self) -> Result<Self, BindError> {
        if self.depth >= MAX_DEPTH {
            return Err(BindError::TooDeep(MAX_DEPTH));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }

    /// Applies the walk's failure policy to the result of binding one child.
    ///
    /// In overlay mode the error is logged and swallowed; in decode mode it is
    /// wrapped by `locate` and returned.
    pub(crate) fn settle(
        self,
        result: Result<(), BindError>,
        locate: impl FnOnce(BindError) -> BindError,
    ) -> Result<(), BindError> {
        match (result, self.mode) {
            (Ok(()), _) => Ok(()),
            (Err(e), Mode::Decode) => Err(locate(e)),
            (Err(e), Mode::Overlay) => {
                let e = locate(e);
                debug!(depth = self.depth, error = %e, "nested value left unchanged");
                Ok(())
            }
        }
    }
}

/// A value that can be assigned from external configuration input.
pub trait Bind {
    /// Type tag of this value.
    fn kind(&self) -> FieldKind;

    /// Converts `text` and assigns it. On error `self` is unchanged.
    fn bind_text(&mut self, text: &str, walk: Walk) -> Result<(), BindError>;

    /// Assigns a decoded document node.
    ///
    /// The default feeds scalars through [`bind_text`](Self::bind_text) using
    /// their canonical rendering and rejects objects and arrays.
    fn bind_node(&mut self, node: &Node, walk: Walk) -> Result<(), BindError> {
        match node {
            Node::Null => Err(BindError::Null),
            Node::String(s) => self.bind_text(s, walk),
            Node::Number(n) => self.bind_text(&render_number(n), walk),
            Node::Bool(b) => self.bind_text(if *b { "true" } else { "false" }, walk),
            Node::Array(_) | Node::Object(_) => Err(BindError::Unexpected {
                expected: "a scalar",
                found: describe(node),
            }),
        }
    }

    /// Binds `key` of an object into a field promoted from this value.
    ///
    /// Only records have promotable fields; everything else returns `None`.
    fn bind_entry(
        &mut self,
        key: &str,
        value: &Node,
        walk: Walk,
        case: Case,
    ) -> Option<Result<(), BindError>> {
        let _ = (key, value, walk, case);
        None
    }
}

/// Canonical text of a document number. Floats with no fractional part
/// render without one, so `123.0` binds into integer fields.
fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

/// Short name of a node's shape, for error messages.
pub(crate) fn describe(node: &Node) -> &'static str {
    match node {
        Node::Null => "null",
        Node::Bool(_) => "a boolean",
        Node::Number(_) => "a number",
        Node::String(_) => "a string",
        Node::Array(_) => "an array",
        Node::Object(_) => "an object",
    }
}

fn parse_int<T>(text: &str, kind: FieldKind) -> Result<T, BindError>
where
    T: FromStr<Err = ParseIntError>,
{
    text.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => BindError::Overflow {
            kind,
            value: text.to_string(),
        },
        _ => BindError::Parse {
            kind,
            value: text.to_string(),
        },
    })
}

macro_rules! bind_int {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn kind(&self) -> FieldKind {
                    FieldKind::$kind(<$ty>::BITS)
                }

                fn bind_text(&mut self, text: &str, _walk: Walk) -> Result<(), BindError> {
                    *self = parse_int::<$ty>(text, self.kind())?;
                    Ok(())
                }
            }
        )*
    };
}

bind_int! {
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    isize => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    usize => Uint,
}

/// Spelled-out infinities are accepted; an infinity produced by rounding a
/// finite literal is an overflow of the destination width.
fn is_explicit_infinity(text: &str) -> bool {
    let unsigned = text.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

macro_rules! bind_float {
    ($($ty:ty => $bits:expr),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn kind(&self) -> FieldKind {
                    FieldKind::Float($bits)
                }

                fn bind_text(&mut self, text: &str, _walk: Walk) -> Result<(), BindError> {
                    let kind = self.kind();
                    let value = text.parse::<$ty>().map_err(|_| BindError::Parse {
                        kind,
                        value: text.to_string(),
                    })?;
                    if value.is_infinite() && !is_explicit_infinity(text) {
                        return Err(BindError::Overflow {
                            kind,
                            value: text.to_string(),
                        });
                    }
                    *self = value;
                    Ok(())
                }
            }
        )*
    };
}

bind_float! {
    f32 => 32,
    f64 => 64,
}

/// Literal boolean forms: `1 t T TRUE true True` and their false counterparts.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl Bind for bool {
    fn kind(&self) -> FieldKind {
        FieldKind::Bool
    }

    fn bind_text(&mut self, text: &str, _walk: Walk) -> Result<(), BindError> {
        *self = parse_bool(text).ok_or_else(|| BindError::Parse {
            kind: FieldKind::Bool,
            value: text.to_string(),
        })?;
        Ok(())
    }
}

impl Bind for String {
    fn kind(&self) -> FieldKind {
        FieldKind::String
    }

    fn bind_text(&mut self, text: &str, _walk: Walk) -> Result<(), BindError> {
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

impl<T: Bind + Default> Bind for Vec<T> {
    fn kind(&self) -> FieldKind {
        FieldKind::Sequence
    }

    fn bind_text(&mut self, text: &str, walk: Walk) -> Result<(), BindError> {
        let node: Node = serde_json::from_str(text)?;
        if !node.is_array() {
            return Err(BindError::Unexpected {
                expected: "an array",
                found: describe(&node),
            });
        }
        self.bind_node(&node, walk)
    }

    /// Replaces the sequence with one element per array item.
    fn bind_node(&mut self, node: &Node, walk: Walk) -> Result<(), BindError> {
        let items = match node {
            Node::Array(items) => items,
            Node::String(text) => return self.bind_text(text, walk),
            other => {
                return Err(BindError::Unexpected {
                    expected: "an array",
                    found: describe(other),
                })
            }
        };

        let walk = walk.descend()?;
        let mut sequence = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let mut element = T::default();
            walk.settle(element.bind_node(item, walk), |e| e.in_element(index))?;
            sequence.push(element);
        }

        *self = sequence;
        Ok(())
    }
}

impl<T: Bind + Default> Bind for Option<T> {
    fn kind(&self) -> FieldKind {
        FieldKind::Optional
    }

    fn bind_text(&mut self, text: &str, walk: Walk) -> Result<(), BindError> {
        match self {
            Some(inner) => inner.bind_text(text, walk),
            None => {
                let mut inner = T::default();
                inner.bind_text(text, walk)?;
                *self = Some(inner);
                Ok(())
            }
        }
    }

    /// `null` clears the option.
    fn bind_node(&mut self, node: &Node, walk: Walk) -> Result<(), BindError> {
        if node.is_null() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.bind_node(node, walk),
            None => {
                let mut inner = T::default();
                inner.bind_node(node, walk)?;
                *self = Some(inner);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind<T: Bind>(target: &mut T, text: &str) -> Result<(), BindError> {
        target.bind_text(text, Walk::overlay())
    }

    #[test]
    fn test_signed_integers() {
        let mut a = 0i16;
        let mut b = 0i32;
        let mut c = 0i64;
        let mut d = 0isize;
        bind(&mut a, "-123").unwrap();
        bind(&mut b, "+123").unwrap();
        bind(&mut c, "9223372036854775807").unwrap();
        bind(&mut d, "42").unwrap();
        assert_eq!((a, b, c, d), (-123, 123, i64::MAX, 42));
    }

    #[test]
    fn test_integer_overflow_leaves_value() {
        let mut port = 8080u16;
        let result = bind(&mut port, "70000");
        assert!(matches!(result, Err(BindError::Overflow { .. })));
        assert_eq!(port, 8080);

        let mut small = 7i8;
        assert!(bind(&mut small, "-129").is_err());
        assert_eq!(small, 7);
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        let mut value = 5u32;
        let result = bind(&mut value, "-1");
        assert!(matches!(result, Err(BindError::Parse { .. })));
        assert_eq!(value, 5);
    }

    #[test]
    fn test_malformed_integer() {
        let mut id = 0i64;
        assert!(matches!(bind(&mut id, "abc"), Err(BindError::Parse { .. })));
        assert!(bind(&mut id, "12.5").is_err());
        assert!(bind(&mut id, " 12").is_err());
        assert_eq!(id, 0);
    }

    #[test]
    fn test_bool_literals() {
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            let mut flag = false;
            bind(&mut flag, text).unwrap();
            assert!(flag, "{text} should be true");
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            let mut flag = true;
            bind(&mut flag, text).unwrap();
            assert!(!flag, "{text} should be false");
        }

        let mut flag = true;
        assert!(bind(&mut flag, "yes").is_err());
        assert!(bind(&mut flag, "tRuE").is_err());
        assert!(flag);
    }

    #[test]
    fn test_floats() {
        let mut a = 0f32;
        let mut b = 0f64;
        bind(&mut a, "123.123").unwrap();
        bind(&mut b, "-1.5e3").unwrap();
        assert!((a - 123.123).abs() < 1e-4);
        assert_eq!(b, -1500.0);
    }

    #[test]
    fn test_float_width_overflow() {
        let mut narrow = 1.0f32;
        assert!(matches!(
            bind(&mut narrow, "3.5e39"),
            Err(BindError::Overflow { .. })
        ));
        assert_eq!(narrow, 1.0);

        let mut wide = 0f64;
        bind(&mut wide, "3.5e39").unwrap();
        assert!(bind(&mut wide, "1e400").is_err());
        assert_eq!(wide, 3.5e39);

        bind(&mut narrow, "-inf").unwrap();
        assert_eq!(narrow, f32::NEG_INFINITY);
    }

    #[test]
    fn test_string_verbatim() {
        let mut name = String::from("old");
        bind(&mut name, "  spaced [1,2] ").unwrap();
        assert_eq!(name, "  spaced [1,2] ");
    }

    #[test]
    fn test_scalar_sequence() {
        let mut values: Vec<i32> = vec![9];
        bind(&mut values, "[1,2,3]").unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_string_sequence_unquoted() {
        let mut names: Vec<String> = Vec::new();
        bind(&mut names, r#"["a", "b c", 3]"#).unwrap();
        assert_eq!(names, vec!["a", "b c", "3"]);
    }

    #[test]
    fn test_malformed_sequence_leaves_value() {
        let mut values = vec![1u8, 2];
        assert!(matches!(bind(&mut values, "[1,2"), Err(BindError::Malformed(_))));
        assert!(matches!(
            bind(&mut values, r#"{"a":1}"#),
            Err(BindError::Unexpected { .. })
        ));
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_sequence_element_failure_overlay_vs_decode() {
        let mut values = vec![7u16];
        bind(&mut values, r#"[1,"x",70000,4]"#).unwrap();
        assert_eq!(values, vec![1, 0, 0, 4]);

        let mut strict = vec![7u16];
        let result = strict.bind_text(r#"[1,"x"]"#, Walk::decode());
        assert!(matches!(result, Err(BindError::Element { index: 1, .. })));
        assert_eq!(strict, vec![7]);
    }

    #[test]
    fn test_nested_sequences() {
        let mut grid: Vec<Vec<u8>> = Vec::new();
        grid.bind_node(&json!([[1, 2], [3]]), Walk::decode()).unwrap();
        assert_eq!(grid, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_option() {
        let mut timeout: Option<u64> = None;
        bind(&mut timeout, "30").unwrap();
        assert_eq!(timeout, Some(30));

        let mut missing: Option<u64> = None;
        assert!(bind(&mut missing, "soon").is_err());
        assert_eq!(missing, None);

        timeout.bind_node(&Node::Null, Walk::decode()).unwrap();
        assert_eq!(timeout, None);
    }

    #[test]
    fn test_node_scalars_render_canonically() {
        let mut port = 0u16;
        let mut ratio = 0f64;
        let mut flag = false;
        let mut label = String::new();
        port.bind_node(&json!(8443), Walk::decode()).unwrap();
        ratio.bind_node(&json!(0.25), Walk::decode()).unwrap();
        flag.bind_node(&json!(true), Walk::decode()).unwrap();
        label.bind_node(&json!(123), Walk::decode()).unwrap();
        assert_eq!((port, ratio, flag, label.as_str()), (8443, 0.25, true, "123"));

        assert!(matches!(port.bind_node(&Node::Null, Walk::decode()), Err(BindError::Null)));
        assert!(matches!(
            port.bind_node(&json!([1]), Walk::decode()),
            Err(BindError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_integral_float_binds_integer() {
        let mut number = 0i32;
        number.bind_node(&json!(123.0), Walk::decode()).unwrap();
        assert_eq!(number, 123);

        let mut label = String::new();
        label.bind_node(&json!(-4.0), Walk::decode()).unwrap();
        assert_eq!(label, "-4");

        assert!(number.bind_node(&json!(1.5), Walk::decode()).is_err());
        assert_eq!(number, 123);

        let mut ratio = 0f64;
        ratio.bind_node(&json!(2.5), Walk::decode()).unwrap();
        assert_eq!(ratio, 2.5);
    }

    #[test]
    fn test_depth_guard() {
        let mut walk = Walk::overlay();
        for _ in 0..MAX_DEPTH {
            walk = walk.descend().unwrap();
        }
        assert_eq!(walk.depth(), MAX_DEPTH);
        assert!(matches!(walk.descend(), Err(BindError::TooDeep(_))));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(0i32.kind().to_string(), "i32");
        assert_eq!(0usize.kind(), FieldKind::Uint(usize::BITS));
        assert_eq!(0f32.kind().to_string(), "f32");
        assert_eq!(Vec::<bool>::new().kind(), FieldKind::Sequence);
    }
}
