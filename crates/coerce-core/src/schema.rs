//! Schema-declared target types.
//!
//! [`SchemaType`] is a closed set. Legacy unions carry their own resolution rule
//! ([`TypeSelection`]) so the dispatcher never needs outside knowledge to narrow one.
//!
//! Types can also be named textually (used by the `coerce` CLI):
//!
//! ```
//! use coerce_core::SchemaType;
//!
//! let ty: SchemaType = "legacy_union<integer,string>".parse().unwrap();
//! assert!(matches!(ty, SchemaType::Union(ref u) if u.is_legacy_union));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoercionError, Result, SchemaParseError};

/// A schema-declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Boolean,
    Date,
    Integer,
    Number,
    String,
    TimeWithTimezone,
    TimeWithoutTimezone,
    TimestampWithTimezone,
    TimestampWithoutTimezone,
    /// Array with a declared element schema. Elements are never coerced against it.
    Array(Box<FieldType>),
    ArrayWithoutSchema,
    /// Object with declared fields. Fields are never coerced against them.
    Object(BTreeMap<String, FieldType>),
    ObjectWithEmptySchema,
    ObjectWithoutSchema,
    Union(UnionType),
    /// A schema the declaring side could not classify; the raw schema is kept.
    Unknown(serde_json::Value),
}

/// A field or element declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub ty: SchemaType,
    pub nullable: bool,
}

impl FieldType {
    pub fn new(ty: SchemaType, nullable: bool) -> Self {
        Self { ty, nullable }
    }
}

/// A union of member types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub options: Vec<SchemaType>,
    /// Legacy unions must be narrowed to one member before writing.
    pub is_legacy_union: bool,
    pub selection: TypeSelection,
}

/// How a legacy union picks its single member type.
#[derive(Debug, Clone, Copy, Default)]
pub enum TypeSelection {
    /// Most general option wins, see [`SchemaType::generality_rank`].
    #[default]
    Priority,
    /// First declared option wins.
    First,
    /// Caller-supplied rule. Returning `None` fails the resolution.
    Custom(fn(&[SchemaType]) -> Option<&SchemaType>),
}

impl PartialEq for TypeSelection {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeSelection::Priority, TypeSelection::Priority) => true,
            (TypeSelection::First, TypeSelection::First) => true,
            (TypeSelection::Custom(a), TypeSelection::Custom(b)) => std::ptr::fn_addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl UnionType {
    pub fn new(options: Vec<SchemaType>, is_legacy_union: bool) -> Self {
        Self {
            options,
            is_legacy_union,
            selection: TypeSelection::default(),
        }
    }

    pub fn legacy(options: Vec<SchemaType>) -> Self {
        Self::new(options, true)
    }

    pub fn with_selection(mut self, selection: TypeSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Narrow a legacy union to exactly one member type.
    ///
    /// # Errors
    /// Returns `CoercionError::Union` for non-legacy unions, unions without options,
    /// and custom rules that decline to choose.
    pub fn choose_type(&self) -> Result<&SchemaType> {
        if !self.is_legacy_union {
            return Err(CoercionError::Union(
                "only legacy unions can be narrowed".to_string(),
            ));
        }
        let chosen = match self.selection {
            // min_by_key keeps the first of equally ranked options.
            TypeSelection::Priority => self.options.iter().min_by_key(|t| t.generality_rank()),
            TypeSelection::First => self.options.first(),
            TypeSelection::Custom(rule) => rule(&self.options),
        };
        chosen.ok_or_else(|| {
            CoercionError::Union(format!("no member chosen among {} options", self.options.len()))
        })
    }
}

impl SchemaType {
    /// Rank used by [`TypeSelection::Priority`]: lower is more general.
    ///
    /// Anything can be written as a string, arrays and objects hold anything,
    /// and numbers hold integers, so those outrank their narrower siblings.
    pub fn generality_rank(&self) -> u8 {
        match self {
            SchemaType::Array(_) | SchemaType::ArrayWithoutSchema => 0,
            SchemaType::Object(_)
            | SchemaType::ObjectWithEmptySchema
            | SchemaType::ObjectWithoutSchema => 1,
            SchemaType::String => 2,
            SchemaType::Date => 3,
            SchemaType::TimeWithoutTimezone => 4,
            SchemaType::TimeWithTimezone => 5,
            SchemaType::TimestampWithoutTimezone => 6,
            SchemaType::TimestampWithTimezone => 7,
            SchemaType::Number => 8,
            SchemaType::Integer => 9,
            SchemaType::Boolean => 10,
            SchemaType::Unknown(_) => 11,
            SchemaType::Union(_) => 12,
        }
    }

    pub fn unknown() -> Self {
        SchemaType::Unknown(serde_json::Value::Null)
    }

    pub fn array_of(element: SchemaType) -> Self {
        SchemaType::Array(Box::new(FieldType::new(element, true)))
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Boolean => f.write_str("boolean"),
            SchemaType::Date => f.write_str("date"),
            SchemaType::Integer => f.write_str("integer"),
            SchemaType::Number => f.write_str("number"),
            SchemaType::String => f.write_str("string"),
            SchemaType::TimeWithTimezone => f.write_str("time_tz"),
            SchemaType::TimeWithoutTimezone => f.write_str("time_ntz"),
            SchemaType::TimestampWithTimezone => f.write_str("timestamp_tz"),
            SchemaType::TimestampWithoutTimezone => f.write_str("timestamp_ntz"),
            SchemaType::Array(items) => write!(f, "array<{}>", items.ty),
            SchemaType::ArrayWithoutSchema => f.write_str("array"),
            SchemaType::Object(_) | SchemaType::ObjectWithEmptySchema => f.write_str("object{..}"),
            SchemaType::ObjectWithoutSchema => f.write_str("object"),
            SchemaType::Union(union) => {
                let name = if union.is_legacy_union { "legacy_union" } else { "union" };
                write!(f, "{name}<")?;
                for (i, option) in union.options.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{option}")?;
                }
                f.write_str(">")
            }
            SchemaType::Unknown(_) => f.write_str("unknown"),
        }
    }
}

impl FromStr for SchemaType {
    type Err = SchemaParseError;

    /// Parse a type expression such as `integer`, `array<date>` or
    /// `legacy_union<integer,string>`. Whitespace around names is ignored.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (name, args) = match s.find('<') {
            Some(open) => {
                let inner = s[open + 1..]
                    .strip_suffix('>')
                    .ok_or_else(|| SchemaParseError(format!("missing closing '>' in {s:?}")))?;
                (s[..open].trim(), Some(split_type_args(inner)?))
            }
            None => (s, None),
        };

        let ty = match (name, args) {
            ("boolean" | "bool", None) => SchemaType::Boolean,
            ("date", None) => SchemaType::Date,
            ("integer" | "int", None) => SchemaType::Integer,
            ("number", None) => SchemaType::Number,
            ("string", None) => SchemaType::String,
            ("time_tz" | "time_with_timezone", None) => SchemaType::TimeWithTimezone,
            ("time_ntz" | "time_without_timezone", None) => SchemaType::TimeWithoutTimezone,
            ("timestamp_tz" | "timestamp_with_timezone", None) => {
                SchemaType::TimestampWithTimezone
            }
            ("timestamp_ntz" | "timestamp_without_timezone", None) => {
                SchemaType::TimestampWithoutTimezone
            }
            ("array", None) => SchemaType::ArrayWithoutSchema,
            ("array", Some(mut args)) if args.len() == 1 => {
                SchemaType::array_of(args.remove(0))
            }
            ("object", None) => SchemaType::ObjectWithoutSchema,
            ("unknown", None) => SchemaType::unknown(),
            ("union", Some(args)) => SchemaType::Union(UnionType::new(args, false)),
            ("legacy_union", Some(args)) => SchemaType::Union(UnionType::legacy(args)),
            (name, Some(_)) => {
                return Err(SchemaParseError(format!(
                    "type {name:?} does not take this many parameters"
                )))
            }
            (name, None) => return Err(SchemaParseError(format!("unknown type name {name:?}"))),
        };
        Ok(ty)
    }
}

/// Split `a,b<c,d>,e` on top-level commas and parse each piece.
fn split_type_args(inner: &str) -> std::result::Result<Vec<SchemaType>, SchemaParseError> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SchemaParseError(format!("unbalanced '>' in {inner:?}")))?;
            }
            ',' if depth == 0 => {
                args.push(inner[start..i].parse()?);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SchemaParseError(format!("unbalanced '<' in {inner:?}")));
    }
    if inner[start..].trim().is_empty() {
        if args.is_empty() {
            return Ok(args);
        }
        return Err(SchemaParseError(format!("trailing ',' in {inner:?}")));
    }
    args.push(inner[start..].parse()?);
    Ok(args)
}
