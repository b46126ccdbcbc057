//! # coerce-core
//!
//! Schema-driven value coercion for load pipelines.
//!
//! A decoder turns raw input (JSON, say) into a loosely-typed [`Value`]. A sink
//! needs every field typed exactly as its schema declares. This crate sits in
//! between: [`coerce`] takes a value and a [`SchemaType`] and returns a value of
//! that type, or `None` when no safe conversion exists.
//!
//! The rules are fixed policy, not configuration:
//!
//! - numbers widen from integers, integers narrow from numbers only when exact,
//!   and both parse from strings;
//! - anything the decoder produces can be written as a string;
//! - dates, times and timestamps parse from several textual forms, and a missing
//!   zone means UTC;
//! - arrays and objects pass through without touching their elements;
//! - legacy unions are narrowed to one member type by the union's own rule.
//!
//! ## Quick start
//!
//! ```rust
//! use coerce_core::{coerce, json, SchemaType, Value};
//!
//! let value = json::parse_str(r#""2023/01/15""#).unwrap();
//! let date = coerce(&value, &SchemaType::Date, false).unwrap().unwrap();
//! assert_eq!(json::serialize_to_string(&date).unwrap(), r#""2023-01-15""#);
//!
//! // Fractional numbers never narrow to integers.
//! let n = json::parse_str("3.5").unwrap();
//! assert_eq!(coerce(&n, &SchemaType::Integer, false).unwrap(), None);
//! ```
//!
//! ## Modules
//!
//! - [`coercer`]: dispatcher, scalar and structural coercers
//! - [`temporal`]: date/time/timestamp coercers
//! - [`schema`]: target types and legacy-union resolution
//! - [`value`]: the decoded value model
//! - [`json`]: JSON decoder and serializer around the coercer
//! - [`error`]: error types

pub mod coercer;
pub mod error;
pub mod json;
pub mod schema;
pub mod temporal;
mod temporal_format;
pub mod value;

pub use coercer::{coerce, coerce_or_null};
pub use error::{CoercionError, SchemaParseError};
pub use schema::{FieldType, SchemaType, TypeSelection, UnionType};
pub use temporal::TemporalKind;
pub use value::{OffsetTime, Value, ValueKind};
