//! Error types for coercion operations.
//!
//! Every variant except [`CoercionError::ContractViolation`] is a soft failure:
//! the dispatcher in [`crate::coercer`] turns it into a "not coercible" result.

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::temporal::TemporalKind;
use crate::value::ValueKind;

/// Errors raised by the individual coercers.
#[derive(Error, Debug)]
pub enum CoercionError {
    /// The input variant is not accepted by the target coercer.
    #[error("cannot coerce {found} to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueKind,
    },

    /// A string did not hold a base-10 integer literal.
    #[error("invalid integer literal: {0:?}")]
    InvalidInteger(String),

    /// A string did not hold a decimal literal.
    #[error("invalid decimal literal: {0:?}")]
    InvalidNumber(String),

    /// A decimal with a non-zero fractional part was coerced to an integer.
    #[error("{0} has a fractional part and cannot be converted to an integer exactly")]
    InexactInteger(BigDecimal),

    /// A string did not match the accepted lexical forms for a temporal type.
    #[error("invalid {kind} {input:?}: {reason}")]
    InvalidTemporal {
        kind: TemporalKind,
        input: String,
        reason: String,
    },

    /// A legacy union could not be narrowed to a single member type.
    #[error("union resolution failed: {0}")]
    Union(String),

    /// A composite value could not be rendered as text.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The string coercer received a value the upstream decoder never produces.
    ///
    /// This is the only error that escapes [`crate::coerce`].
    #[error("contract violation: {found} values are never produced by the decoder")]
    ContractViolation { found: ValueKind },
}

impl CoercionError {
    /// `true` for the loud failure class that must not be downgraded.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, CoercionError::ContractViolation { .. })
    }

    pub(crate) fn invalid_temporal(
        kind: TemporalKind,
        input: &str,
        reason: impl Into<String>,
    ) -> Self {
        CoercionError::InvalidTemporal {
            kind,
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A textual type expression could not be parsed into a [`crate::SchemaType`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type expression: {0}")]
pub struct SchemaParseError(pub String);

/// Convenience alias used throughout coerce-core.
pub type Result<T> = std::result::Result<T, CoercionError>;
