use crate::value::{Float64, Value, ValueKind};
use thiserror::Error as ThisError;

///
/// ValueConversionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValueConversionError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: ValueKind,
    },

    #[error("value {value} does not fit into {target}")]
    OutOfRange { target: &'static str, value: String },
}

///
/// FieldValue
///
/// Rust types that can be stored in a column. `KIND` is the declared column
/// kind used by typed column handles.
///

pub trait FieldValue {
    const KIND: ValueKind;

    fn to_value(&self) -> Value;
}

///
/// FromValue
///
/// Decoding half of projections: turn one projected cell back into a Rust
/// value. Integer targets accept floats by truncating toward zero, which is
/// how `avg` results land in integer fields.
///

pub trait FromValue: Sized {
    /// Whether a statically known value kind can bind to this type.
    fn accepts(kind: ValueKind) -> bool;

    fn from_value(value: Value) -> Result<Self, ValueConversionError>;
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FieldValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }
}

impl FieldValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(Float64::new(*self))
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }
}

const fn mismatch(expected: &'static str, value: &Value) -> ValueConversionError {
    ValueConversionError::Mismatch {
        expected,
        found: value.kind(),
    }
}

// 2^63, the first float outside the i64 range.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[allow(clippy::cast_possible_truncation)]
fn truncate_float(target: &'static str, float: f64) -> Result<i64, ValueConversionError> {
    let truncated = float.trunc();
    if truncated.is_finite() && (-I64_BOUND..I64_BOUND).contains(&truncated) {
        Ok(truncated as i64)
    } else {
        Err(ValueConversionError::OutOfRange {
            target,
            value: float.to_string(),
        })
    }
}

impl FromValue for bool {
    fn accepts(kind: ValueKind) -> bool {
        kind == ValueKind::Bool
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for i64 {
    fn accepts(kind: ValueKind) -> bool {
        kind.is_numeric()
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Float(v) => truncate_float("i64", v.get()),
            other => Err(mismatch("i64", &other)),
        }
    }
}

impl FromValue for i32 {
    fn accepts(kind: ValueKind) -> bool {
        kind.is_numeric()
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        let wide = match value {
            Value::Int(v) => v,
            Value::Float(v) => truncate_float("i32", v.get())?,
            other => return Err(mismatch("i32", &other)),
        };

        Self::try_from(wide).map_err(|_| ValueConversionError::OutOfRange {
            target: "i32",
            value: wide.to_string(),
        })
    }
}

impl FromValue for f64 {
    fn accepts(kind: ValueKind) -> bool {
        kind.is_numeric()
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        value.as_f64().ok_or_else(|| mismatch("f64", &value))
    }
}

impl FromValue for String {
    fn accepts(kind: ValueKind) -> bool {
        kind == ValueKind::Text
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl FromValue for Value {
    fn accepts(_: ValueKind) -> bool {
        true
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn accepts(kind: ValueKind) -> bool {
        kind == ValueKind::Null || T::accepts(kind)
    }

    fn from_value(value: Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
