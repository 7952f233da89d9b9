//! Typed reads out of a [`Value`].
//!
//! [`FromValue`] is how a [`Prop<T>`](crate::Prop) turns whatever a binding
//! produced into its declared type. An exact variant match is returned as is;
//! otherwise a small set of lossless-enough conversions is attempted:
//!
//! | target        | accepted                                              |
//! |---------------|-------------------------------------------------------|
//! | integers      | `Int` in range, integral `Float`, numeric `Str`       |
//! | `f32` / `f64` | `Int`, `Float`, numeric `Str`                         |
//! | `String`      | `Str`, `Int`, `Float`, `Bool`                         |
//! | `bool`        | `Bool`, `Int` (non-zero), `"true"` / `"false"`        |
//!
//! Everything else is a [`CoerceError`]. Host types stored with
//! [`Value::opaque`] implement the trait by downcasting:
//!
//! ```rust
//! use weave_core::{CoerceError, FromValue, Value};
//!
//! #[derive(Clone, Default)]
//! struct Palette(u32);
//!
//! impl FromValue for Palette {
//!     fn from_value(value: &Value) -> Result<Self, CoerceError> {
//!         value
//!             .downcast_ref::<Palette>()
//!             .cloned()
//!             .ok_or_else(|| CoerceError::Mismatch { found: value.type_name(), target: "Palette" })
//!     }
//! }
//! ```

use crate::error::CoerceError;
use crate::value::Value;

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, CoerceError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Str(s) => s
                .trim()
                .parse::<bool>()
                .map_err(|_| CoerceError::mismatch(value, "bool")),
            _ => Err(CoerceError::mismatch(value, "bool")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value.to_string()),
            _ => Err(CoerceError::mismatch(value, "String")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoerceError::mismatch(value, "f64")),
            _ => Err(CoerceError::mismatch(value, "f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

fn integral(value: &Value, target: &'static str) -> Result<i128, CoerceError> {
    match value {
        Value::Int(i) => Ok(i128::from(*i)),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if f.abs() < 1.7e38 {
                Ok(*f as i128)
            } else {
                Err(CoerceError::OutOfRange { target })
            }
        }
        Value::Str(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| CoerceError::mismatch(value, target)),
        _ => Err(CoerceError::mismatch(value, target)),
    }
}

macro_rules! from_value_int {
    ($($t:ty),*) => {
        $(impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, CoerceError> {
                let wide = integral(value, stringify!($t))?;
                <$t>::try_from(wide).map_err(|_| CoerceError::OutOfRange { target: stringify!($t) })
            }
        })*
    };
}

from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// `Null` reads as `None`; anything else must convert to `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => Err(CoerceError::mismatch(value, "Vec")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_cross_convert() {
        assert_eq!(f64::from_value(&Value::Int(3)), Ok(3.0));
        assert_eq!(i32::from_value(&Value::Float(4.0)), Ok(4));
        assert_eq!(u8::from_value(&Value::Str(" 12 ".into())), Ok(12));
        assert!(i32::from_value(&Value::Float(4.5)).is_err());
    }

    #[test]
    fn integer_range_is_checked() {
        assert_eq!(
            u8::from_value(&Value::Int(300)),
            Err(CoerceError::OutOfRange { target: "u8" })
        );
        assert!(u32::from_value(&Value::Int(-1)).is_err());
    }

    #[test]
    fn strings_accept_scalars_only() {
        assert_eq!(String::from_value(&Value::Float(2.5)), Ok("2.5".to_string()));
        assert_eq!(String::from_value(&Value::Bool(true)), Ok("true".to_string()));
        assert!(String::from_value(&Value::Null).is_err());
        assert!(String::from_value(&Value::List(vec![])).is_err());
    }

    #[test]
    fn option_and_vec() {
        assert_eq!(Option::<i64>::from_value(&Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(1)), Ok(Some(1)));
        assert_eq!(
            Vec::<f64>::from_value(&Value::from(vec![1, 2])),
            Ok(vec![1.0, 2.0])
        );
        assert!(Vec::<bool>::from_value(&Value::from(vec!["x"])).is_err());
    }
}
