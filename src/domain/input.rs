//! Loosely-typed field input.
//!
//! Form widgets hand over whatever the user typed, and JSON payloads may carry
//! `null`, numbers or nested objects where a string was expected. Formatters and
//! validators accept anything implementing [`FieldInput`] so that "missing",
//! "null" and "not a string" are representable and handled uniformly: they
//! format to an empty string and never validate.

use serde_json::Value;

/// A value bound to a single form field.
pub trait FieldInput {
    /// Text content of the value, or `None` when it is absent or not textual.
    fn as_text(&self) -> Option<&str>;

    /// Numeric content of the value.
    ///
    /// The default parses the trimmed text. Non-finite numbers are reported
    /// as `None`.
    fn as_number(&self) -> Option<f64> {
        self.as_text()
            .and_then(|text| text.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
    }
}

impl FieldInput for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl FieldInput for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: FieldInput + ?Sized> FieldInput for &T {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }

    fn as_number(&self) -> Option<f64> {
        (**self).as_number()
    }
}

impl<T: FieldInput> FieldInput for Option<T> {
    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(FieldInput::as_text)
    }

    fn as_number(&self) -> Option<f64> {
        self.as_ref().and_then(FieldInput::as_number)
    }
}

impl FieldInput for Value {
    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
            Value::String(s) => s.as_number(),
            _ => None,
        }
    }
}

macro_rules! numeric_input {
    ($($ty:ty),*) => {
        $(
            impl FieldInput for $ty {
                fn as_text(&self) -> Option<&str> {
                    None
                }

                #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
                fn as_number(&self) -> Option<f64> {
                    Some(*self as f64).filter(|n| n.is_finite())
                }
            }
        )*
    };
}

numeric_input!(f32, f64, i32, i64, u32, u64);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_inputs() {
        assert_eq!("abc".as_text(), Some("abc"));
        assert_eq!(String::from("abc").as_text(), Some("abc"));
        assert_eq!(Some("abc").as_text(), Some("abc"));
        assert_eq!(None::<&str>.as_text(), None);
    }

    #[test]
    fn test_json_inputs() {
        assert_eq!(json!("x").as_text(), Some("x"));
        assert_eq!(json!(null).as_text(), None);
        assert_eq!(json!(42).as_text(), None);
        assert_eq!(FieldInput::as_number(&json!(42)), Some(42.0));
        assert_eq!(FieldInput::as_number(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(FieldInput::as_number(&json!({"a": 1})), None);
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        assert_eq!(f64::NAN.as_number(), None);
        assert_eq!(f64::INFINITY.as_number(), None);
        assert_eq!("inf".as_number(), None);
        assert_eq!("NaN".as_number(), None);
    }
}
