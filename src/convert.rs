//! Per-tag converters applied to raw tier values and stored values.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{DataType, Variant};

/// Signature for caller-supplied converters.
pub type ConvertFn = fn(&Variant) -> ConfigResult<Variant>;

/// Words that make [`Converter::Bool`] produce `true`.
const TRUTHY: &[&str] = &["true", "1", "yes", "on", "enabled"];

/// Maps a raw value (environment text, side-car text, stored value) to its typed form.
#[derive(Debug, Clone, Copy)]
pub enum Converter {
    /// Render as text.
    Str,
    Int,
    Float,
    /// Never fails; unknown words are `false`.
    Bool,
    /// Comma-separated text to a list of strings.
    List,
    /// Comma-separated text (or a list) to a list of integers, skipping non-digits.
    IntList,
    Custom(&'static str, ConvertFn),
}

impl Converter {
    pub fn name(&self) -> &'static str {
        match self {
            Converter::Str => "str",
            Converter::Int => "int",
            Converter::Float => "float",
            Converter::Bool => "bool",
            Converter::List => "list",
            Converter::IntList => "int_list",
            Converter::Custom(name, _) => name,
        }
    }

    /// The tag every successful conversion produces, if fixed.
    pub fn output_type(&self) -> Option<DataType> {
        match self {
            Converter::Str => Some(DataType::String),
            Converter::Int => Some(DataType::Int),
            Converter::Float => Some(DataType::Float),
            Converter::Bool => Some(DataType::Bool),
            Converter::List | Converter::IntList => Some(DataType::List),
            Converter::Custom(..) => None,
        }
    }

    pub fn apply(&self, raw: &Variant) -> ConfigResult<Variant> {
        match self {
            Converter::Str => Ok(Variant::String(raw.to_text())),
            Converter::Int => to_int(raw).map(Variant::Int),
            Converter::Float => to_float(raw).map(Variant::Float),
            Converter::Bool => Ok(Variant::Bool(to_bool(raw))),
            Converter::List => Ok(Variant::List(to_list(raw))),
            Converter::IntList => Ok(Variant::List(
                to_int_list(raw).into_iter().map(Variant::Int).collect(),
            )),
            Converter::Custom(_, f) => f(raw),
        }
    }
}

/// Apply an optional converter, passing the value through when absent.
pub fn convert_opt(converter: Option<&Converter>, raw: &Variant) -> ConfigResult<Variant> {
    match converter {
        Some(converter) => converter.apply(raw),
        None => Ok(raw.clone()),
    }
}

fn to_int(raw: &Variant) -> ConfigResult<i64> {
    match raw {
        Variant::Int(i) => Ok(*i),
        Variant::Bool(b) => Ok(i64::from(*b)),
        Variant::Float(f) if f.is_finite() => {
            let truncated = f.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(truncated as i64)
            } else {
                Err(ConfigError::conversion("int", raw, "value is out of range"))
            }
        }
        Variant::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::conversion("int", raw, &e.to_string())),
        other => Err(ConfigError::conversion(
            "int",
            other,
            "value is not a number",
        )),
    }
}

fn to_float(raw: &Variant) -> ConfigResult<f64> {
    let value = match raw {
        Variant::Float(f) => Ok(*f),
        Variant::Int(i) => Ok(*i as f64),
        Variant::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Variant::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| ConfigError::conversion("float", raw, &e.to_string())),
        other => Err(ConfigError::conversion(
            "float",
            other,
            "value is not a number",
        )),
    }?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::conversion("float", raw, "value is not finite"))
    }
}

fn to_bool(raw: &Variant) -> bool {
    match raw {
        Variant::Bool(b) => *b,
        other => {
            let text = other.to_text().trim().to_lowercase();
            TRUTHY.contains(&text.as_str())
        }
    }
}

fn to_list(raw: &Variant) -> Vec<Variant> {
    match raw {
        Variant::List(items) => items.clone(),
        other => split_csv(&other.to_text())
            .map(|item| Variant::String(item.to_string()))
            .collect(),
    }
}

fn to_int_list(raw: &Variant) -> Vec<i64> {
    match raw {
        Variant::List(items) => items
            .iter()
            .filter_map(|item| match item {
                Variant::Int(i) => Some(*i),
                Variant::Bool(b) => Some(i64::from(*b)),
                Variant::String(s) if is_digits(s.trim()) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        Variant::String(s) => split_csv(s)
            .filter(|item| is_digits(item))
            .filter_map(|item| item.parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn split_csv(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_int_from_text_and_float() {
        assert_eq!(
            Converter::Int.apply(&Variant::from(" 12434 ")).unwrap(),
            Variant::Int(12434)
        );
        assert_eq!(
            Converter::Int.apply(&Variant::Float(2.9)).unwrap(),
            Variant::Int(2)
        );
        let err = Converter::Int.apply(&Variant::from("abc")).unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeConversionFailure);
    }

    #[test]
    fn test_float_from_text() {
        assert_eq!(
            Converter::Float.apply(&Variant::from("0.5")).unwrap(),
            Variant::Float(0.5)
        );
        assert_eq!(
            Converter::Float.apply(&Variant::Int(1)).unwrap(),
            Variant::Float(1.0)
        );
    }

    #[test]
    fn test_float_rejects_non_finite() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            let err = Converter::Float.apply(&Variant::from(raw)).unwrap_err();
            assert_eq!(err.code, ErrorCode::TypeConversionFailure, "{raw}");
        }
        assert!(Converter::Float.apply(&Variant::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_int_rejects_out_of_range_float() {
        for raw in [1e30, -1e30, 9.3e18] {
            let err = Converter::Int.apply(&Variant::Float(raw)).unwrap_err();
            assert_eq!(err.code, ErrorCode::TypeConversionFailure, "{raw}");
        }
        assert_eq!(
            Converter::Int.apply(&Variant::Float(-9.0e18)).unwrap(),
            Variant::Int(-9_000_000_000_000_000_000)
        );
    }

    #[test]
    fn test_bool_words() {
        for word in ["true", "TRUE", "1", "yes", "on", "Enabled"] {
            assert_eq!(
                Converter::Bool.apply(&Variant::from(word)).unwrap(),
                Variant::Bool(true),
                "{word}"
            );
        }
        for word in ["false", "0", "off", "nope", ""] {
            assert_eq!(
                Converter::Bool.apply(&Variant::from(word)).unwrap(),
                Variant::Bool(false),
                "{word}"
            );
        }
        assert_eq!(
            Converter::Bool.apply(&Variant::Int(1)).unwrap(),
            Variant::Bool(true)
        );
    }

    #[test]
    fn test_list_split() {
        assert_eq!(
            Converter::List.apply(&Variant::from("a, b,,c ")).unwrap(),
            Variant::List(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn test_int_list_skips_non_digits() {
        assert_eq!(
            Converter::IntList
                .apply(&Variant::from("1111, 6006, x, -3, 8080"))
                .unwrap(),
            Variant::List(vec![Variant::Int(1111), Variant::Int(6006), Variant::Int(8080)])
        );
        assert_eq!(
            Converter::IntList
                .apply(&Variant::List(vec![
                    Variant::Int(-3),
                    Variant::from("42"),
                    Variant::Float(1.5),
                ]))
                .unwrap(),
            Variant::List(vec![Variant::Int(-3), Variant::Int(42)])
        );
        assert_eq!(
            Converter::IntList.apply(&Variant::Bool(true)).unwrap(),
            Variant::List(vec![])
        );
    }

    #[test]
    fn test_custom_converter() {
        fn upper(raw: &Variant) -> ConfigResult<Variant> {
            Ok(Variant::String(raw.to_text().to_uppercase()))
        }
        let converter = Converter::Custom("upper", upper);
        assert_eq!(converter.name(), "upper");
        assert_eq!(
            converter.apply(&Variant::from("dev")).unwrap(),
            Variant::from("DEV")
        );
    }
}
