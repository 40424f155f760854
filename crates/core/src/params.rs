//! CCL call parameters and their serialisation.
//!
//! `XMLCclRequest::send` takes the program arguments as one literal string, for example
//! `'MINE','test',1`. Some CCL programs fail unless text arguments are single quoted, so each
//! parameter carries an explicit [`ParamKind`] that decides how it is rendered:
//!
//! | Kind     | Rendering          |
//! |----------|--------------------|
//! | `String` | `'value'`          |
//! | `Number` | `value` (bare)     |
//!
//! Parameters can be built from Rust primitives (`&str`/`String` become strings, integers
//! and floats become numbers), explicitly with [`CclParam::new`], or from untyped JSON with
//! [`CclParam::from_value`].

use crate::constants::MINE_PARAM;
use crate::{CclError, CclResult};
use serde_json::Value;
use std::fmt;

/// How a parameter is rendered in the argument string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    String,
    Number,
}

/// The raw value of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(text) => f.write_str(text),
            ParamValue::Integer(n) => write!(f, "{n}"),
            ParamValue::Float(n) if n.is_infinite() => {
                f.write_str(if n.is_sign_negative() { "-Infinity" } else { "Infinity" })
            }
            // f64's Display drops the fraction of integral values ("1", not "1.0").
            ParamValue::Float(n) => write!(f, "{n}"),
        }
    }
}

/// A single argument to a CCL program.
#[derive(Clone, Debug, PartialEq)]
pub struct CclParam {
    kind: ParamKind,
    value: ParamValue,
}

impl CclParam {
    /// Explicitly typed parameter. A number kind with a text value is rendered bare, a string
    /// kind with a numeric value is quoted.
    pub fn new(kind: ParamKind, value: ParamValue) -> Self {
        Self { kind, value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ParamKind::String, ParamValue::Text(value.into()))
    }

    pub fn number(value: impl Into<ParamValue>) -> Self {
        Self::new(ParamKind::Number, value.into())
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Convert an untyped JSON value into a parameter.
    ///
    /// Strings and numbers infer their kind. An object of the form
    /// `{"type": "string" | "number", "param": <string | number>}` is an explicit parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CclError::InvalidParamType`] for anything else.
    pub fn from_value(value: &Value) -> CclResult<Self> {
        match value {
            Value::String(text) => Ok(Self::string(text.as_str())),
            Value::Number(number) => Ok(Self::number(number_value(number))),
            Value::Object(map) => {
                let kind = match map.get("type").and_then(Value::as_str) {
                    Some("string") => ParamKind::String,
                    Some("number") => ParamKind::Number,
                    _ => {
                        return Err(CclError::InvalidParamType(
                            "object without a 'string' or 'number' type".into(),
                        ))
                    }
                };
                let value = match map.get("param") {
                    Some(Value::String(text)) => ParamValue::Text(text.clone()),
                    Some(Value::Number(number)) => number_value(number),
                    _ => {
                        return Err(CclError::InvalidParamType(
                            "object without a string or number param".into(),
                        ))
                    }
                };
                Ok(Self::new(kind, value))
            }
            Value::Null => Err(CclError::InvalidParamType("null".into())),
            Value::Bool(_) => Err(CclError::InvalidParamType("boolean".into())),
            Value::Array(_) => Err(CclError::InvalidParamType("array".into())),
        }
    }
}

fn number_value(number: &serde_json::Number) -> ParamValue {
    match number.as_i64() {
        Some(n) => ParamValue::Integer(n),
        None => ParamValue::Float(number.as_f64().unwrap_or(f64::NAN)),
    }
}

impl fmt::Display for CclParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParamKind::String => write!(f, "'{}'", self.value),
            ParamKind::Number => write!(f, "{}", self.value),
        }
    }
}

impl TryFrom<&Value> for CclParam {
    type Error = CclError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl TryFrom<Value> for CclParam {
    type Error = CclError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl From<&str> for CclParam {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for CclParam {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

macro_rules! integer_param {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::Integer(i64::from(value))
                }
            }

            impl From<$ty> for CclParam {
                fn from(value: $ty) -> Self {
                    Self::number(value)
                }
            }
        )*
    };
}

integer_param!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<f64> for CclParam {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<f32> for CclParam {
    fn from(value: f32) -> Self {
        Self::number(f64::from(value))
    }
}

/// Serialise `params` into the literal argument string expected by `XMLCclRequest::send`.
///
/// Unless `exclude_mine` is set, a `'MINE'` string parameter is prepended. Parameters are
/// joined with `,` and no whitespace; order is preserved.
pub fn format_params(params: &[CclParam], exclude_mine: bool) -> String {
    let mine = (!exclude_mine).then(|| CclParam::string(MINE_PARAM));
    mine.iter()
        .chain(params)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Validate untyped parameters and serialise them like [`format_params`].
///
/// # Errors
///
/// Returns [`CclError::InvalidParamType`] on the first element that is neither a string, a
/// number nor a well-formed explicit parameter.
pub fn format_values(values: &[Value], exclude_mine: bool) -> CclResult<String> {
    let params = parse_values(values)?;
    Ok(format_params(&params, exclude_mine))
}

pub(crate) fn parse_values(values: &[Value]) -> CclResult<Vec<CclParam>> {
    values.iter().map(CclParam::from_value).collect()
}
