//! Declared data types, parameter values and argument literal conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{codes, ErrorInfo, FormError};

/// Data type declared on catalogue arguments, inputs, outputs and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    /// Signed integer.
    Int,
    /// Double precision float.
    Float,
    /// Free text.
    Str,
    /// Boolean flag.
    Bool,
    /// Homogeneous list of the inner type.
    List(Box<DataType>),
}

impl DataType {
    /// Whether the type may be used for a form parameter.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, DataType::List(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "int"),
            DataType::Float => write!(f, "float"),
            DataType::Str => write!(f, "str"),
            DataType::Bool => write!(f, "bool"),
            DataType::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

impl FromStr for DataType {
    type Err = FormError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim().to_ascii_lowercase();
        match text.as_str() {
            "int" | "integer" => return Ok(DataType::Int),
            "float" | "double" => return Ok(DataType::Float),
            "str" | "string" => return Ok(DataType::Str),
            "bool" | "boolean" => return Ok(DataType::Bool),
            _ => {}
        }
        let inner = text
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
            .or_else(|| {
                text.strip_prefix("list[")
                    .and_then(|rest| rest.strip_suffix(']'))
            });
        match inner {
            Some(inner) => Ok(DataType::List(Box::new(inner.parse()?))),
            None => Err(FormError::RunPuzzle(
                ErrorInfo::new(codes::CONVERSION, "unknown data type").with_context("type", raw),
            )),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = FormError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.to_string()
    }
}

/// Value of a form parameter held by an exemplar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Str(String),
}

impl ParamValue {
    /// Numeric view used by evaluators; text has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(value) => Some(*value as f64),
            ParamValue::Float(value) => Some(*value),
            ParamValue::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            ParamValue::Str(_) => None,
        }
    }

    /// Declared type this value satisfies.
    pub fn data_type(&self) -> DataType {
        match self {
            ParamValue::Int(_) => DataType::Int,
            ParamValue::Float(_) => DataType::Float,
            ParamValue::Bool(_) => DataType::Bool,
            ParamValue::Str(_) => DataType::Str,
        }
    }

    /// Whether the value may be stored in a parameter declared as `data_type`.
    ///
    /// Integers are accepted where floats are declared.
    pub fn conforms_to(&self, data_type: &DataType) -> bool {
        matches!(
            (self, data_type),
            (ParamValue::Int(_), DataType::Int)
                | (ParamValue::Int(_), DataType::Float)
                | (ParamValue::Float(_), DataType::Float)
                | (ParamValue::Bool(_), DataType::Bool)
                | (ParamValue::Str(_), DataType::Str)
        )
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Bool(flag) => write!(f, "{flag}"),
            ParamValue::Str(text) => write!(f, "{text}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Converted constructor argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// Boolean argument.
    Bool(bool),
    /// Integer argument.
    Int(i64),
    /// Float argument.
    Float(f64),
    /// Text argument.
    Str(String),
    /// List argument.
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Converts a catalogue literal into a value of the declared type.
    pub fn convert(literal: &str, data_type: &DataType) -> Result<Self, FormError> {
        match data_type {
            DataType::Bool => match literal.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(ArgValue::Bool(true)),
                "false" | "0" | "no" => Ok(ArgValue::Bool(false)),
                _ => Err(FormError::conversion(literal, data_type, "not a boolean literal")),
            },
            DataType::Int => {
                let text = literal.trim();
                if let Ok(value) = text.parse::<i64>() {
                    return Ok(ArgValue::Int(value));
                }
                match text.parse::<f64>() {
                    Ok(value)
                        if value.is_finite()
                            && value.trunc() >= i64::MIN as f64
                            && value.trunc() <= i64::MAX as f64 =>
                    {
                        Ok(ArgValue::Int(value.trunc() as i64))
                    }
                    _ => Err(FormError::conversion(literal, data_type, "not an integer literal")),
                }
            }
            DataType::Float => literal
                .trim()
                .parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|err| FormError::conversion(literal, data_type, err.to_string())),
            DataType::Str => Ok(ArgValue::Str(literal.to_string())),
            DataType::List(inner) => {
                let text = literal.trim();
                let body = text
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .unwrap_or(text);
                if body.trim().is_empty() {
                    return Ok(ArgValue::List(Vec::new()));
                }
                let items = split_top_level(body)
                    .ok_or_else(|| FormError::conversion(literal, data_type, "unbalanced brackets"))?;
                items
                    .into_iter()
                    .map(|item| ArgValue::convert(item.trim(), inner))
                    .collect::<Result<Vec<_>, _>>()
                    .map(ArgValue::List)
            }
        }
    }

    /// Canonical literal that converts back to the same value.
    pub fn to_literal(&self) -> String {
        match self {
            ArgValue::Bool(flag) => flag.to_string(),
            ArgValue::Int(value) => value.to_string(),
            ArgValue::Float(value) => value.to_string(),
            ArgValue::Str(text) => text.clone(),
            ArgValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ArgValue::to_literal).collect();
                format!("[{}]", parts.join(","))
            }
        }
    }

    /// Float view; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Float(value) => Some(*value),
            ArgValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Integer view.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Text view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(text) => Some(text),
            _ => None,
        }
    }

    /// List view.
    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Splits on commas that are not nested inside brackets.
fn split_top_level(body: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    for (idx, ch) in body.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&body[start..]);
    Some(parts)
}
