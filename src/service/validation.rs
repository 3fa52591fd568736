//! Request validation driven by an entity's projection.

use crate::config::{FieldKind, FieldSpec, Projection};
use crate::error::{AppError, FieldErrors};
use crate::store::Changes;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::OnceLock;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";
const NOT_STRING: &str = "Not a valid string.";
const INVALID_INTEGER: &str = "A valid integer is required.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, \
     and @/./+/-/_ characters.";

const USERNAME_PATTERN: &str = r"^[\w.@+-]+$";

fn username_pattern() -> Result<&'static Regex, AppError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(USERNAME_PATTERN)
        .map_err(|e| AppError::Internal(format!("username pattern: {}", e)))?;
    Ok(PATTERN.get_or_init(|| re))
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate and normalise writable fields into column changes.
    /// Full writes need every writable field; `partial` only checks the fields present.
    /// Unknown and read-only keys are ignored.
    pub fn validate(
        projection: &Projection,
        body: &Map<String, Value>,
        partial: bool,
    ) -> Result<Changes, AppError> {
        let username = username_pattern()?;
        let mut changes = Changes::new();
        let mut errors = FieldErrors::new();
        for field in projection.writable() {
            match body.get(field.wire) {
                None if partial => {}
                None => errors.add(field.wire, REQUIRED),
                Some(Value::Null) => errors.add(field.wire, NOT_NULL),
                Some(v) => match clean(field, v, username) {
                    Ok(value) => {
                        changes.insert(field.column, value);
                    }
                    Err(messages) => {
                        for m in messages {
                            errors.add(field.wire, m);
                        }
                    }
                },
            }
        }
        errors.into_result()?;
        Ok(changes)
    }
}

fn clean(field: &FieldSpec, v: &Value, username: &Regex) -> Result<Value, Vec<String>> {
    match field.kind {
        FieldKind::Text { max_length } => clean_text(v, max_length).map(Value::String),
        FieldKind::Username { max_length } => {
            let s = clean_text(v, max_length)?;
            if !username.is_match(&s) {
                return Err(vec![INVALID_USERNAME.into()]);
            }
            Ok(Value::String(s))
        }
        FieldKind::Password => clean_text(v, usize::MAX).map(Value::String),
        FieldKind::Integer => clean_integer(v).map(Value::from),
        FieldKind::Decimal {
            max_digits,
            decimal_places,
        } => clean_decimal(v, max_digits, decimal_places).map(|d| Value::String(d.to_string())),
    }
}

fn clean_text(v: &Value, max_length: usize) -> Result<String, Vec<String>> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(vec![NOT_STRING.into()]),
    };
    if s.is_empty() {
        return Err(vec![NOT_BLANK.into()]);
    }
    if s.chars().count() > max_length {
        return Err(vec![format!(
            "Ensure this field has no more than {} characters.",
            max_length
        )]);
    }
    Ok(s)
}

fn clean_integer(v: &Value) -> Result<i64, Vec<String>> {
    let n = match v {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e18 => Some(f as i64),
            _ => None,
        },
        // "10" and "10.0" are accepted, as form posts send everything as text.
        Value::String(s) => {
            let s = s.trim();
            let s = match s.split_once('.') {
                Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
                _ => s,
            };
            s.parse::<i64>().ok()
        }
        _ => None,
    };
    let n = n.ok_or_else(|| vec![INVALID_INTEGER.to_string()])?;
    if n > i32::MAX as i64 {
        return Err(vec![format!("Ensure this value is less than or equal to {}.", i32::MAX)]);
    }
    if n < i32::MIN as i64 {
        return Err(vec![format!("Ensure this value is greater than or equal to {}.", i32::MIN)]);
    }
    Ok(n)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s).ok().or_else(|| Decimal::from_scientific(s).ok())
}

/// Digit limits follow the usual rules: trailing zeros count as decimal places.
fn clean_decimal(v: &Value, max_digits: u32, decimal_places: u32) -> Result<Decimal, Vec<String>> {
    let d = match v {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
    .ok_or_else(|| vec![INVALID_NUMBER.to_string()])?;

    let decimals = d.scale();
    let mantissa_digits = d.mantissa().unsigned_abs().to_string().len() as u32;
    let total = mantissa_digits.max(decimals);
    let whole = total - decimals;

    let mut messages = Vec::new();
    if total > max_digits {
        messages.push(format!(
            "Ensure that there are no more than {} digits in total.",
            max_digits
        ));
    } else if decimals > decimal_places {
        messages.push(format!(
            "Ensure that there are no more than {} decimal places.",
            decimal_places
        ));
    } else if whole > max_digits - decimal_places {
        messages.push(format!(
            "Ensure that there are no more than {} digits before the decimal point.",
            max_digits - decimal_places
        ));
    }
    if !messages.is_empty() {
        return Err(messages);
    }
    let mut d = d;
    d.rescale(decimal_places);
    Ok(d)
}
