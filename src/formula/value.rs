//! Runtime values produced while evaluating a formula.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A value visible to, or produced by, a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A decimal number.
    Number(Decimal),
    /// A boolean.
    Bool(bool),
    /// A text value.
    Text(String),
    /// A calendar date.
    Date(NaiveDate),
    /// The absence of a value.
    None,
}

impl Value {
    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
            Value::None => "None",
        }
    }

    /// Truthiness: zero, empty text, `False` and `None` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => !n.is_zero(),
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
            Value::Date(_) => true,
            Value::None => false,
        }
    }

    /// Returns the value as an arithmetic operand; booleans count as 0/1.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            _ => None,
        }
    }

    /// Coerces any value to an amount, the way payroll `flt` does.
    ///
    /// Numeric text is parsed (thousands separators removed); anything that
    /// is not a number becomes zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use professional_tax::formula::Value;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Value::Text("1,250.50".to_string()).to_amount(), Decimal::new(125050, 2));
    /// assert_eq!(Value::Bool(true).to_amount(), Decimal::ONE);
    /// assert_eq!(Value::None.to_amount(), Decimal::ZERO);
    /// ```
    pub fn to_amount(&self) -> Decimal {
        match self {
            Value::Text(s) => parse_number(s).unwrap_or(Decimal::ZERO),
            Value::Date(_) | Value::None => Decimal::ZERO,
            other => other.as_number().unwrap_or(Decimal::ZERO),
        }
    }
}

/// Parses numeric text, ignoring surrounding whitespace and `,` separators.
pub(crate) fn parse_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::None => write!(f, "None"),
        }
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Number(Decimal::ZERO).is_truthy());
        assert!(Value::Number(Decimal::new(-1, 0)).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Text("0".to_string()).is_truthy());
        assert!(!Value::None.is_truthy());
        assert!(Value::Date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).is_truthy());
    }

    #[test]
    fn test_to_amount_follows_flt() {
        assert_eq!(Value::Text("abc".to_string()).to_amount(), Decimal::ZERO);
        assert_eq!(Value::Text(" 200 ".to_string()).to_amount(), Decimal::new(200, 0));
        assert_eq!(
            Value::Date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).to_amount(),
            Decimal::ZERO
        );
        assert_eq!(Value::Bool(false).to_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<Decimal>), Value::None);
        assert_eq!(
            Value::from(Some("Acme")),
            Value::Text("Acme".to_string())
        );
    }

    #[test]
    fn test_display_normalizes_numbers() {
        assert_eq!(Value::Number(Decimal::new(20000, 2)).to_string(), "200");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Text("x".to_string()).to_string(), "'x'");
    }
}
