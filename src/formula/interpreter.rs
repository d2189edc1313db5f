//! Tree-walking evaluator for parsed formulas.
//!
//! Arithmetic is exact decimal arithmetic with overflow checks; a formula
//! can never panic the host.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;

use super::context::EvalContext;
use super::parser::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::value::{Value, parse_number};
use super::{FormulaError, MAX_POWER_EXPONENT};

/// Evaluates an expression against a context.
pub fn evaluate(expr: &Expr, context: &EvalContext) -> Result<Value, FormulaError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Variable(name) => context
            .get(name)
            .cloned()
            .ok_or_else(|| FormulaError::UnknownVariable(name.clone())),

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, context)?;
            let symbol = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
            };
            let n = value.as_number().ok_or_else(|| FormulaError::BadOperand {
                op: symbol.to_string(),
                operand: value.type_name().to_string(),
            })?;
            Ok(Value::Number(match op {
                UnaryOp::Neg => -n,
                UnaryOp::Pos => n,
            }))
        }

        Expr::Binary { op, left, right } => {
            let left = evaluate(left, context)?;
            let right = evaluate(right, context)?;
            arithmetic(*op, &left, &right)
        }

        Expr::Compare { first, rest } => {
            let mut left = evaluate(first, context)?;
            for (op, operand) in rest {
                let right = evaluate(operand, context)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }

        // Python semantics: `and`/`or` yield one of their operands.
        Expr::And(left, right) => {
            let left = evaluate(left, context)?;
            if !left.is_truthy() {
                return Ok(left);
            }
            evaluate(right, context)
        }

        Expr::Or(left, right) => {
            let left = evaluate(left, context)?;
            if left.is_truthy() {
                return Ok(left);
            }
            evaluate(right, context)
        }

        Expr::Not(operand) => Ok(Value::Bool(!evaluate(operand, context)?.is_truthy())),

        Expr::Conditional {
            then,
            condition,
            otherwise,
        } => {
            if evaluate(condition, context)?.is_truthy() {
                evaluate(then, context)
            } else {
                evaluate(otherwise, context)
            }
        }

        Expr::Call { function, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, context))
                .collect::<Result<Vec<_>, _>>()?;
            call(function, args)
        }

        Expr::Attribute { target, name } => {
            let value = evaluate(target, context)?;
            attribute(&value, name)
        }
    }
}

fn mismatch(op: &str, left: &Value, right: &Value) -> FormulaError {
    FormulaError::TypeMismatch {
        op: op.to_string(),
        left: left.type_name().to_string(),
        right: right.type_name().to_string(),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, FormulaError> {
    match (op, left, right) {
        (BinaryOp::Add, Value::Text(a), Value::Text(b)) => {
            return Ok(Value::Text(format!("{}{}", a, b)));
        }
        (BinaryOp::Sub, Value::Date(a), Value::Date(b)) => {
            return Ok(Value::Number(Decimal::from((*a - *b).num_days())));
        }
        _ => {}
    }

    let (a, b) = match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(mismatch(op.symbol(), left, right)),
    };

    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            non_zero(b)?;
            a.checked_div(b)
        }
        BinaryOp::FloorDiv => {
            non_zero(b)?;
            a.checked_div(b).map(|q| q.floor())
        }
        BinaryOp::Mod => {
            non_zero(b)?;
            // Result takes the sign of the divisor.
            a.checked_rem(b).map(|r| {
                if !r.is_zero() && r.is_sign_negative() != b.is_sign_negative() {
                    r + b
                } else {
                    r
                }
            })
        }
        BinaryOp::Pow => return power(a, b).map(Value::Number),
    };

    result.map(Value::Number).ok_or(FormulaError::Overflow)
}

fn non_zero(divisor: Decimal) -> Result<(), FormulaError> {
    if divisor.is_zero() {
        Err(FormulaError::DivisionByZero)
    } else {
        Ok(())
    }
}

fn power(base: Decimal, exponent: Decimal) -> Result<Decimal, FormulaError> {
    let whole = exponent.fract().is_zero();
    let steps = exponent.abs().to_u32().filter(|n| whole && *n <= MAX_POWER_EXPONENT);
    let Some(steps) = steps else {
        return Err(FormulaError::InvalidArgument {
            function: "**".to_string(),
            message: format!(
                "exponent must be a whole number between -{max} and {max}",
                max = MAX_POWER_EXPONENT
            ),
        });
    };

    let mut result = Decimal::ONE;
    for _ in 0..steps {
        result = result.checked_mul(base).ok_or(FormulaError::Overflow)?;
    }

    if exponent.is_sign_negative() && !exponent.is_zero() {
        non_zero(result)?;
        result = Decimal::ONE
            .checked_div(result)
            .ok_or(FormulaError::Overflow)?;
    }
    Ok(result)
}

fn equals(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return a == b;
    }
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::None, Value::None) => true,
        _ => false,
    }
}

fn ordering(op: &str, left: &Value, right: &Value) -> Result<Ordering, FormulaError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return Ok(a.cmp(&b));
    }
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, FormulaError> {
    let holds: fn(Ordering) -> bool = match op {
        CompareOp::Eq => return Ok(equals(left, right)),
        CompareOp::Ne => return Ok(!equals(left, right)),
        CompareOp::Lt => Ordering::is_lt,
        CompareOp::Le => Ordering::is_le,
        CompareOp::Gt => Ordering::is_gt,
        CompareOp::Ge => Ordering::is_ge,
    };
    Ok(holds(ordering(op.symbol(), left, right)?))
}

fn attribute(value: &Value, name: &str) -> Result<Value, FormulaError> {
    match (value, name) {
        (Value::Date(d), "year") => Ok(Value::Number(Decimal::from(d.year()))),
        (Value::Date(d), "month") => Ok(Value::Number(Decimal::from(d.month()))),
        (Value::Date(d), "day") => Ok(Value::Number(Decimal::from(d.day()))),
        (Value::Date(d), "weekday") => Ok(Value::Number(Decimal::from(
            d.weekday().num_days_from_monday(),
        ))),
        _ => Err(FormulaError::UnknownAttribute {
            kind: value.type_name().to_string(),
            name: name.to_string(),
        }),
    }
}

fn arity(function: &str, args: &[Value], min: usize, max: usize) -> Result<(), FormulaError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(FormulaError::Arity {
            function: function.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn digits(function: &str, value: &Value) -> Result<u32, FormulaError> {
    value
        .as_number()
        .filter(|n| n.fract().is_zero())
        .and_then(|n| n.to_u32())
        .filter(|n| *n <= 28)
        .ok_or_else(|| FormulaError::InvalidArgument {
            function: function.to_string(),
            message: "digits must be a whole number between 0 and 28".to_string(),
        })
}

fn strict_number(function: &str, value: &Value) -> Result<Decimal, FormulaError> {
    let parsed = match value {
        Value::Text(s) => parse_number(s),
        other => other.as_number(),
    };
    parsed.ok_or_else(|| FormulaError::InvalidArgument {
        function: function.to_string(),
        message: format!("cannot convert {} to a number", value),
    })
}

/// Parses the date formats payroll documents commonly carry.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            // Datetime strings: keep the date part.
            text.get(..10)
                .filter(|_| text.len() > 10)
                .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        })
}

fn call(function: &str, args: Vec<Value>) -> Result<Value, FormulaError> {
    match function {
        "getdate" => {
            arity(function, &args, 1, 1)?;
            match &args[0] {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::Text(s) => parse_date(s)
                    .map(Value::Date)
                    .ok_or_else(|| FormulaError::InvalidDate(s.clone())),
                Value::None => Ok(Value::None),
                other => Err(FormulaError::InvalidDate(other.to_string())),
            }
        }
        "flt" => {
            arity(function, &args, 1, 2)?;
            let amount = args[0].to_amount();
            match args.get(1) {
                Some(precision) => Ok(Value::Number(amount.round_dp(digits(function, precision)?))),
                None => Ok(Value::Number(amount)),
            }
        }
        "cint" => {
            arity(function, &args, 1, 1)?;
            Ok(Value::Number(args[0].to_amount().trunc()))
        }
        "int" => {
            arity(function, &args, 1, 1)?;
            Ok(Value::Number(strict_number(function, &args[0])?.trunc()))
        }
        "float" => {
            arity(function, &args, 1, 1)?;
            Ok(Value::Number(strict_number(function, &args[0])?))
        }
        "round" => {
            arity(function, &args, 1, 2)?;
            let n = strict_number(function, &args[0])?;
            let dp = match args.get(1) {
                Some(d) => digits(function, d)?,
                None => 0,
            };
            // Banker's rounding, matching Python's round().
            Ok(Value::Number(n.round_dp(dp)))
        }
        "abs" => {
            arity(function, &args, 1, 1)?;
            let n = args[0].as_number().ok_or_else(|| FormulaError::BadOperand {
                op: "abs()".to_string(),
                operand: args[0].type_name().to_string(),
            })?;
            Ok(Value::Number(n.abs()))
        }
        "min" | "max" => {
            arity(function, &args, 1, usize::MAX)?;
            let want = if function == "min" {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut iter = args.into_iter();
            let mut best = iter.next().unwrap_or(Value::None);
            for candidate in iter {
                if ordering(function, &candidate, &best)? == want {
                    best = candidate;
                }
            }
            Ok(best)
        }
        other => Err(FormulaError::UnknownFunction(other.to_string())),
    }
}
