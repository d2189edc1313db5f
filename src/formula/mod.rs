//! Restricted expression language for jurisdiction formulas.
//!
//! Formulas are short Python-flavoured expressions such as
//! `200 if gross_pay > 10000 else 0`. They are parsed once per evaluation
//! into a syntax tree and evaluated against an [`EvalContext`]. Only the
//! variables bound in the context and the functions in [`ALLOWED_FUNCTIONS`]
//! are reachable; there are no statements, loops, assignments or attribute
//! access beyond date parts, so evaluation always terminates.
//!
//! # Example
//!
//! ```
//! use professional_tax::formula::{EvalContext, Formula};
//! use rust_decimal::Decimal;
//!
//! let mut context = EvalContext::new();
//! context.set("gross_pay", Decimal::new(1000, 0));
//!
//! let formula = Formula::parse("gross_pay * 0.1").unwrap();
//! assert_eq!(formula.evaluate_amount(&context).unwrap(), Decimal::new(100, 0));
//! ```

mod context;
mod interpreter;
mod lexer;
mod parser;
mod value;

use rust_decimal::Decimal;
use thiserror::Error;

pub use context::{EvalContext, variable_name};
pub use parser::{BinaryOp, CompareOp, Expr, UnaryOp};
pub use value::Value;

/// Longest formula text accepted, in characters.
pub const MAX_FORMULA_LENGTH: usize = 4096;

/// Deepest nesting of parentheses, unary operators, conditionals and
/// chained operators or attribute accesses.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Largest exponent magnitude accepted by `**`.
pub const MAX_POWER_EXPONENT: u32 = 64;

/// Functions callable from formula text.
pub const ALLOWED_FUNCTIONS: [&str; 9] = [
    "getdate", "flt", "cint", "int", "float", "round", "abs", "min", "max",
];

pub(crate) fn is_allowed_function(name: &str) -> bool {
    ALLOWED_FUNCTIONS.contains(&name)
}

/// Errors raised while parsing or evaluating a formula.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormulaError {
    /// The formula text is blank.
    #[error("formula is empty")]
    Empty,

    /// The formula text is longer than [`MAX_FORMULA_LENGTH`].
    #[error("formula exceeds {max} characters")]
    TooLong {
        /// The length limit.
        max: usize,
    },

    /// A character that starts no token.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Character offset in the formula.
        position: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Character offset of the opening quote.
        position: usize,
    },

    /// A numeric literal that does not fit a decimal.
    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber {
        /// The literal as written.
        text: String,
        /// Character offset in the formula.
        position: usize,
    },

    /// A token that does not fit the grammar at this point.
    #[error("unexpected {found} at position {position}")]
    UnexpectedToken {
        /// Description of the token.
        found: String,
        /// Character offset in the formula.
        position: usize,
    },

    /// The formula ended mid-expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// Nesting exceeds [`MAX_NESTING_DEPTH`].
    #[error("formula nesting exceeds depth {max}")]
    TooDeep {
        /// The depth limit.
        max: usize,
    },

    /// A variable that is not bound in the context.
    #[error("name '{0}' is not defined")]
    UnknownVariable(String),

    /// A function outside [`ALLOWED_FUNCTIONS`].
    #[error("function '{0}' is not allowed")]
    UnknownFunction(String),

    /// A function called with the wrong number of arguments.
    #[error("{function}() expects {expected} argument(s), got {found}")]
    Arity {
        /// The function name.
        function: String,
        /// The accepted argument count, e.g. "1 to 2".
        expected: String,
        /// The number of arguments given.
        found: usize,
    },

    /// A binary operator applied to incompatible types.
    #[error("unsupported operand types for {op}: {left} and {right}")]
    TypeMismatch {
        /// The operator symbol.
        op: String,
        /// Type of the left operand.
        left: String,
        /// Type of the right operand.
        right: String,
    },

    /// A unary operator or function applied to an unsupported type.
    #[error("bad operand type for {op}: {operand}")]
    BadOperand {
        /// The operator or function name.
        op: String,
        /// Type of the operand.
        operand: String,
    },

    /// An attribute that the value does not expose.
    #[error("{kind} value has no attribute '{name}'")]
    UnknownAttribute {
        /// Type of the value.
        kind: String,
        /// The attribute name.
        name: String,
    },

    /// An argument with the right type but an unusable value.
    #[error("invalid argument for {function}: {message}")]
    InvalidArgument {
        /// The function or operator name.
        function: String,
        /// What was wrong with the argument.
        message: String,
    },

    /// Text that `getdate` cannot read as a date.
    #[error("invalid date '{0}'")]
    InvalidDate(String),

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A result outside the decimal range.
    #[error("numeric overflow")]
    Overflow,
}

/// A parsed formula, ready to evaluate against any number of contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses formula text.
    ///
    /// Unknown function names are rejected here; unknown variables are only
    /// detected at evaluation time because they depend on the context.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        if source.trim().is_empty() {
            return Err(FormulaError::Empty);
        }
        if source.chars().count() > MAX_FORMULA_LENGTH {
            return Err(FormulaError::TooLong {
                max: MAX_FORMULA_LENGTH,
            });
        }
        let tokens = lexer::tokenize(source)?;
        let expr = parser::parse(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The original formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed syntax tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Names of the variables the formula reads, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.expr.collect_variables(&mut names);
        names
    }

    /// Evaluates the formula to a raw value.
    pub fn evaluate(&self, context: &EvalContext) -> Result<Value, FormulaError> {
        interpreter::evaluate(&self.expr, context)
    }

    /// Evaluates the formula and coerces the result to an amount.
    pub fn evaluate_amount(&self, context: &EvalContext) -> Result<Decimal, FormulaError> {
        self.evaluate(context).map(|value| value.to_amount())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_formula_rejected() {
        assert_eq!(Formula::parse("   ").unwrap_err(), FormulaError::Empty);
    }

    #[test]
    fn test_overlong_formula_rejected() {
        let source = "1+".repeat(MAX_FORMULA_LENGTH) + "1";
        assert_eq!(
            Formula::parse(&source).unwrap_err(),
            FormulaError::TooLong {
                max: MAX_FORMULA_LENGTH
            }
        );
    }

    #[test]
    fn test_syntax_error_message_is_readable() {
        let err = Formula::parse("gross_pay +").unwrap_err();
        assert_eq!(err.to_string(), "unexpected end of formula");
    }

    #[test]
    fn test_variables_lists_referenced_names() {
        let formula = Formula::parse("max(basic * 0.12, gross_pay) if start_date.month == 2 else 0")
            .unwrap();
        assert_eq!(formula.variables(), vec!["basic", "gross_pay", "start_date"]);
    }

    #[test]
    fn test_formula_is_reusable_across_contexts() {
        let formula = Formula::parse("gross_pay * 0.1").unwrap();
        let mut context = EvalContext::new();
        context.set("gross_pay", Decimal::new(1000, 0));
        assert_eq!(formula.evaluate_amount(&context).unwrap(), Decimal::new(100, 0));
        context.set("gross_pay", Decimal::new(3000, 0));
        assert_eq!(formula.evaluate_amount(&context).unwrap(), Decimal::new(300, 0));
    }

    #[test]
    fn test_non_numeric_result_coerces_to_zero() {
        let formula = Formula::parse("'not a number'").unwrap();
        assert_eq!(formula.evaluate_amount(&EvalContext::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_sandbox_only_sees_whitelisted_functions() {
        for name in ["eval", "exec", "open", "getattr", "frappe"] {
            let err = Formula::parse(&format!("{}('x')", name)).unwrap_err();
            assert_eq!(err, FormulaError::UnknownFunction(name.to_string()));
        }
    }
}
