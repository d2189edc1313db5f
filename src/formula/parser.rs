//! Recursive-descent parser producing the formula syntax tree.
//!
//! Precedence, lowest first: conditional (`a if c else b`), `or`, `and`,
//! `not`, comparisons (chainable), `+ -`, `* / // %`, unary `+ -`, `**`,
//! then calls and attribute access.

use super::lexer::{Spanned, Token};
use super::value::Value;
use super::{FormulaError, MAX_NESTING_DEPTH, is_allowed_function};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
}

impl BinaryOp {
    /// The operator as written in formulas.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// The operator as written in formulas.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A node of the formula syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Value),
    /// A reference to a context variable.
    Variable(String),
    /// A unary arithmetic operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary arithmetic operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// A comparison chain such as `a < b <= c`.
    Compare {
        /// The first operand.
        first: Box<Expr>,
        /// Each following operator and operand.
        rest: Vec<(CompareOp, Expr)>,
    },
    /// Short-circuit `and`.
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit `or`.
    Or(Box<Expr>, Box<Expr>),
    /// Logical negation.
    Not(Box<Expr>),
    /// `then if condition else otherwise`
    Conditional {
        /// Value when the condition is truthy.
        then: Box<Expr>,
        /// The condition.
        condition: Box<Expr>,
        /// Value when the condition is falsy.
        otherwise: Box<Expr>,
    },
    /// A call to a whitelisted function.
    Call {
        /// The function name.
        function: String,
        /// Positional arguments.
        args: Vec<Expr>,
    },
    /// Attribute access such as `start_date.month`.
    Attribute {
        /// The expression the attribute is read from.
        target: Box<Expr>,
        /// The attribute name.
        name: String,
    },
}

impl Expr {
    /// Collects the names of every variable the expression reads.
    pub fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Unary { operand, .. } | Expr::Not(operand) => operand.collect_variables(names),
            Expr::Binary { left, right, .. } | Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::Compare { first, rest } => {
                first.collect_variables(names);
                for (_, operand) in rest {
                    operand.collect_variables(names);
                }
            }
            Expr::Conditional {
                then,
                condition,
                otherwise,
            } => {
                then.collect_variables(names);
                condition.collect_variables(names);
                otherwise.collect_variables(names);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
            Expr::Attribute { target, .. } => target.collect_variables(names),
        }
    }
}

/// Parses a token stream into a single expression.
pub fn parse(tokens: &[Spanned]) -> Result<Expr, FormulaError> {
    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.expression()?;
    match parser.peek() {
        Some(extra) => Err(parser.unexpected(extra)),
        None => Ok(expr),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    cursor: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.cursor)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek().is_some_and(|s| &s.token == token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let spanned = self.tokens.get(self.cursor);
        if spanned.is_some() {
            self.cursor += 1;
        }
        spanned
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), FormulaError> {
        match self.advance() {
            Some(s) if &s.token == token => Ok(()),
            Some(s) => Err(self.unexpected(s)),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn unexpected(&self, spanned: &Spanned) -> FormulaError {
        FormulaError::UnexpectedToken {
            found: spanned.token.describe(),
            position: spanned.position,
        }
    }

    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Accounts for one more level of left nesting built by a loop.
    ///
    /// The caller resets `depth` once its loop ends.
    fn deepen(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, FormulaError> {
        self.nested(|p| {
            let then = p.or_expr()?;
            if !p.eat(&Token::If) {
                return Ok(then);
            }
            let condition = p.or_expr()?;
            p.expect(&Token::Else)?;
            let otherwise = p.expression()?;
            Ok(Expr::Conditional {
                then: Box::new(then),
                condition: Box::new(condition),
                otherwise: Box::new(otherwise),
            })
        })
    }

    fn or_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.and_expr()?;
        let base = self.depth;
        while self.eat(&Token::Or) {
            self.deepen()?;
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.not_expr()?;
        let base = self.depth;
        while self.eat(&Token::And) {
            self.deepen()?;
            let right = self.not_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.depth = base;
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(&Token::Not) {
            let operand = self.nested(|p| p.not_expr())?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        let first = self.arithmetic()?;
        let mut rest = Vec::new();
        while let Some(op) = self.peek().and_then(|s| compare_op(&s.token)) {
            self.cursor += 1;
            rest.push((op, self.arithmetic()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn arithmetic(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.term()?;
        let base = self.depth;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => {
                    self.depth = base;
                    return Ok(left);
                }
            };
            self.cursor += 1;
            self.deepen()?;
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.factor()?;
        let base = self.depth;
        loop {
            let op = match self.peek().map(|s| &s.token) {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => {
                    self.depth = base;
                    return Ok(left);
                }
            };
            self.cursor += 1;
            self.deepen()?;
            let right = self.factor()?;
            left = binary(op, left, right);
        }
    }

    fn factor(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek().map(|s| &s.token) {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.cursor += 1;
        let operand = self.nested(|p| p.factor())?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.postfix()?;
        if self.eat(&Token::DoubleStar) {
            // Right-associative and binds tighter than a unary minus on its left.
            let exponent = self.nested(|p| p.factor())?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr, FormulaError> {
        let mut expr = self.primary()?;
        let base = self.depth;
        loop {
            if self.eat(&Token::Dot) {
                self.deepen()?;
                match self.advance() {
                    Some(Spanned {
                        token: Token::Ident(name),
                        ..
                    }) => {
                        expr = Expr::Attribute {
                            target: Box::new(expr),
                            name: name.clone(),
                        };
                    }
                    Some(other) => return Err(self.unexpected(other)),
                    None => return Err(FormulaError::UnexpectedEnd),
                }
            } else if self.check(&Token::LParen) {
                let function = match expr {
                    Expr::Variable(name) => name,
                    _ => {
                        let paren = &self.tokens[self.cursor];
                        return Err(self.unexpected(paren));
                    }
                };
                if !is_allowed_function(&function) {
                    return Err(FormulaError::UnknownFunction(function));
                }
                self.cursor += 1;
                self.deepen()?;
                let args = self.arguments()?;
                expr = Expr::Call { function, args };
            } else {
                self.depth = base;
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::Comma) {
                // Trailing comma before `)` is accepted.
                if self.eat(&Token::RParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(args);
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let spanned = self.advance().ok_or(FormulaError::UnexpectedEnd)?;
        match &spanned.token {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(*n))),
            Token::Text(s) => Ok(Expr::Literal(Value::Text(s.clone()))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::None => Ok(Expr::Literal(Value::None)),
            Token::Ident(name) => Ok(Expr::Variable(name.clone())),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected(spanned)),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn compare_op(token: &Token) -> Option<CompareOp> {
    match token {
        Token::Eq => Some(CompareOp::Eq),
        Token::Ne => Some(CompareOp::Ne),
        Token::Lt => Some(CompareOp::Lt),
        Token::Le => Some(CompareOp::Le),
        Token::Gt => Some(CompareOp::Gt),
        Token::Ge => Some(CompareOp::Ge),
        _ => None,
    }
}
