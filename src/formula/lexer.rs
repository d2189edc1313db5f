//! Tokenizer for formula text.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::FormulaError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal.
    Number(Decimal),
    /// Quoted string literal.
    Text(String),
    /// Identifier (variable, function or attribute name).
    Ident(String),
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `if`
    If,
    /// `else`
    Else,
    /// `True`
    True,
    /// `False`
    False,
    /// `None`
    None,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `%`
    Percent,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `.`
    Dot,
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

impl Token {
    /// Describes the token for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Text(s) => format!("string '{}'", s),
            Token::Ident(name) => format!("name '{}'", name),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::If => "if",
            Token::Else => "else",
            Token::True => "True",
            Token::False => "False",
            Token::None => "None",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Eq => "==",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Number(_) | Token::Text(_) | Token::Ident(_) => "",
        }
    }
}

/// A token with the character position it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Zero-based character offset into the formula.
    pub position: usize,
}

/// Splits formula text into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            let (number, next) = lex_number(&chars, i)?;
            tokens.push(Spanned {
                token: Token::Number(number),
                position: start,
            });
            i = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let token = match word.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "if" => Token::If,
                "else" => Token::Else,
                "True" => Token::True,
                "False" => Token::False,
                "None" => Token::None,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned {
                token,
                position: start,
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let (text, next) = lex_string(&chars, i)?;
            tokens.push(Spanned {
                token: Token::Text(text),
                position: start,
            });
            i = next;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (c, next) {
            ('*', Some('*')) => (Token::DoubleStar, 2),
            ('/', Some('/')) => (Token::DoubleSlash, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            _ => {
                return Err(FormulaError::UnexpectedChar {
                    ch: c,
                    position: start,
                });
            }
        };
        tokens.push(Spanned {
            token,
            position: start,
        });
        i += width;
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Decimal, usize), FormulaError> {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit) {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    let mut scientific = false;
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
            scientific = true;
        }
    }

    let text: String = chars[start..i].iter().collect();
    let normalized = if text.starts_with('.') {
        format!("0{}", text)
    } else {
        text.clone()
    };
    let parsed = if scientific {
        Decimal::from_scientific(&normalized)
    } else {
        Decimal::from_str(&normalized)
    };
    parsed
        .map(|n| (n, i))
        .map_err(|_| FormulaError::InvalidNumber {
            text,
            position: start,
        })
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), FormulaError> {
    let quote = chars[start];
    let mut text = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((text, i + 1)),
            '\\' if i + 1 < chars.len() => {
                let escaped = chars[i + 1];
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                i += 2;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }

    Err(FormulaError::UnterminatedString { position: start })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_tokenizes_arithmetic_with_two_char_operators() {
        assert_eq!(
            kinds("gross_pay // 12 ** 2 >= 1.5"),
            vec![
                Token::Ident("gross_pay".to_string()),
                Token::DoubleSlash,
                Token::Number(Decimal::new(12, 0)),
                Token::DoubleStar,
                Token::Number(Decimal::new(2, 0)),
                Token::Ge,
                Token::Number(Decimal::new(15, 1)),
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            kinds("True and not none"),
            vec![
                Token::True,
                Token::And,
                Token::Not,
                Token::Ident("none".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_literals_with_either_quote() {
        assert_eq!(
            kinds(r#"getdate('2026-02-01') "it\'s""#),
            vec![
                Token::Ident("getdate".to_string()),
                Token::LParen,
                Token::Text("2026-02-01".to_string()),
                Token::RParen,
                Token::Text("it's".to_string()),
            ]
        );
    }

    #[test]
    fn test_attribute_dot_is_not_a_number() {
        assert_eq!(
            kinds("start_date.month"),
            vec![
                Token::Ident("start_date".to_string()),
                Token::Dot,
                Token::Ident("month".to_string()),
            ]
        );
    }

    #[test]
    fn test_leading_dot_and_scientific_numbers() {
        assert_eq!(kinds(".5"), vec![Token::Number(Decimal::new(5, 1))]);
        assert_eq!(kinds("2e3"), vec![Token::Number(Decimal::new(2000, 0))]);
    }

    #[test]
    fn test_unexpected_character_reports_position() {
        let err = tokenize("gross_pay & 1").unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnexpectedChar {
                ch: '&',
                position: 10
            }
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("getdate('2026-01-01)").unwrap_err();
        assert_eq!(err, FormulaError::UnterminatedString { position: 8 });
    }

    #[test]
    fn test_positions_are_recorded() {
        let tokens = tokenize("a + bb").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 2, 4]);
    }
}
