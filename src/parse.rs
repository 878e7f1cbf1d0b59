use std::fmt::{Display, Formatter};

use pest::error::{ErrorVariant, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::lexical::Keyword;

#[derive(Parser)]
#[grammar = "zero.pest"]
struct ZeroParser;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected {expected} at column {column}")]
    Expected { expected: String, column: usize },

    #[error("unexpected character '{found}' at column {column}, expected {expected}")]
    UnexpectedCharacter {
        found: char,
        expected: String,
        column: usize,
    },

    #[error("unknown statement '{text}'")]
    UnknownStatement { text: String },

    #[error("integer literal '{literal}' is out of range")]
    IntegerOutOfRange { literal: String },
}

/// Why a line could not be turned into a statement.
///
/// Running out of native stack is not the line's fault, so it is kept apart
/// from [`SyntaxError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("parser ran out of stack")]
    StackExhausted,
}

type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Message pest reports when too little native stack is left to parse.
const STACK_LIMIT_MESSAGE: &str = "stack limit reached";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    GreaterEqual,
    LessEqual,
    Greater,
    Less,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        Some(match symbol {
            "&" => BinaryOp::And,
            "|" => BinaryOp::Or,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            ">=" => BinaryOp::GreaterEqual,
            "<=" => BinaryOp::LessEqual,
            ">" => BinaryOp::Greater,
            "<" => BinaryOp::Less,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "%" => BinaryOp::Modulo,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::Less => "<",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal {
        value: i64,
    },
    Variable {
        name: String,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal { value } => write!(f, "{value}"),
            Expr::Variable { name } => write!(f, "{name}"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Binary { lhs, op, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// One line of a program.
///
/// Block statements carry only their header; the body lives on the following
/// lines of the line table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    While { condition: Expr },
    If { condition: Expr },
    Return { retval: Expr },
    Break,
    Continue,
    Print { expr: Expr },
    Let { name: String, value: Expr },
    FunctionDef { name: String, params: Vec<String> },
    Empty,
}

impl Stmt {
    pub fn parse(line: &str) -> Result<Stmt> {
        let Some((keyword, rest)) = Keyword::split(line) else {
            if line.is_empty() {
                return Ok(Stmt::Empty);
            }
            return Err(SyntaxError::UnknownStatement {
                text: line.to_string(),
            }
            .into());
        };
        let offset = line.len() - rest.len();
        Ok(match keyword {
            Keyword::While => Stmt::While {
                condition: parse_expr_at(rest, offset)?,
            },
            Keyword::If => Stmt::If {
                condition: parse_expr_at(rest, offset)?,
            },
            Keyword::Return => Stmt::Return {
                retval: parse_expr_at(rest, offset)?,
            },
            Keyword::Break => Stmt::Break,
            Keyword::Continue => Stmt::Continue,
            Keyword::Print => Stmt::Print {
                expr: parse_expr_at(rest, offset)?,
            },
            Keyword::Let => {
                let mut inner = parse_rule(Rule::assignment, rest, offset)?;
                let (Some(name), Some(value)) = (
                    inner.find(|pair| pair.as_rule() == Rule::ident),
                    inner.find(|pair| pair.as_rule() == Rule::boolean),
                ) else {
                    unreachable!("assignment is `ident = boolean`");
                };
                Stmt::Let {
                    name: name.as_str().to_string(),
                    value: Expr::try_from(value)?,
                }
            }
            Keyword::Func => {
                let mut idents = parse_rule(Rule::signature, rest, offset)?
                    .filter(|pair| pair.as_rule() == Rule::ident)
                    .map(|pair| pair.as_str().to_string());
                let Some(name) = idents.next() else {
                    unreachable!("signature starts with the function name");
                };
                Stmt::FunctionDef {
                    name,
                    params: idents.collect(),
                }
            }
        })
    }
}

pub fn parse_expr(text: &str) -> Result<Expr> {
    parse_expr_at(text, 0)
}

fn parse_expr_at(text: &str, offset: usize) -> Result<Expr> {
    let mut inner = parse_rule(Rule::expression, text, offset)?;
    let Some(boolean) = inner.next() else {
        unreachable!("expression is `boolean EOI`");
    };
    Ok(Expr::try_from(boolean)?)
}

/// Runs `rule` over `text` and returns the children of the matched rule.
///
/// `offset` is where `text` starts within its line, so columns in errors point
/// at the original line.
fn parse_rule(rule: Rule, text: &str, offset: usize) -> Result<Pairs<'_, Rule>> {
    let mut pairs =
        ZeroParser::parse(rule, text).map_err(|error| syntax_error(error, text, offset))?;
    let Some(pair) = pairs.next() else {
        unreachable!("a successful parse yields its rule");
    };
    Ok(pair.into_inner())
}

fn syntax_error(error: pest::error::Error<Rule>, text: &str, offset: usize) -> ParseError {
    let pos = match &error.location {
        InputLocation::Pos(pos) => *pos,
        InputLocation::Span((start, _)) => *start,
    };
    let expected = match &error.variant {
        ErrorVariant::ParsingError { positives, .. } => describe(positives),
        ErrorVariant::CustomError { message } if message == STACK_LIMIT_MESSAGE => {
            return ParseError::StackExhausted;
        }
        ErrorVariant::CustomError { message } => message.clone(),
    };
    let column = offset + text[..pos].chars().count() + 1;
    let error = match text[pos..].chars().next() {
        Some(found) => SyntaxError::UnexpectedCharacter {
            found,
            expected,
            column,
        },
        None => SyntaxError::Expected { expected, column },
    };
    error.into()
}

fn describe(rules: &[Rule]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for rule in rules {
        let name = match rule {
            Rule::bool_op | Rule::cmp_op | Rule::add_op | Rule::mul_op => "operator",
            Rule::assign => "`=`",
            Rule::lparen => "`(`",
            Rule::rparen => "`)`",
            Rule::ident => "identifier",
            Rule::EOI => "end of line",
            _ => "expression",
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    if names.is_empty() {
        return "expression".to_string();
    }
    names.join(" or ")
}

impl TryFrom<Pair<'_, Rule>> for Expr {
    type Error = SyntaxError;

    fn try_from(pair: Pair<'_, Rule>) -> Result<Self, SyntaxError> {
        match pair.as_rule() {
            Rule::boolean | Rule::compare | Rule::addsub | Rule::term => {
                let mut inner = pair.into_inner();
                let Some(first) = inner.next() else {
                    unreachable!("precedence levels have a leading operand");
                };
                let mut lhs = Expr::try_from(first)?;
                while let (Some(op), Some(rhs)) = (inner.next(), inner.next()) {
                    let Some(op) = BinaryOp::from_symbol(op.as_str()) else {
                        unreachable!("operator rules only match known symbols");
                    };
                    lhs = Expr::Binary {
                        lhs: Box::new(lhs),
                        op,
                        rhs: Box::new(rhs.try_into()?),
                    };
                }
                Ok(lhs)
            }
            Rule::group => {
                let Some(inner) = pair
                    .into_inner()
                    .find(|pair| pair.as_rule() == Rule::boolean)
                else {
                    unreachable!("group wraps a boolean");
                };
                inner.try_into()
            }
            Rule::call => {
                let mut inner = pair.into_inner();
                let Some(name) = inner.next() else {
                    unreachable!("call starts with the callee name");
                };
                let args = inner
                    .filter(|pair| pair.as_rule() == Rule::boolean)
                    .map(Expr::try_from)
                    .collect::<Result<_, SyntaxError>>()?;
                Ok(Expr::Call {
                    name: name.as_str().to_string(),
                    args,
                })
            }
            Rule::integer => {
                let literal = pair.as_str();
                let value = literal
                    .parse()
                    .map_err(|_| SyntaxError::IntegerOutOfRange {
                        literal: literal.to_string(),
                    })?;
                Ok(Expr::Literal { value })
            }
            Rule::ident => Ok(Expr::Variable {
                name: pair.as_str().to_string(),
            }),
            rule => unreachable!("not an expression rule: {rule:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn shape(text: &str) -> String {
        parse_expr(text).unwrap().to_string()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(shape("2 + 3 * 4"), "(2 + (3 * 4))");
        assert_eq!(shape("(2 + 3) * 4"), "((2 + 3) * 4)");
        assert_eq!(shape("10 - 3 - 2"), "((10 - 3) - 2)");
        assert_eq!(shape("3 > 2 & 1 < 0"), "((3 > 2) & (1 < 0))");
        assert_eq!(shape("a == b | c != d"), "((a == b) | (c != d))");
    }

    #[test]
    fn calls_and_variables() {
        assert_eq!(shape("add(1, x * 2)"), "add(1, (x * 2))");
        assert_eq!(shape("f ()"), "f()");
        assert_eq!(shape("_tmp1"), "_tmp1");
    }

    #[test]
    fn integer_literal_bounds() {
        assert_eq!(
            parse_expr("9223372036854775807").unwrap(),
            Expr::Literal { value: i64::MAX }
        );
        assert_eq!(
            parse_expr("9223372036854775808").unwrap_err(),
            ParseError::Syntax(SyntaxError::IntegerOutOfRange {
                literal: "9223372036854775808".to_string(),
            })
        );
    }

    #[test]
    fn missing_close_paren_is_expected_token() {
        assert!(matches!(
            parse_expr("(1 + 2").unwrap_err(),
            ParseError::Syntax(SyntaxError::Expected { column: 7, .. })
        ));
    }

    #[test]
    fn stray_character_is_reported() {
        assert!(matches!(
            parse_expr("1 $ 2").unwrap_err(),
            ParseError::Syntax(SyntaxError::UnexpectedCharacter { found: '$', .. })
        ));
        assert!(matches!(
            parse_expr("-1").unwrap_err(),
            ParseError::Syntax(SyntaxError::UnexpectedCharacter { found: '-', column: 1, .. })
        ));
    }

    #[test]
    fn statements() {
        assert_eq!(
            Stmt::parse("let x = 1 + 2").unwrap(),
            Stmt::Let {
                name: "x".to_string(),
                value: parse_expr("1 + 2").unwrap(),
            }
        );
        assert_eq!(
            Stmt::parse("func add(a, b)").unwrap(),
            Stmt::FunctionDef {
                name: "add".to_string(),
                params: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(
            Stmt::parse("func noop()").unwrap(),
            Stmt::FunctionDef {
                name: "noop".to_string(),
                params: vec![],
            }
        );
        assert_eq!(Stmt::parse("continue").unwrap(), Stmt::Continue);
        assert_eq!(Stmt::parse("").unwrap(), Stmt::Empty);
    }

    #[test]
    fn malformed_statements() {
        assert_eq!(
            Stmt::parse("goto 10").unwrap_err(),
            ParseError::Syntax(SyntaxError::UnknownStatement {
                text: "goto 10".to_string(),
            })
        );
        assert!(matches!(
            Stmt::parse("let x 1").unwrap_err(),
            ParseError::Syntax(SyntaxError::UnexpectedCharacter { found: '1', column: 7, .. })
        ));
        assert!(matches!(
            Stmt::parse("let = 1").unwrap_err(),
            ParseError::Syntax(SyntaxError::UnexpectedCharacter { found: '=', .. })
        ));
    }

    #[test]
    fn stack_limit_is_not_a_syntax_error() {
        let text = "down(n - 1)";
        let limit = pest::error::Error::<Rule>::new_from_pos(
            ErrorVariant::CustomError {
                message: STACK_LIMIT_MESSAGE.to_string(),
            },
            pest::Position::from_start(text),
        );
        assert_eq!(syntax_error(limit, text, 7), ParseError::StackExhausted);

        let other = pest::error::Error::<Rule>::new_from_pos(
            ErrorVariant::CustomError {
                message: "call limit reached".to_string(),
            },
            pest::Position::from_start(text),
        );
        assert!(matches!(
            syntax_error(other, text, 7),
            ParseError::Syntax(SyntaxError::UnexpectedCharacter { found: 'd', column: 8, .. })
        ));
    }
}
