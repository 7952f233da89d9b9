//! # Binding expressions
//!
//! A deliberately tiny formula language for property bindings: arithmetic on
//! numbers, `+` on two strings, parentheses, and dotted property reads.
//!
//! ```rust
//! use weave_core::{Scope, Value, parse_expression};
//!
//! let scope = Scope::new();
//! scope.set("price", 10);
//! scope.set("quantity", 5);
//!
//! let total = parse_expression("price * quantity");
//! assert_eq!(total.evaluate(Some(&scope)), Value::Float(50.0));
//! assert_eq!(total.dependencies(), ["price", "quantity"]);
//! ```
//!
//! Grammar, lowest to highest binding:
//!
//! ```text
//! expression := unary (("+" | "-" | "*" | "/") unary)*   // * and / bind tighter
//! unary      := ("+" | "-") unary | "(" expression ")" | primary
//! primary    := identifier | number | string
//! ```
//!
//! Nothing here ever fails. Unknown characters are skipped by the lexer, a
//! token that cannot start an operand parses as `null`, and evaluation
//! produces `null` for operand types it has no rule for. Numbers are always
//! `f64`; division by zero yields `0.0`.
//!
//! Dependencies are the root segments (`user` for `user.name`) of every
//! identifier in operand position, de-duplicated in first-use order.

mod eval;
mod lexer;
mod parser;

use std::fmt;

use smallvec::SmallVec;

use crate::context::Context;
use crate::value::Value;

pub use lexer::{Token, tokenize};
pub use parser::{BinaryOp, Node, UnaryOp};

/// A parsed expression. Immutable once built; evaluate it as often as needed
/// against different contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tokens: Vec<Token>,
    root: Node,
    deps: SmallVec<[String; 4]>,
}

impl Expression {
    pub fn parse(source: &str) -> Self {
        let tokens = tokenize(source);
        let root = parser::Parser::new(&tokens).parse();

        let mut deps: SmallVec<[String; 4]> = SmallVec::new();
        root.for_each_ident(&mut |name| {
            let head = name.split('.').next().unwrap_or(name);
            if !deps.iter().any(|d| d == head) {
                deps.push(head.to_string());
            }
        });

        Self {
            source: source.to_string(),
            tokens,
            root,
            deps,
        }
    }

    pub fn evaluate(&self, ctx: Option<&dyn Context>) -> Value {
        eval::evaluate(&self.root, ctx)
    }

    /// Root names of the state this expression reads.
    pub fn dependencies(&self) -> &[String] {
        &self.deps
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn ast(&self) -> &Node {
        &self.root
    }
}

/// The normalized token stream, space separated.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

pub fn parse_expression(source: &str) -> Expression {
    Expression::parse(source)
}
