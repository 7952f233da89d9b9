use super::lexer::Token;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            _ => None,
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Add | BinaryOp::Sub => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Value),
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

impl Node {
    /// Visits every identifier in evaluation order.
    pub fn for_each_ident(&self, f: &mut impl FnMut(&str)) {
        match self {
            Node::Literal(_) => {}
            Node::Ident(name) => f(name),
            Node::Unary { operand, .. } => operand.for_each_ident(f),
            Node::Binary { lhs, rhs, .. } => {
                lhs.for_each_ident(f);
                rhs.for_each_ident(f);
            }
        }
    }
}

/// Operators and parentheses allowed in one expression. Past this the rest of
/// the input is dropped, which keeps the tree shallow enough to walk
/// recursively.
pub const MAX_NESTING: usize = 256;

/// Precedence-climbing parser over a token slice. It never fails: anything
/// that cannot start an operand becomes a null literal and trailing tokens
/// are ignored.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    nesting: usize,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    pub fn parse(mut self) -> Node {
        self.expression(1)
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_binary(&self) -> Option<BinaryOp> {
        match self.peek()? {
            Token::Op(c) => BinaryOp::from_char(*c),
            _ => None,
        }
    }

    /// Spends one unit of the nesting budget. When it is gone the remaining
    /// tokens are skipped.
    fn nest(&mut self) -> bool {
        if self.nesting >= MAX_NESTING {
            log::debug!("expression nests deeper than {MAX_NESTING}; truncating");
            self.pos = self.tokens.len();
            return false;
        }
        self.nesting += 1;
        true
    }

    fn expression(&mut self, min_prec: u8) -> Node {
        let mut lhs = self.unary();
        while let Some(op) = self.peek_binary() {
            if op.precedence() < min_prec || !self.nest() {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(op.precedence() + 1);
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    fn unary(&mut self) -> Node {
        let opens = matches!(
            self.peek(),
            Some(Token::Op('-') | Token::Op('+') | Token::LParen)
        );
        if opens && !self.nest() {
            return Node::Literal(Value::Null);
        }
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Node::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(self.unary()),
                }
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                Node::Unary {
                    op: UnaryOp::Plus,
                    operand: Box::new(self.unary()),
                }
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expression(1);
                if matches!(self.peek(), Some(Token::RParen)) {
                    self.pos += 1;
                }
                inner
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Node {
        let Some(token) = self.peek() else {
            return Node::Literal(Value::Null);
        };
        self.pos += 1;
        match token {
            Token::Ident(name) => Node::Ident(name.clone()),
            Token::Number(n) => Node::Literal(Value::Float(*n)),
            Token::Str(s) => Node::Literal(Value::Str(s.clone())),
            Token::Op(_) | Token::LParen | Token::RParen => Node::Literal(Value::Null),
        }
    }
}
