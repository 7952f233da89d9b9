use super::parser::{BinaryOp, Node, UnaryOp};
use crate::context::Context;
use crate::value::Value;

pub fn evaluate(node: &Node, ctx: Option<&dyn Context>) -> Value {
    match node {
        Node::Literal(v) => v.clone(),
        Node::Ident(path) => ctx.and_then(|c| c.get(path)).unwrap_or_default(),
        Node::Unary { op, operand } => {
            let v = evaluate(operand, ctx);
            match (op, v.as_f64()) {
                (UnaryOp::Neg, Some(n)) => Value::Float(-n),
                _ => v,
            }
        }
        Node::Binary { op, lhs, rhs } => binary(*op, evaluate(lhs, ctx), evaluate(rhs, ctx)),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Value {
    if let (BinaryOp::Add, Value::Str(a), Value::Str(b)) = (op, &lhs, &rhs) {
        return Value::Str(format!("{a}{b}"));
    }
    let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
        return Value::Null;
    };
    let n = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        // division by zero renders as 0, never inf/NaN
        BinaryOp::Div if b == 0.0 => 0.0,
        BinaryOp::Div => a / b,
    };
    Value::Float(n)
}
