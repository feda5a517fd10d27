//! Core data structures for the recorded computation graph.
//!
//! The graph is built from `Expr` nodes, which are reference-counted handles
//! to immutable `Node`s. Arithmetic on the recorded scalar types allocates new
//! nodes that point at their operands, so the DAG grows as a side effect of
//! running a user function.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::tape::TapeId;

/// Global counter for generating unique node IDs.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_node_id() -> u64 {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Unique identifier for a node in the computation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

/// The operation performed by a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// A constant value.
    Const(f64),
    /// A value that may be marked as an independent variable.
    /// Unmarked leaves behave like constants.
    Leaf(f64),
    /// Addition: children[0] + children[1]
    Add,
    /// Subtraction: children[0] - children[1]
    Sub,
    /// Multiplication: children[0] * children[1]
    Mul,
    /// Division: children[0] / children[1]
    Div,
    /// Negation: -children[0]
    Neg,
    /// Power with constant exponent: children[0]^exponent
    Powf(f64),
    /// Power with recorded exponent: children[0]^children[1]
    Pow,
    /// Exponential: exp(children[0])
    Exp,
    /// Natural logarithm: ln(children[0])
    Ln,
    /// Sine: sin(children[0])
    Sin,
    /// Cosine: cos(children[0])
    Cos,
    /// Tangent: tan(children[0])
    Tan,
    /// Hyperbolic sine: sinh(children[0])
    Sinh,
    /// Hyperbolic cosine: cosh(children[0])
    Cosh,
    /// Hyperbolic tangent: tanh(children[0])
    Tanh,
    /// Inverse sine: asin(children[0])
    Asin,
    /// Inverse cosine: acos(children[0])
    Acos,
    /// Inverse tangent: atan(children[0])
    Atan,
    /// Inverse hyperbolic sine: asinh(children[0])
    Asinh,
    /// Inverse hyperbolic cosine: acosh(children[0])
    Acosh,
    /// Inverse hyperbolic tangent: atanh(children[0])
    Atanh,
    /// Square root: sqrt(children[0])
    Sqrt,
    /// Absolute value: |children[0]|
    Abs,
    /// Sign: -1, 0 or 1 (derivative is zero)
    Sign,
    /// exp(children[0]) - 1
    ExpM1,
    /// ln(1 + children[0])
    Ln1p,
    /// Error function: erf(children[0])
    Erf,
}

impl Op {
    /// Number of operands the operation consumes.
    pub fn arity(&self) -> usize {
        match self {
            Op::Const(_) | Op::Leaf(_) => 0,
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow => 2,
            _ => 1,
        }
    }

    /// Short lowercase name, used in error messages and generated code.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Const(_) => "const",
            Op::Leaf(_) => "leaf",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Neg => "neg",
            Op::Powf(_) => "powf",
            Op::Pow => "pow",
            Op::Exp => "exp",
            Op::Ln => "ln",
            Op::Sin => "sin",
            Op::Cos => "cos",
            Op::Tan => "tan",
            Op::Sinh => "sinh",
            Op::Cosh => "cosh",
            Op::Tanh => "tanh",
            Op::Asin => "asin",
            Op::Acos => "acos",
            Op::Atan => "atan",
            Op::Asinh => "asinh",
            Op::Acosh => "acosh",
            Op::Atanh => "atanh",
            Op::Sqrt => "sqrt",
            Op::Abs => "abs",
            Op::Sign => "sign",
            Op::ExpM1 => "exp_m1",
            Op::Ln1p => "ln_1p",
            Op::Erf => "erf",
        }
    }
}

/// Position of an independent variable inside a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Independent {
    pub tape: TapeId,
    pub index: usize,
}

/// Internal node structure holding the operation, children, and metadata.
#[derive(Debug)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// The operation this node performs.
    pub op: Op,
    /// Child expressions (operands).
    pub children: Vec<Expr>,
    /// Set at most once, when the leaf becomes an independent variable.
    independent: OnceLock<Independent>,
}

impl Drop for Node {
    fn drop(&mut self) {
        // Unlink uniquely owned descendants iteratively; long chains would
        // otherwise recurse once per node.
        let mut stack: Vec<Expr> = std::mem::take(&mut self.children);
        while let Some(expr) = stack.pop() {
            if let Ok(mut node) = Arc::try_unwrap(expr.0) {
                stack.append(&mut node.children);
            }
        }
    }
}

/// An expression in the computation graph.
///
/// Cloning an `Expr` only increments a reference count, so the same
/// subexpression can be shared by any number of parents.
#[derive(Debug, Clone)]
pub struct Expr(pub(crate) Arc<Node>);

impl Expr {
    fn from_parts(op: Op, children: Vec<Expr>) -> Self {
        Expr(Arc::new(Node {
            id: NodeId(next_node_id()),
            op,
            children,
            independent: OnceLock::new(),
        }))
    }

    /// Create a leaf holding `value`. It can later be marked independent.
    pub fn leaf(value: f64) -> Self {
        Expr::from_parts(Op::Leaf(value), vec![])
    }

    /// Create a constant expression.
    pub fn constant(value: f64) -> Self {
        Expr::from_parts(Op::Const(value), vec![])
    }

    /// Create an operation node. The number of children must match the arity.
    pub fn apply(op: Op, children: Vec<Expr>) -> Self {
        debug_assert_eq!(op.arity(), children.len(), "arity mismatch for {}", op.name());
        Expr::from_parts(op, children)
    }

    /// Get the unique ID of this expression.
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Get the operation of this expression.
    pub fn op(&self) -> &Op {
        &self.0.op
    }

    /// Get the child expressions.
    pub fn children(&self) -> &[Expr] {
        &self.0.children
    }

    /// Whether this is a leaf created from a numeric value.
    pub fn is_leaf(&self) -> bool {
        matches!(self.0.op, Op::Leaf(_))
    }

    /// The constant or leaf value, if this node has one.
    pub fn literal(&self) -> Option<f64> {
        match self.0.op {
            Op::Const(v) | Op::Leaf(v) => Some(v),
            _ => None,
        }
    }

    /// Where this leaf sits in a recording, if it has been marked independent.
    pub fn independent(&self) -> Option<Independent> {
        self.0.independent.get().copied()
    }

    /// Mark this leaf as independent variable `index` of `tape`.
    ///
    /// This is a one-shot transition: marking a leaf that is already
    /// independent fails, whichever tape it belongs to.
    pub fn mark_independent(&self, tape: TapeId, index: usize) -> Result<(), GraphError> {
        if !self.is_leaf() {
            return Err(GraphError::NotALeaf {
                op: self.0.op.name(),
            });
        }
        self.0
            .independent
            .set(Independent { tape, index })
            .map_err(|_| {
                // set() only fails when a value is present
                let existing = self.independent().unwrap_or(Independent { tape, index });
                GraphError::AlreadyIndependent {
                    node: self.id(),
                    tape: existing.tape,
                    index: existing.index,
                }
            })
    }
}
