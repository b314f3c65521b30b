//! Formula syntax tree and its resolved, evaluable form.
//!
//! Parsing yields an [`Expr`] that still refers to names. [`compile`] resolves
//! every name against a fixed scope (parameters, independent variables, the
//! constants `pi` and `e`, and the function table) and produces a [`Node`]
//! tree that only holds slot indices. Nothing outside that scope can be
//! reached; an unresolved name is an error before any evaluation happens.

use crate::formula::error::{FormulaError, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        1 + match &self.kind {
            ExprKind::Number(_) | ExprKind::Ident(_) => 0,
            ExprKind::Neg(inner) => inner.height(),
            ExprKind::Binary { lhs, rhs, .. } => lhs.height().max(rhs.height()),
            ExprKind::Call { args, .. } => args.iter().map(Expr::height).max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
        }
    }
}

/// The allow-listed math functions (all unary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Sqrt,
    Abs,
    Ln,
    Log10,
    Log2,
}

/// User-facing spellings. `log` is the natural logarithm.
const FUNCTIONS: &[(&str, Function)] = &[
    ("sin", Function::Sin),
    ("cos", Function::Cos),
    ("tan", Function::Tan),
    ("asin", Function::Asin),
    ("arcsin", Function::Asin),
    ("acos", Function::Acos),
    ("arccos", Function::Acos),
    ("atan", Function::Atan),
    ("arctan", Function::Atan),
    ("sinh", Function::Sinh),
    ("cosh", Function::Cosh),
    ("tanh", Function::Tanh),
    ("exp", Function::Exp),
    ("sqrt", Function::Sqrt),
    ("abs", Function::Abs),
    ("ln", Function::Ln),
    ("log", Function::Ln),
    ("log10", Function::Log10),
    ("log2", Function::Log2),
];

impl Function {
    pub fn lookup(name: &str) -> Option<Function> {
        FUNCTIONS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    /// Every accepted function name, aliases included.
    pub fn names() -> impl Iterator<Item = &'static str> {
        FUNCTIONS.iter().map(|(n, _)| *n)
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            Function::Sin => v.sin(),
            Function::Cos => v.cos(),
            Function::Tan => v.tan(),
            Function::Asin => v.asin(),
            Function::Acos => v.acos(),
            Function::Atan => v.atan(),
            Function::Sinh => v.sinh(),
            Function::Cosh => v.cosh(),
            Function::Tanh => v.tanh(),
            Function::Exp => v.exp(),
            Function::Sqrt => v.sqrt(),
            Function::Abs => v.abs(),
            Function::Ln => v.ln(),
            Function::Log10 => v.log10(),
            Function::Log2 => v.log2(),
        }
    }
}

/// Resolved expression: names replaced by slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Const(f64),
    /// Independent variable by column index.
    Input(usize),
    /// Parameter by position.
    Param(usize),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    Call(Function, Box<Node>),
}

impl Node {
    /// Evaluate with one row of inputs and a parameter vector. IEEE semantics
    /// apply: division by zero or a domain error yields `inf`/`NaN` rather
    /// than failing.
    pub fn eval(&self, inputs: &[f64], params: &[f64]) -> f64 {
        match self {
            Node::Const(v) => *v,
            Node::Input(i) => inputs[*i],
            Node::Param(k) => params[*k],
            Node::Neg(inner) => -inner.eval(inputs, params),
            Node::Binary(op, lhs, rhs) => op.apply(lhs.eval(inputs, params), rhs.eval(inputs, params)),
            Node::Call(f, arg) => f.apply(arg.eval(inputs, params)),
        }
    }
}

/// Names visible to a formula.
pub struct Scope<'a> {
    pub params: &'a [String],
    pub variables: &'a [String],
}

impl Scope<'_> {
    /// Parameters shadow variables (never both: construction rejects that)
    /// and the built-in constants.
    fn resolve(&self, name: &str) -> Option<Node> {
        if let Some(k) = self.params.iter().position(|p| p == name) {
            return Some(Node::Param(k));
        }
        if let Some(i) = self.variables.iter().position(|v| v == name) {
            return Some(Node::Input(i));
        }
        match name {
            "pi" => Some(Node::Const(std::f64::consts::PI)),
            "e" => Some(Node::Const(std::f64::consts::E)),
            _ => None,
        }
    }
}

/// Resolve every name in `expr` against `scope`.
pub fn compile(expr: &Expr, scope: &Scope<'_>) -> Result<Node, FormulaError> {
    match &expr.kind {
        ExprKind::Number(v) => Ok(Node::Const(*v)),
        ExprKind::Ident(name) => scope.resolve(name).ok_or_else(|| FormulaError::Resolve {
            message: if Function::lookup(name).is_some() {
                format!("function '{name}' needs an argument")
            } else {
                format!("undefined name '{name}'")
            },
            span: expr.span,
        }),
        ExprKind::Neg(inner) => Ok(Node::Neg(Box::new(compile(inner, scope)?))),
        ExprKind::Binary { op, lhs, rhs } => Ok(Node::Binary(
            *op,
            Box::new(compile(lhs, scope)?),
            Box::new(compile(rhs, scope)?),
        )),
        ExprKind::Call { name, args } => {
            let function = Function::lookup(name).ok_or_else(|| FormulaError::Resolve {
                message: format!("unknown function '{name}'"),
                span: expr.span,
            })?;
            match args.as_slice() {
                [arg] => Ok(Node::Call(function, Box::new(compile(arg, scope)?))),
                _ => Err(FormulaError::Resolve {
                    message: format!("'{name}' takes one argument, got {}", args.len()),
                    span: expr.span,
                }),
            }
        }
    }
}
