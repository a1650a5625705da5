//! Restricted arithmetic expressions for the `expression` generator.
//!
//! Expressions are parsed once into a small AST. Every identifier is resolved
//! at parse time against a fixed whitelist, so an expression that names
//! anything else is rejected before the simulation starts.
//!
//! Available names:
//!
//! | name     | meaning                                        |
//! |----------|------------------------------------------------|
//! | `prev`   | previous result (`None` on the first call)     |
//! | `count`  | number of successful evaluations so far        |
//! | `random` | uniform draw in `[0, 1)`, fresh per evaluation |
//! | `time`   | wall clock in seconds since the Unix epoch     |
//! | `pi`, `e`| math constants (also `math.pi`, `math.e`)      |
//!
//! Functions: `randint`, `uniform`, `abs`, `min`, `max`, `round`, `floor`,
//! `ceil`, `sqrt`, `sin`, `cos`, `tan`, `exp`, `log`, `pow`. The math helpers
//! may also be written with a `math.` prefix.
//!
//! Operators follow Python precedence: `if`/`else`, `or`, `and`, `not`,
//! comparisons (chainable), `+ -`, `* / // %`, unary `- +`, `**`.

mod eval;
mod parser;

pub use eval::{EvalContext, Scalar};

use rand::rngs::StdRng;
use thiserror::Error;

/// Errors from compiling or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("invalid expression '{source_text}': {message}")]
    Syntax {
        source_text: String,
        message: String,
    },

    #[error("expression '{source_text}' failed: {message}")]
    Eval {
        source_text: String,
        message: String,
    },
}

/// A compiled expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse and check `source`.
    pub fn compile(source: &str) -> Result<Self, ExpressionError> {
        let ast = parser::parse(source).map_err(|message| ExpressionError::Syntax {
            source_text: source.to_string(),
            message,
        })?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against the given variables.
    pub fn evaluate(&self, ctx: &mut EvalContext<'_>) -> Result<Scalar, ExpressionError> {
        eval::eval(&self.ast, ctx).map_err(|message| ExpressionError::Eval {
            source_text: self.source.clone(),
            message,
        })
    }
}

/// Evaluate a one-off expression; mostly useful in tests.
pub fn evaluate_once(
    source: &str,
    prev: Scalar,
    count: i64,
    rng: &mut StdRng,
) -> Result<Scalar, ExpressionError> {
    let expression = Expression::compile(source)?;
    let mut ctx = EvalContext {
        prev,
        count,
        random: 0.5,
        time: 0.0,
        rng,
    };
    expression.evaluate(&mut ctx)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Scalar),
    Var(Var),
    Neg(Box<Expr>),
    Pos(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    IfElse {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Var {
    Prev,
    Count,
    Random,
    Time,
    Pi,
    E,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    Randint,
    Uniform,
    Abs,
    Min,
    Max,
    Round,
    Floor,
    Ceil,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Pow,
}

impl Func {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Func::Randint => "randint",
            Func::Uniform => "uniform",
            Func::Abs => "abs",
            Func::Min => "min",
            Func::Max => "max",
            Func::Round => "round",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Sqrt => "sqrt",
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Pow => "pow",
        }
    }

    /// Minimum and optional maximum argument count.
    pub(crate) fn arity(self) -> (usize, Option<usize>) {
        match self {
            Func::Randint | Func::Uniform | Func::Pow => (2, Some(2)),
            Func::Round | Func::Log => (1, Some(2)),
            Func::Min | Func::Max => (2, None),
            _ => (1, Some(1)),
        }
    }

    /// Look up a bare function name.
    pub(crate) fn lookup(name: &str) -> Option<Func> {
        let func = match name {
            "randint" => Func::Randint,
            "uniform" => Func::Uniform,
            "abs" => Func::Abs,
            "min" => Func::Min,
            "max" => Func::Max,
            "round" => Func::Round,
            other => return Func::lookup_math(other),
        };
        Some(func)
    }

    /// Look up a function reachable as `math.<name>`.
    pub(crate) fn lookup_math(name: &str) -> Option<Func> {
        let func = match name {
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "sqrt" => Func::Sqrt,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "exp" => Func::Exp,
            "log" => Func::Log,
            "pow" => Func::Pow,
            "fabs" => Func::Abs,
            _ => return None,
        };
        Some(func)
    }
}
