//! Expression evaluation over a small numeric value model.
//!
//! Integers stay integers under `+ - * // % **` (non-negative exponent) and
//! promote to floats otherwise. `/` always produces a float. Booleans count as
//! 0 and 1 in arithmetic.

use super::{BinOp, CmpOp, Expr, Func, Var};
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::f64::consts::{E, PI};

/// Runtime value of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Python-style truthiness.
    pub fn truthy(self) -> bool {
        match self {
            Scalar::None => false,
            Scalar::Bool(b) => b,
            Scalar::Int(i) => i != 0,
            Scalar::Float(f) => f != 0.0,
        }
    }

    /// Convert to JSON. Non-finite floats have no JSON form.
    pub fn to_json(self) -> Result<Value, String> {
        match self {
            Scalar::None => Ok(Value::Null),
            Scalar::Bool(b) => Ok(Value::Bool(b)),
            Scalar::Int(i) => Ok(Value::from(i)),
            Scalar::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| format!("result {f} is not a finite number")),
        }
    }

    fn num(self, context: &str) -> Result<Num, String> {
        match self {
            Scalar::None => Err(format!("unsupported operand None for '{context}'")),
            Scalar::Bool(b) => Ok(Num::Int(i64::from(b))),
            Scalar::Int(i) => Ok(Num::Int(i)),
            Scalar::Float(f) => Ok(Num::Float(f)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn into_scalar(self) -> Scalar {
        match self {
            Num::Int(i) => Scalar::Int(i),
            Num::Float(f) => Scalar::Float(f),
        }
    }
}

/// Variables visible to one evaluation.
pub struct EvalContext<'a> {
    pub prev: Scalar,
    pub count: i64,
    pub random: f64,
    pub time: f64,
    /// Source for `randint` and `uniform`
    pub rng: &'a mut StdRng,
}

pub(crate) fn eval(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Scalar, String> {
    match expr {
        Expr::Literal(value) => Ok(*value),
        Expr::Var(var) => Ok(match var {
            Var::Prev => ctx.prev,
            Var::Count => Scalar::Int(ctx.count),
            Var::Random => Scalar::Float(ctx.random),
            Var::Time => Scalar::Float(ctx.time),
            Var::Pi => Scalar::Float(PI),
            Var::E => Scalar::Float(E),
        }),
        Expr::Neg(inner) => match eval(inner, ctx)?.num("unary -")? {
            Num::Int(i) => i
                .checked_neg()
                .map(Scalar::Int)
                .ok_or_else(|| "integer overflow".to_string()),
            Num::Float(f) => Ok(Scalar::Float(-f)),
        },
        Expr::Pos(inner) => Ok(eval(inner, ctx)?.num("unary +")?.into_scalar()),
        Expr::Binary(op, left, right) => {
            let a = eval(left, ctx)?;
            let b = eval(right, ctx)?;
            arith(*op, a, b)
        }
        Expr::Compare(first, rest) => {
            let mut left = eval(first, ctx)?;
            for (op, rhs) in rest {
                let right = eval(rhs, ctx)?;
                if !compare(*op, left, right)? {
                    return Ok(Scalar::Bool(false));
                }
                left = right;
            }
            Ok(Scalar::Bool(true))
        }
        Expr::And(left, right) => {
            let a = eval(left, ctx)?;
            if a.truthy() {
                eval(right, ctx)
            } else {
                Ok(a)
            }
        }
        Expr::Or(left, right) => {
            let a = eval(left, ctx)?;
            if a.truthy() {
                Ok(a)
            } else {
                eval(right, ctx)
            }
        }
        Expr::Not(inner) => Ok(Scalar::Bool(!eval(inner, ctx)?.truthy())),
        Expr::IfElse {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, ctx)?.truthy() {
                eval(then, ctx)
            } else {
                eval(otherwise, ctx)
            }
        }
        Expr::Call(func, args) => {
            let values = args
                .iter()
                .map(|arg| eval(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            call(*func, &values, ctx.rng)
        }
    }
}

fn arith(op: BinOp, a: Scalar, b: Scalar) -> Result<Scalar, String> {
    match (a.num(op.symbol())?, b.num(op.symbol())?) {
        (Num::Int(l), Num::Int(r)) => int_arith(op, l, r),
        (l, r) => float_arith(op, l.as_f64(), r.as_f64()),
    }
}

fn int_arith(op: BinOp, l: i64, r: i64) -> Result<Scalar, String> {
    let overflow = || "integer overflow".to_string();
    match op {
        BinOp::Add => l.checked_add(r).map(Scalar::Int).ok_or_else(overflow),
        BinOp::Sub => l.checked_sub(r).map(Scalar::Int).ok_or_else(overflow),
        BinOp::Mul => l.checked_mul(r).map(Scalar::Int).ok_or_else(overflow),
        BinOp::Div => float_arith(op, l as f64, r as f64),
        BinOp::FloorDiv => {
            if r == 0 {
                return Err("integer division by zero".to_string());
            }
            let q = l.checked_div(r).ok_or_else(overflow)?;
            let adjust = l % r != 0 && ((l < 0) != (r < 0));
            Ok(Scalar::Int(if adjust { q - 1 } else { q }))
        }
        BinOp::Mod => {
            if r == 0 {
                return Err("integer modulo by zero".to_string());
            }
            let m = l.checked_rem(r).ok_or_else(overflow)?;
            let adjust = m != 0 && ((m < 0) != (r < 0));
            Ok(Scalar::Int(if adjust { m + r } else { m }))
        }
        BinOp::Pow if r >= 0 => match l {
            0 | 1 => Ok(Scalar::Int(if r == 0 { 1 } else { l })),
            -1 => Ok(Scalar::Int(if r % 2 == 0 { 1 } else { -1 })),
            _ => u32::try_from(r)
                .ok()
                .and_then(|exp| l.checked_pow(exp))
                .map(Scalar::Int)
                .ok_or_else(overflow),
        },
        BinOp::Pow => float_arith(op, l as f64, r as f64),
    }
}

fn float_arith(op: BinOp, l: f64, r: f64) -> Result<Scalar, String> {
    let zero_divisor = |what: &str| {
        if r == 0.0 {
            Err(format!("float {what} by zero"))
        } else {
            Ok(())
        }
    };
    let value = match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div => {
            zero_divisor("division")?;
            l / r
        }
        BinOp::FloorDiv => {
            zero_divisor("floor division")?;
            (l / r).floor()
        }
        BinOp::Mod => {
            zero_divisor("modulo")?;
            let m = l % r;
            if m != 0.0 && ((m < 0.0) != (r < 0.0)) {
                m + r
            } else {
                m
            }
        }
        BinOp::Pow => {
            if l == 0.0 && r < 0.0 {
                return Err("0.0 cannot be raised to a negative power".to_string());
            }
            let p = l.powf(r);
            if p.is_nan() {
                return Err("math domain error".to_string());
            }
            p
        }
    };
    Ok(Scalar::Float(value))
}

fn scalar_eq(a: Scalar, b: Scalar) -> bool {
    match (a, b) {
        (Scalar::None, Scalar::None) => true,
        (Scalar::None, _) | (_, Scalar::None) => false,
        _ => matches!(ordering(a, b), Ok(Some(Ordering::Equal))),
    }
}

fn ordering(a: Scalar, b: Scalar) -> Result<Option<Ordering>, String> {
    let (x, y) = (a.num("comparison")?, b.num("comparison")?);
    Ok(match (x, y) {
        (Num::Int(l), Num::Int(r)) => Some(l.cmp(&r)),
        _ => x.as_f64().partial_cmp(&y.as_f64()),
    })
}

fn compare(op: CmpOp, a: Scalar, b: Scalar) -> Result<bool, String> {
    let ordered = |test: fn(Ordering) -> bool| -> Result<bool, String> {
        ordering(a, b)
            .map(|ord| ord.is_some_and(test))
            .map_err(|_| format!("'{}' not supported with None", op.symbol()))
    };
    match op {
        CmpOp::Eq => Ok(scalar_eq(a, b)),
        CmpOp::Ne => Ok(!scalar_eq(a, b)),
        CmpOp::Lt => ordered(Ordering::is_lt),
        CmpOp::Le => ordered(Ordering::is_le),
        CmpOp::Gt => ordered(Ordering::is_gt),
        CmpOp::Ge => ordered(Ordering::is_ge),
    }
}

fn int_arg(value: Scalar, func: Func) -> Result<i64, String> {
    match value.num(func.name())? {
        Num::Int(i) => Ok(i),
        Num::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e18 => Ok(f as i64),
        Num::Float(f) => Err(format!("{}() expects integers, got {f}", func.name())),
    }
}

fn float_to_int(f: f64) -> Result<Scalar, String> {
    if !f.is_finite() || f.abs() >= 9.2e18 {
        return Err(format!("cannot convert {f} to an integer"));
    }
    Ok(Scalar::Int(f as i64))
}

fn call(func: Func, args: &[Scalar], rng: &mut StdRng) -> Result<Scalar, String> {
    let name = func.name();
    let float = |value: Scalar| value.num(name).map(Num::as_f64);
    let domain = || "math domain error".to_string();
    let finite = |value: f64| {
        if value.is_finite() {
            Ok(Scalar::Float(value))
        } else {
            Err("math range error".to_string())
        }
    };

    match (func, args) {
        (Func::Randint, [low, high]) => {
            let (low, high) = (int_arg(*low, func)?, int_arg(*high, func)?);
            if low > high {
                return Err(format!("empty range for randint({low}, {high})"));
            }
            Ok(Scalar::Int(rng.gen_range(low..=high)))
        }
        (Func::Uniform, [low, high]) => {
            let (low, high) = (float(*low)?, float(*high)?);
            Ok(Scalar::Float(low + (high - low) * rng.gen::<f64>()))
        }
        (Func::Abs, [x]) => match x.num(name)? {
            Num::Int(i) => i
                .checked_abs()
                .map(Scalar::Int)
                .ok_or_else(|| "integer overflow".to_string()),
            Num::Float(f) => Ok(Scalar::Float(f.abs())),
        },
        (Func::Min | Func::Max, [first, rest @ ..]) => {
            let wanted = if func == Func::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best = *first;
            best.num(name)?;
            for candidate in rest {
                if ordering(*candidate, best)? == Some(wanted) {
                    best = *candidate;
                }
            }
            Ok(best)
        }
        (Func::Round, [x]) => match x.num(name)? {
            Num::Int(i) => Ok(Scalar::Int(i)),
            Num::Float(f) => float_to_int(f.round_ties_even()),
        },
        (Func::Round, [x, digits]) => {
            let digits = int_arg(*digits, func)?;
            match x.num(name)? {
                Num::Int(i) => Ok(Scalar::Int(i)),
                Num::Float(f) => {
                    let factor = 10f64.powi(digits.clamp(-308, 308) as i32);
                    Ok(Scalar::Float((f * factor).round_ties_even() / factor))
                }
            }
        }
        (Func::Floor, [x]) => match x.num(name)? {
            Num::Int(i) => Ok(Scalar::Int(i)),
            Num::Float(f) => float_to_int(f.floor()),
        },
        (Func::Ceil, [x]) => match x.num(name)? {
            Num::Int(i) => Ok(Scalar::Int(i)),
            Num::Float(f) => float_to_int(f.ceil()),
        },
        (Func::Sqrt, [x]) => {
            let x = float(*x)?;
            if x < 0.0 {
                return Err(domain());
            }
            Ok(Scalar::Float(x.sqrt()))
        }
        (Func::Sin, [x]) => Ok(Scalar::Float(float(*x)?.sin())),
        (Func::Cos, [x]) => Ok(Scalar::Float(float(*x)?.cos())),
        (Func::Tan, [x]) => Ok(Scalar::Float(float(*x)?.tan())),
        (Func::Exp, [x]) => finite(float(*x)?.exp()),
        (Func::Log, [x]) => {
            let x = float(*x)?;
            if x <= 0.0 {
                return Err(domain());
            }
            Ok(Scalar::Float(x.ln()))
        }
        (Func::Log, [x, base]) => {
            let (x, base) = (float(*x)?, float(*base)?);
            if x <= 0.0 || base <= 0.0 || base == 1.0 {
                return Err(domain());
            }
            Ok(Scalar::Float(x.ln() / base.ln()))
        }
        (Func::Pow, [x, y]) => match float_arith(BinOp::Pow, float(*x)?, float(*y)?)? {
            Scalar::Float(v) => finite(v),
            other => Ok(other),
        },
        _ => Err(format!("{name}() got {} arguments", args.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Scalar::None.truthy());
        assert!(!Scalar::Int(0).truthy());
        assert!(!Scalar::Float(0.0).truthy());
        assert!(Scalar::Float(0.1).truthy());
        assert!(Scalar::Bool(true).truthy());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Scalar::Int(3).to_json().unwrap(), serde_json::json!(3));
        assert_eq!(Scalar::None.to_json().unwrap(), Value::Null);
        assert!(Scalar::Float(f64::INFINITY).to_json().is_err());
    }

    #[test]
    fn test_int_overflow_is_an_error() {
        assert!(int_arith(BinOp::Add, i64::MAX, 1).is_err());
        assert!(int_arith(BinOp::Pow, 10, 40).is_err());
    }

    #[test]
    fn test_unit_bases_take_any_exponent() {
        let big = i64::from(u32::MAX) + 10;
        let pow = |base, exp| match int_arith(BinOp::Pow, base, exp) {
            Ok(Scalar::Int(v)) => v,
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(pow(1, big), 1);
        assert_eq!(pow(0, big), 0);
        assert_eq!(pow(0, 0), 1);
        assert_eq!(pow(-1, big), 1);
        assert_eq!(pow(-1, big + 1), -1);
        assert!(int_arith(BinOp::Pow, 2, big).is_err());
    }

    #[test]
    fn test_mixed_comparison() {
        assert!(compare(CmpOp::Eq, Scalar::Int(1), Scalar::Float(1.0)).unwrap());
        assert!(compare(CmpOp::Ne, Scalar::None, Scalar::Int(0)).unwrap());
        assert!(compare(CmpOp::Lt, Scalar::None, Scalar::Int(0)).is_err());
    }
}
