//! Abstract syntax tree for mathematical expressions.

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

/// Tolerance used when comparing floating-point constants against exact values.
pub(crate) const FLOAT_EPS: f64 = 1e-12;

/// A symbolic expression.
///
/// Children are reference-counted so subtrees can be shared freely while
/// rewriting; `Arc` (rather than `Rc`) because computed expressions cross
/// thread boundaries on their way back from the blocking worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant (e.g. 3.14, 1e10).
    Number(f64),
    /// Variable or named constant (e.g. "x", "pi").
    Symbol(String),
    Add(Arc<Expr>, Arc<Expr>),
    Sub(Arc<Expr>, Arc<Expr>),
    Mul(Arc<Expr>, Arc<Expr>),
    Div(Arc<Expr>, Arc<Expr>),
    /// Exponentiation, right-associative in the surface syntax.
    Pow(Arc<Expr>, Arc<Expr>),
    Neg(Arc<Expr>),
    /// Application of a built-in function (e.g. `sin(x)`).
    Call(String, Vec<Arc<Expr>>),
}

impl Expr {
    pub fn number(n: f64) -> Self {
        Expr::Number(n)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn zero() -> Self {
        Expr::Number(0.0)
    }

    pub fn one() -> Self {
        Expr::Number(1.0)
    }

    pub fn pow(self, exp: Expr) -> Self {
        Expr::Pow(Arc::new(self), Arc::new(exp))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(name.into(), args.into_iter().map(Arc::new).collect())
    }

    pub fn sin(self) -> Self {
        Expr::call("sin", vec![self])
    }

    pub fn cos(self) -> Self {
        Expr::call("cos", vec![self])
    }

    pub fn exp(self) -> Self {
        Expr::call("exp", vec![self])
    }

    pub fn ln(self) -> Self {
        Expr::call("ln", vec![self])
    }

    pub fn sqrt(self) -> Self {
        Expr::call("sqrt", vec![self])
    }

    pub fn abs(self) -> Self {
        Expr::call("abs", vec![self])
    }

    /// Constant value if this node is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_number().is_some_and(|n| n.abs() < FLOAT_EPS)
    }

    pub fn is_one(&self) -> bool {
        self.as_number().is_some_and(|n| (n - 1.0).abs() < FLOAT_EPS)
    }

    /// Whether `var` occurs free anywhere in the expression.
    pub fn contains_var(&self, var: &str) -> bool {
        match self {
            Expr::Number(_) => false,
            Expr::Symbol(s) => s == var,
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => a.contains_var(var) || b.contains_var(var),
            Expr::Neg(a) => a.contains_var(var),
            Expr::Call(_, args) => args.iter().any(|a| a.contains_var(var)),
        }
    }

    /// Total node count, used to enforce the engine's size limit.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Symbol(_) => 1,
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => 1 + a.node_count() + b.node_count(),
            Expr::Neg(a) => 1 + a.node_count(),
            Expr::Call(_, args) => 1 + args.iter().map(|a| a.node_count()).sum::<usize>(),
        }
    }

    /// Maximum nesting depth, used to enforce the engine's depth limit.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Symbol(_) => 1,
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => 1 + a.depth().max(b.depth()),
            Expr::Neg(a) => 1 + a.depth(),
            Expr::Call(_, args) => 1 + args.iter().map(|a| a.depth()).max().unwrap_or(0),
        }
    }

    /// Replace every free occurrence of `var` with `replacement`.
    pub fn substitute(&self, var: &str, replacement: &Expr) -> Expr {
        match self {
            Expr::Number(_) => self.clone(),
            Expr::Symbol(s) => {
                if s == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Expr::Add(a, b) => a.substitute(var, replacement) + b.substitute(var, replacement),
            Expr::Sub(a, b) => a.substitute(var, replacement) - b.substitute(var, replacement),
            Expr::Mul(a, b) => a.substitute(var, replacement) * b.substitute(var, replacement),
            Expr::Div(a, b) => a.substitute(var, replacement) / b.substitute(var, replacement),
            Expr::Pow(a, b) => a
                .substitute(var, replacement)
                .pow(b.substitute(var, replacement)),
            Expr::Neg(a) => -a.substitute(var, replacement),
            Expr::Call(name, args) => Expr::Call(
                name.clone(),
                args.iter()
                    .map(|a| Arc::new(a.substitute(var, replacement)))
                    .collect(),
            ),
        }
    }
}

impl Add for Expr {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Expr::Add(Arc::new(self), Arc::new(rhs))
    }
}

impl Sub for Expr {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Expr::Sub(Arc::new(self), Arc::new(rhs))
    }
}

impl Mul for Expr {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Expr::Mul(Arc::new(self), Arc::new(rhs))
    }
}

impl Div for Expr {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Expr::Div(Arc::new(self), Arc::new(rhs))
    }
}

impl Neg for Expr {
    type Output = Self;
    fn neg(self) -> Self {
        Expr::Neg(Arc::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_var_sees_through_nesting() {
        let e = Expr::symbol("x").sin() + Expr::symbol("y");
        assert!(e.contains_var("x"));
        assert!(e.contains_var("y"));
        assert!(!e.contains_var("z"));
    }

    #[test]
    fn substitute_replaces_all_occurrences() {
        let e = Expr::symbol("x").pow(Expr::number(2.0)) + Expr::symbol("x");
        let s = e.substitute("x", &Expr::number(3.0));
        assert!(!s.contains_var("x"));
    }

    #[test]
    fn node_count_and_depth() {
        let e = Expr::symbol("x") + Expr::number(1.0);
        assert_eq!(e.node_count(), 3);
        assert_eq!(e.depth(), 2);
    }
}
