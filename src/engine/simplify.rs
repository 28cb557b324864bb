//! Rule-based expression simplification.
//!
//! Rewrites bottom-up and repeats until a fixpoint (bounded pass count).
//! The rule set covers constant folding, additive/multiplicative identities,
//! coefficient collection, power identities, and the Pythagorean identity.

use std::sync::Arc;

use super::ast::{Expr, FLOAT_EPS};

/// Upper bound on rewrite passes; in practice two or three suffice.
const MAX_PASSES: usize = 8;

pub fn simplify(expr: &Expr) -> Expr {
    let mut current = expr.clone();
    for _ in 0..MAX_PASSES {
        let next = simplify_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
    current
}

fn simplify_once(expr: &Expr) -> Expr {
    match expr {
        Expr::Number(_) | Expr::Symbol(_) => expr.clone(),
        Expr::Add(a, b) => simplify_add(simplify_once(a), simplify_once(b)),
        Expr::Sub(a, b) => simplify_sub(simplify_once(a), simplify_once(b)),
        Expr::Mul(a, b) => simplify_mul(simplify_once(a), simplify_once(b)),
        Expr::Div(a, b) => simplify_div(simplify_once(a), simplify_once(b)),
        Expr::Pow(a, b) => simplify_pow(simplify_once(a), simplify_once(b)),
        Expr::Neg(a) => simplify_neg(simplify_once(a)),
        Expr::Call(name, args) => {
            simplify_call(name, args.iter().map(|a| simplify_once(a)).collect())
        }
    }
}

/// Match `f(u)^2` for the given function name, returning the argument.
fn squared_call_arg<'e>(expr: &'e Expr, fn_name: &str) -> Option<&'e Expr> {
    if let Expr::Pow(base, exp) = expr
        && exp.as_number().is_some_and(|n| (n - 2.0).abs() < FLOAT_EPS)
        && let Expr::Call(name, args) = &**base
        && name == fn_name
        && args.len() == 1
    {
        return Some(&args[0]);
    }
    None
}

fn simplify_add(a: Expr, b: Expr) -> Expr {
    if a.is_zero() {
        return b;
    }
    if b.is_zero() {
        return a;
    }
    if let (Some(ca), Some(cb)) = (a.as_number(), b.as_number()) {
        return Expr::number(ca + cb);
    }
    // sin(u)^2 + cos(u)^2 = 1, in either operand order.
    let pythagorean = match (squared_call_arg(&a, "sin"), squared_call_arg(&b, "cos")) {
        (Some(u), Some(v)) => u == v,
        _ => match (squared_call_arg(&a, "cos"), squared_call_arg(&b, "sin")) {
            (Some(u), Some(v)) => u == v,
            _ => false,
        },
    };
    if pythagorean {
        return Expr::one();
    }
    if a == b {
        return Expr::number(2.0) * a;
    }
    a + b
}

fn simplify_sub(a: Expr, b: Expr) -> Expr {
    if b.is_zero() {
        return a;
    }
    if a.is_zero() {
        return simplify_neg(b);
    }
    if a == b {
        return Expr::zero();
    }
    if let (Some(ca), Some(cb)) = (a.as_number(), b.as_number()) {
        return Expr::number(ca - cb);
    }
    a - b
}

fn simplify_mul(a: Expr, b: Expr) -> Expr {
    if a.is_zero() || b.is_zero() {
        return Expr::zero();
    }
    if a.is_one() {
        return b;
    }
    if b.is_one() {
        return a;
    }
    if let (Some(ca), Some(cb)) = (a.as_number(), b.as_number()) {
        return Expr::number(ca * cb);
    }
    // Keep numeric coefficients on the left so collection rules can see them.
    if b.as_number().is_some() && a.as_number().is_none() {
        return simplify_mul(b, a);
    }
    if let Some(c) = a.as_number() {
        if (c + 1.0).abs() < FLOAT_EPS {
            return simplify_neg(b);
        }
        // c1 * (c2 * e) = (c1 * c2) * e
        if let Expr::Mul(inner_l, inner_r) = &b
            && let Some(c2) = inner_l.as_number()
        {
            return Expr::number(c * c2) * (**inner_r).clone();
        }
    }
    // Float nested numeric coefficients to the front:
    // a * (c * b) = c * (a * b) and (c * a) * b = c * (a * b).
    if let Expr::Mul(bl, br) = &b
        && let Some(c) = bl.as_number()
        && a.as_number().is_none()
    {
        return Expr::number(c) * (a * (**br).clone());
    }
    if let Expr::Mul(al, ar) = &a
        && let Some(c) = al.as_number()
        && b.as_number().is_none()
    {
        return Expr::number(c) * ((**ar).clone() * b);
    }
    if a == b {
        return a.pow(Expr::number(2.0));
    }
    // x * x^n = x^(n+1), x^n * x^m = x^(n+m) for numeric exponents.
    if let Expr::Pow(base, exp) = &b
        && a == **base
        && let Some(n) = exp.as_number()
    {
        return a.pow(Expr::number(n + 1.0));
    }
    if let Expr::Pow(base, exp) = &a
        && b == **base
        && let Some(n) = exp.as_number()
    {
        return b.pow(Expr::number(n + 1.0));
    }
    if let (Expr::Pow(base_a, exp_a), Expr::Pow(base_b, exp_b)) = (&a, &b)
        && base_a == base_b
        && let (Some(n), Some(m)) = (exp_a.as_number(), exp_b.as_number())
    {
        return (**base_a).clone().pow(Expr::number(n + m));
    }
    a * b
}

fn simplify_div(a: Expr, b: Expr) -> Expr {
    if a.is_zero() && !b.is_zero() {
        return Expr::zero();
    }
    if b.is_one() {
        return a;
    }
    if a == b && !a.is_zero() {
        return Expr::one();
    }
    if let (Some(ca), Some(cb)) = (a.as_number(), b.as_number())
        && cb.abs() > FLOAT_EPS
    {
        let q = ca / cb;
        // Fold only when the quotient is exact; keep 1/3 as a fraction.
        if q.fract() == 0.0 {
            return Expr::number(q);
        }
    }
    a / b
}

fn simplify_pow(a: Expr, b: Expr) -> Expr {
    if b.is_zero() {
        return Expr::one();
    }
    if b.is_one() {
        return a;
    }
    if a.is_zero() {
        return Expr::zero();
    }
    if a.is_one() {
        return Expr::one();
    }
    if let (Some(ca), Some(cb)) = (a.as_number(), b.as_number()) {
        let v = ca.powf(cb);
        // Fold only exact results; keep 2**0.5 symbolic.
        if v.is_finite() && v.fract() == 0.0 {
            return Expr::number(v);
        }
    }
    // (x^n)^m = x^(n*m) for numeric exponents.
    if let Expr::Pow(base, exp) = &a
        && let (Some(n), Some(m)) = (exp.as_number(), b.as_number())
    {
        return (**base).clone().pow(Expr::number(n * m));
    }
    a.pow(b)
}

fn simplify_neg(a: Expr) -> Expr {
    if let Some(c) = a.as_number() {
        return Expr::number(-c);
    }
    if let Expr::Neg(inner) = &a {
        return (**inner).clone();
    }
    -a
}

fn simplify_call(name: &str, args: Vec<Expr>) -> Expr {
    if args.len() == 1
        && let Some(x) = args[0].as_number()
    {
        let v = match name {
            "sin" => Some(x.sin()),
            "cos" => Some(x.cos()),
            "tan" => Some(x.tan()),
            "asin" => Some(x.asin()),
            "acos" => Some(x.acos()),
            "atan" => Some(x.atan()),
            "sinh" => Some(x.sinh()),
            "cosh" => Some(x.cosh()),
            "tanh" => Some(x.tanh()),
            "exp" => Some(x.exp()),
            "ln" => Some(x.ln()),
            "sqrt" => Some(x.sqrt()),
            "abs" => Some(x.abs()),
            "sign" => Some(x.signum()),
            _ => None,
        };
        // Fold only clean values: sin(0) becomes 0, but ln(-1) stays symbolic
        // rather than turning into NaN.
        if let Some(v) = v
            && v.is_finite()
            && (v.fract() == 0.0 || v.abs() < FLOAT_EPS)
        {
            return Expr::number(if v.abs() < FLOAT_EPS { 0.0 } else { v });
        }
    }
    Expr::Call(name.to_string(), args.into_iter().map(Arc::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::parse;

    fn simp(src: &str) -> String {
        simplify(&parse(src).unwrap()).to_string()
    }

    #[test]
    fn additive_and_multiplicative_identities() {
        assert_eq!(simp("x + 0"), "x");
        assert_eq!(simp("0 + x"), "x");
        assert_eq!(simp("1 * x"), "x");
        assert_eq!(simp("x * 0"), "0");
        assert_eq!(simp("x / 1"), "x");
        assert_eq!(simp("x - x"), "0");
        assert_eq!(simp("x / x"), "1");
    }

    #[test]
    fn constants_fold() {
        assert_eq!(simp("2 + 3"), "5");
        assert_eq!(simp("2 * 3 + 1"), "7");
        assert_eq!(simp("2**3"), "8");
        assert_eq!(simp("4 / 2"), "2");
    }

    #[test]
    fn inexact_quotients_stay_symbolic() {
        assert_eq!(simp("1 / 3"), "1/3");
        assert_eq!(simp("2**0.5"), "2**0.5");
    }

    #[test]
    fn pythagorean_identity() {
        assert_eq!(simp("sin(x)**2 + cos(x)**2"), "1");
        assert_eq!(simp("cos(x)**2 + sin(x)**2"), "1");
        // Different arguments must not collapse.
        assert_ne!(simp("sin(x)**2 + cos(y)**2"), "1");
    }

    #[test]
    fn coefficient_collection() {
        assert_eq!(simp("3 * (2 * x)"), "6*x");
        assert_eq!(simp("x + x"), "2*x");
        assert_eq!(simp("x * x"), "x**2");
        assert_eq!(simp("x * x**2"), "x**3");
    }

    #[test]
    fn double_negation_cancels() {
        assert_eq!(simp("-(-x)"), "x");
    }

    #[test]
    fn constant_calls_fold_cleanly() {
        assert_eq!(simp("sin(0)"), "0");
        assert_eq!(simp("exp(0)"), "1");
        assert_eq!(simp("sqrt(4)"), "2");
        // Domain errors stay symbolic instead of folding to NaN.
        assert_eq!(simp("ln(0 - 1)"), "ln(-1)");
    }

    #[test]
    fn zero_division_is_left_alone() {
        assert_eq!(simp("1 / 0"), "1/0");
    }
}
