//! Symbolic differentiation and rule-based integration.

use super::ast::Expr;
use super::error::EngineError;
use super::simplify::simplify;

/// First derivative of `expr` with respect to `var`.
///
/// Total over the AST: every node kind and every built-in function has a
/// rule, so differentiation itself cannot fail (size limits are enforced by
/// the caller between passes).
pub fn differentiate(expr: &Expr, var: &str) -> Expr {
    match expr {
        Expr::Number(_) => Expr::zero(),

        Expr::Symbol(s) => {
            if s == var {
                Expr::one()
            } else {
                Expr::zero()
            }
        }

        Expr::Add(a, b) => differentiate(a, var) + differentiate(b, var),

        Expr::Sub(a, b) => differentiate(a, var) - differentiate(b, var),

        // Product rule: (a*b)' = a'*b + a*b'
        Expr::Mul(a, b) => {
            let da = differentiate(a, var);
            let db = differentiate(b, var);
            da * (**b).clone() + (**a).clone() * db
        }

        // Quotient rule: (a/b)' = (a'*b - a*b') / b^2
        Expr::Div(a, b) => {
            let da = differentiate(a, var);
            let db = differentiate(b, var);
            (da * (**b).clone() - (**a).clone() * db)
                / (**b).clone().pow(Expr::number(2.0))
        }

        Expr::Pow(base, exp) => {
            let base_has_var = base.contains_var(var);
            let exp_has_var = exp.contains_var(var);
            match (base_has_var, exp_has_var) {
                (false, false) => Expr::zero(),

                // (u^n)' = n * u^(n-1) * u'
                (true, false) => {
                    let n = (**exp).clone();
                    let du = differentiate(base, var);
                    n.clone() * (**base).clone().pow(n - Expr::one()) * du
                }

                // (a^u)' = a^u * ln(a) * u'
                (false, true) => {
                    let du = differentiate(exp, var);
                    expr.clone() * (**base).clone().ln() * du
                }

                // (f^g)' = f^g * (g' * ln(f) + g * f'/f)
                (true, true) => {
                    let df = differentiate(base, var);
                    let dg = differentiate(exp, var);
                    expr.clone()
                        * (dg * (**base).clone().ln()
                            + (**exp).clone() * df / (**base).clone())
                }
            }
        }

        Expr::Neg(a) => -differentiate(a, var),

        // Chain rule over the built-in unary functions.
        Expr::Call(name, args) => {
            let u = (*args[0]).clone();
            let du = differentiate(&u, var);
            let outer = match name.as_str() {
                "sin" => u.cos(),
                "cos" => -u.sin(),
                "tan" => Expr::one() / u.cos().pow(Expr::number(2.0)),
                "asin" => {
                    Expr::one() / (Expr::one() - u.pow(Expr::number(2.0))).sqrt()
                }
                "acos" => {
                    -(Expr::one() / (Expr::one() - u.pow(Expr::number(2.0))).sqrt())
                }
                "atan" => Expr::one() / (Expr::one() + u.pow(Expr::number(2.0))),
                "sinh" => Expr::call("cosh", vec![u]),
                "cosh" => Expr::call("sinh", vec![u]),
                "tanh" => {
                    Expr::one() / Expr::call("cosh", vec![u]).pow(Expr::number(2.0))
                }
                "exp" => u.exp(),
                "ln" => Expr::one() / u,
                "sqrt" => Expr::one() / (Expr::number(2.0) * u.sqrt()),
                // abs is not differentiable at zero; elsewhere its derivative
                // is the sign of the argument.
                _ => Expr::call("sign", vec![u]),
            };
            outer * du
        }
    }
}

/// Antiderivative of `expr` with respect to `var`, omitting the integration
/// constant. Fails with [`EngineError::NoAntiderivative`] when no rule
/// applies.
pub fn integrate(expr: &Expr, var: &str) -> Result<Expr, EngineError> {
    let x = || Expr::symbol(var);

    let result = match expr {
        // ∫ c dx = c*x
        Expr::Number(c) => Expr::number(*c) * x(),

        Expr::Symbol(s) => {
            if s == var {
                // ∫ x dx = x^2/2
                x().pow(Expr::number(2.0)) / Expr::number(2.0)
            } else {
                // Any other symbol is a constant with respect to `var`.
                Expr::symbol(s.clone()) * x()
            }
        }

        Expr::Add(a, b) => integrate(a, var)? + integrate(b, var)?,

        Expr::Sub(a, b) => integrate(a, var)? - integrate(b, var)?,

        // Constant factors move outside the integral.
        Expr::Mul(a, b) => match (a.contains_var(var), b.contains_var(var)) {
            (false, true) => (**a).clone() * integrate(b, var)?,
            (true, false) => integrate(a, var)? * (**b).clone(),
            (false, false) => (**a).clone() * (**b).clone() * x(),
            (true, true) => return Err(no_rule(expr)),
        },

        Expr::Div(a, b) => {
            if !b.contains_var(var) {
                integrate(a, var)? / (**b).clone()
            } else if !a.contains_var(var) {
                match &**b {
                    // ∫ c/x dx = c*ln|x|
                    Expr::Symbol(s) if s == var => (**a).clone() * x().abs().ln(),
                    // ∫ c/x^n dx via the power rule with negated exponent.
                    Expr::Pow(base, exp)
                        if matches!(&**base, Expr::Symbol(s) if s == var)
                            && exp.as_number().is_some() =>
                    {
                        let n = -exp.as_number().unwrap();
                        (**a).clone() * power_rule(var, n)?
                    }
                    _ => return Err(no_rule(expr)),
                }
            } else {
                return Err(no_rule(expr));
            }
        }

        // ∫ x^n dx by the power rule, for numeric n.
        Expr::Pow(base, exp) => match (&**base, exp.as_number()) {
            (Expr::Symbol(s), Some(n)) if s == var => power_rule(var, n)?,
            _ => return Err(no_rule(expr)),
        },

        Expr::Neg(a) => -integrate(a, var)?,

        // Standard integrals for functions of the bare variable.
        Expr::Call(name, args) => {
            let arg_is_var = matches!(&*args[0], Expr::Symbol(s) if s == var);
            if !arg_is_var {
                return Err(no_rule(expr));
            }
            match name.as_str() {
                "sin" => -x().cos(),
                "cos" => x().sin(),
                "exp" => x().exp(),
                // ∫ sqrt(x) dx = (2/3) * x^(3/2)
                "sqrt" => {
                    (Expr::number(2.0) / Expr::number(3.0))
                        * x().pow(Expr::number(1.5))
                }
                _ => return Err(no_rule(expr)),
            }
        }
    };

    Ok(result)
}

/// ∫ x^n dx for numeric n: x^(n+1)/(n+1), or ln|x| when n = -1.
fn power_rule(var: &str, n: f64) -> Result<Expr, EngineError> {
    let x = Expr::symbol(var);
    if (n + 1.0).abs() < super::ast::FLOAT_EPS {
        Ok(x.abs().ln())
    } else {
        Ok(x.pow(Expr::number(n + 1.0)) / Expr::number(n + 1.0))
    }
}

/// Definite integral over `[lower, upper]`: F(upper) - F(lower).
pub fn integrate_definite(
    expr: &Expr,
    var: &str,
    lower: &Expr,
    upper: &Expr,
) -> Result<Expr, EngineError> {
    let antiderivative = simplify(&integrate(expr, var)?);
    let at_upper = antiderivative.substitute(var, upper);
    let at_lower = antiderivative.substitute(var, lower);
    Ok(at_upper - at_lower)
}

fn no_rule(expr: &Expr) -> EngineError {
    EngineError::NoAntiderivative {
        expr: expr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::parse;
    use crate::engine::simplify::simplify;

    fn diff(src: &str, var: &str) -> String {
        simplify(&differentiate(&parse(src).unwrap(), var)).to_string()
    }

    fn integ(src: &str, var: &str) -> String {
        let parsed = simplify(&parse(src).unwrap());
        simplify(&integrate(&parsed, var).unwrap()).to_string()
    }

    #[test]
    fn derivative_of_power() {
        assert_eq!(diff("x**2", "x"), "2*x");
        assert_eq!(diff("x**3", "x"), "3*x**2");
    }

    #[test]
    fn derivative_of_constant_and_foreign_symbol() {
        assert_eq!(diff("7", "x"), "0");
        assert_eq!(diff("y", "x"), "0");
    }

    #[test]
    fn derivative_of_sin_is_cos() {
        assert_eq!(diff("sin(x)", "x"), "cos(x)");
    }

    #[test]
    fn chain_rule_applies() {
        assert_eq!(diff("sin(x**2)", "x"), "2*cos(x**2)*x");
    }

    #[test]
    fn product_rule_applies() {
        // (x*sin(x))' = sin(x) + x*cos(x)
        let got = diff("x * sin(x)", "x");
        assert!(got.contains("sin(x)") && got.contains("cos(x)"), "got {got}");
    }

    #[test]
    fn integral_of_x_is_half_square() {
        assert_eq!(integ("x", "x"), "x**2/2");
    }

    #[test]
    fn integral_of_power() {
        assert_eq!(integ("x**2", "x"), "x**3/3");
    }

    #[test]
    fn integral_of_reciprocal_is_log() {
        assert_eq!(integ("x**-1", "x"), "ln(abs(x))");
        assert_eq!(integ("1/x", "x"), "ln(abs(x))");
    }

    #[test]
    fn integral_of_trig() {
        assert_eq!(integ("cos(x)", "x"), "sin(x)");
        assert_eq!(integ("sin(x)", "x"), "-cos(x)");
    }

    #[test]
    fn constant_factor_moves_out() {
        assert_eq!(integ("3*x", "x"), "3*x**2/2");
    }

    #[test]
    fn unintegrable_product_reports_rule_failure() {
        let err = integrate(&parse("sin(x)*cos(x)").unwrap(), "x").unwrap_err();
        assert!(matches!(err, EngineError::NoAntiderivative { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn definite_integral_evaluates_bounds() {
        let expr = parse("x").unwrap();
        let result = integrate_definite(
            &expr,
            "x",
            &Expr::number(0.0),
            &Expr::number(2.0),
        )
        .unwrap();
        assert_eq!(simplify(&result).to_string(), "2");
    }
}
