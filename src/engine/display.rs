//! Text rendering for expressions.
//!
//! Output follows the conventional plain-text algebra notation: `**` for
//! powers, `*` and `/` without surrounding spaces, ` + ` and ` - ` for sums,
//! parentheses only where precedence requires them. Whole numbers print
//! without a fractional part, so `x**2/2` and `2*x` come out exactly so.

use std::fmt;

use super::ast::Expr;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", format_number(*n)),

            Expr::Symbol(s) => write!(f, "{s}"),

            Expr::Add(a, b) => {
                // Render `a + (-b)` as a subtraction.
                if let Expr::Neg(inner) = &**b {
                    write!(f, "{} - {}", a, sub_rhs(inner))
                } else if let Some(n) = b.as_number()
                    && n < 0.0
                {
                    write!(f, "{} - {}", a, format_number(-n))
                } else {
                    write!(f, "{} + {}", a, b)
                }
            }

            Expr::Sub(a, b) => write!(f, "{} - {}", a, sub_rhs(b)),

            Expr::Mul(a, b) => write!(f, "{}*{}", mul_operand(a), mul_operand(b)),

            Expr::Div(a, b) => {
                let num = match &**a {
                    Expr::Add(_, _) | Expr::Sub(_, _) => format!("({a})"),
                    _ => format!("{a}"),
                };
                let denom = match &**b {
                    Expr::Number(n) if *n >= 0.0 => format!("{}", format_number(*n)),
                    Expr::Symbol(_) | Expr::Call(_, _) | Expr::Pow(_, _) => format!("{b}"),
                    _ => format!("({b})"),
                };
                write!(f, "{num}/{denom}")
            }

            Expr::Pow(a, b) => {
                let base = match &**a {
                    Expr::Number(n) if *n >= 0.0 => format!("{}", format_number(*n)),
                    Expr::Symbol(_) | Expr::Call(_, _) => format!("{a}"),
                    _ => format!("({a})"),
                };
                let exp = match &**b {
                    Expr::Number(n) if *n >= 0.0 => format!("{}", format_number(*n)),
                    Expr::Symbol(_) => format!("{b}"),
                    // Powers are right-associative, so a bare power exponent
                    // would be ambiguous; parenthesize everything else.
                    _ => format!("({b})"),
                };
                write!(f, "{base}**{exp}")
            }

            Expr::Neg(a) => match &**a {
                Expr::Add(_, _) | Expr::Sub(_, _) => write!(f, "-({a})"),
                _ => write!(f, "-{a}"),
            },

            Expr::Call(name, args) => {
                let rendered: Vec<String> = args.iter().map(|a| format!("{a}")).collect();
                write!(f, "{}({})", name, rendered.join(", "))
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Right-hand side of a subtraction, parenthesized when it is itself a sum
/// so the grouping survives: `a - (b + c)`.
fn sub_rhs(e: &Expr) -> String {
    match e {
        Expr::Add(_, _) | Expr::Sub(_, _) => format!("({e})"),
        _ => format!("{e}"),
    }
}

/// Multiplication operand, parenthesized when it binds looser than `*`.
fn mul_operand(e: &Expr) -> String {
    match e {
        Expr::Add(_, _) | Expr::Sub(_, _) | Expr::Neg(_) => format!("({e})"),
        Expr::Number(n) if *n < 0.0 => format!("({e})"),
        _ => format!("{e}"),
    }
}
