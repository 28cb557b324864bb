//! Symbolic expression engine.
//!
//! Self-contained computer-algebra kernel: parsing, simplification,
//! differentiation, and rule-based integration over a small expression
//! language. The rest of the application treats it as an opaque capability
//! behind [`Engine`]; callers render results with `Display` and surface
//! [`EngineError`] as a message, never matching on its variants.

mod ast;
mod calculus;
mod display;
mod error;
mod parser;
mod simplify;

pub use ast::Expr;
pub use error::{EngineError, Span};

/// Default maximum AST nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default maximum AST node count.
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Engine handle carrying the safety limits.
///
/// Expression size is user-controlled and intermediate results grow under
/// differentiation, so both limits are re-checked between rewrite passes,
/// not just at parse time.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    max_depth: usize,
    max_nodes: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl Engine {
    pub fn new(max_depth: usize, max_nodes: usize) -> Self {
        Engine {
            max_depth,
            max_nodes,
        }
    }

    /// Whether `name` can serve as a variable of differentiation/integration.
    pub fn is_symbol_name(name: &str) -> bool {
        parser::is_symbol_name(name)
    }

    /// Parse `input` into an expression, enforcing the size limits.
    pub fn parse(&self, input: &str) -> Result<Expr, EngineError> {
        let expr = parser::parse(input)?;
        self.check_limits(&expr)?;
        Ok(expr)
    }

    /// Simplify an expression to its canonical reduced form.
    pub fn simplify(&self, expr: &Expr) -> Expr {
        simplify::simplify(expr)
    }

    /// `order`-th derivative of `expr` with respect to `var`, simplified.
    ///
    /// Order zero returns the simplified expression unchanged.
    pub fn differentiate(
        &self,
        expr: &Expr,
        var: &str,
        order: u32,
    ) -> Result<Expr, EngineError> {
        let mut current = simplify::simplify(expr);
        for _ in 0..order {
            current = simplify::simplify(&calculus::differentiate(&current, var));
            self.check_limits(&current)?;
        }
        Ok(current)
    }

    /// Antiderivative of `expr` with respect to `var`, simplified, with the
    /// integration constant omitted.
    pub fn integrate(&self, expr: &Expr, var: &str) -> Result<Expr, EngineError> {
        let reduced = simplify::simplify(expr);
        let antiderivative = calculus::integrate(&reduced, var)?;
        Ok(simplify::simplify(&antiderivative))
    }

    /// Definite integral of `expr` over `[lower, upper]`, simplified.
    pub fn integrate_definite(
        &self,
        expr: &Expr,
        var: &str,
        lower: &Expr,
        upper: &Expr,
    ) -> Result<Expr, EngineError> {
        let reduced = simplify::simplify(expr);
        let result = calculus::integrate_definite(&reduced, var, lower, upper)?;
        Ok(simplify::simplify(&result))
    }

    fn check_limits(&self, expr: &Expr) -> Result<(), EngineError> {
        if expr.depth() > self.max_depth {
            return Err(EngineError::MaxDepthExceeded);
        }
        if expr.node_count() > self.max_nodes {
            return Err(EngineError::MaxNodesExceeded);
        }
        Ok(())
    }
}
