//! `service` — the expression service.
//!
//! One symbolic operation per call: validate the input, run the engine on a
//! blocking worker under a deadline, translate failures into a closed error
//! kind, and optionally persist a history record.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::engine::{Engine, EngineError};
use crate::store::{CalcType, HistoryStore, NewCalculation};

/// Default variable of differentiation/integration.
pub const DEFAULT_VAR: &str = "x";

/// Closed error kind at the service boundary. The API layer maps every
/// variant to a 400-class response; nothing engine-specific leaks past here.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// Parse or compute failure, carrying the engine's message.
    #[error("{0}")]
    Evaluation(String),

    #[error("computation exceeded the {0}s time limit")]
    Timeout(u64),
}

/// Successful computation: the rendered result and, when persistence was
/// requested and succeeded, the id of the stored record.
#[derive(Debug, Clone, Serialize)]
pub struct Computation {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<i64>,
}

pub struct ExpressionService {
    engine: Engine,
    timeout: Duration,
    store: HistoryStore,
}

impl ExpressionService {
    pub fn new(engine: Engine, timeout: Duration, store: HistoryStore) -> Self {
        Self {
            engine,
            timeout,
            store,
        }
    }

    /// Parse and simplify `expr`, rendering the reduced form.
    pub async fn evaluate(&self, expr: String, save: bool) -> Result<Computation, ComputeError> {
        let engine = self.engine;
        let input = expr.clone();
        let result = self
            .run(move || {
                let parsed = engine.parse(&input)?;
                Ok(engine.simplify(&parsed).to_string())
            })
            .await?;

        let saved_id = if save {
            self.persist(expr, &result, CalcType::Evaluate)
        } else {
            None
        };
        Ok(Computation { result, saved_id })
    }

    /// `order`-th derivative of `expr` with respect to `var`.
    ///
    /// The persisted input is an annotated audit label (`d/dx <expr>`), not
    /// reparsable input.
    pub async fn differentiate(
        &self,
        expr: String,
        var: String,
        order: u32,
        save: bool,
    ) -> Result<Computation, ComputeError> {
        if !Engine::is_symbol_name(&var) {
            return Err(ComputeError::Evaluation(format!(
                "'{var}' is not a valid symbol name"
            )));
        }

        let engine = self.engine;
        let input = expr.clone();
        let diff_var = var.clone();
        let result = self
            .run(move || {
                let parsed = engine.parse(&input)?;
                Ok(engine.differentiate(&parsed, &diff_var, order)?.to_string())
            })
            .await?;

        let saved_id = if save {
            let label = if order == 1 {
                format!("d/d{var} {expr}")
            } else {
                format!("d^{order}/d{var}^{order} {expr}")
            };
            self.persist(label, &result, CalcType::Differentiate)
        } else {
            None
        };
        Ok(Computation { result, saved_id })
    }

    /// Integral of `expr` with respect to `var`.
    ///
    /// Definite iff **both** bounds are supplied; a single bound is treated
    /// as no bounds and yields the indefinite integral. The persisted label
    /// carries the bounds annotation only in the definite case.
    pub async fn integrate(
        &self,
        expr: String,
        var: String,
        lower: Option<String>,
        upper: Option<String>,
        save: bool,
    ) -> Result<Computation, ComputeError> {
        if !Engine::is_symbol_name(&var) {
            return Err(ComputeError::Evaluation(format!(
                "'{var}' is not a valid symbol name"
            )));
        }

        let bounds = match (&lower, &upper) {
            (Some(l), Some(u)) => Some((l.clone(), u.clone())),
            _ => None,
        };

        let engine = self.engine;
        let input = expr.clone();
        let int_var = var.clone();
        let run_bounds = bounds.clone();
        let result = self
            .run(move || {
                let parsed = engine.parse(&input)?;
                match run_bounds {
                    Some((l, u)) => {
                        let lower = engine.parse(&l)?;
                        let upper = engine.parse(&u)?;
                        Ok(engine
                            .integrate_definite(&parsed, &int_var, &lower, &upper)?
                            .to_string())
                    }
                    None => Ok(engine.integrate(&parsed, &int_var)?.to_string()),
                }
            })
            .await?;

        let saved_id = if save {
            let label = match &bounds {
                Some((l, u)) => format!("∫[{l},{u}] {expr} d{var}"),
                None => format!("∫ {expr} d{var}"),
            };
            self.persist(label, &result, CalcType::Integrate)
        } else {
            None
        };
        Ok(Computation { result, saved_id })
    }

    /// Run one engine computation on the blocking pool under the deadline.
    ///
    /// The blocking thread is not cancellable; on timeout it runs to
    /// completion in the background while the request returns. The engine's
    /// depth/node limits bound how much work that can be.
    async fn run<F>(&self, f: F) -> Result<String, ComputeError>
    where
        F: FnOnce() -> Result<String, EngineError> + Send + 'static,
    {
        let secs = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, tokio::task::spawn_blocking(f)).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(e))) => Err(ComputeError::Evaluation(e.to_string())),
            Ok(Err(join_err)) => {
                Err(ComputeError::Evaluation(format!("computation failed: {join_err}")))
            }
            Err(_) => Err(ComputeError::Timeout(secs)),
        }
    }

    /// Persist one record, degrading gracefully: a storage failure is logged
    /// and the computed result is still returned without a `saved_id`.
    fn persist(&self, input_expr: String, result: &str, calc_type: CalcType) -> Option<i64> {
        match self.store.create(NewCalculation {
            input_expr,
            result: result.to_string(),
            calc_type,
        }) {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!("history save failed: {e}");
                None
            }
        }
    }
}
