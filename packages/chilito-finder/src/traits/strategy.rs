//! Cascading strategies.
//!
//! Geocoding, POI discovery and identifier resolution all follow the same
//! shape: an ordered list of interchangeable methods, tried one after another
//! until one succeeds. They share this trait and the [`cascade`] combinator
//! instead of each carrying its own fallback loop.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{CascadeError, StrategyError, StrategyFailure, StrategyResult};

/// One interchangeable method for a sub-task.
#[async_trait]
pub trait Strategy<I: ?Sized + Sync, O: Send>: Send + Sync {
    /// Stable name used in logs and error reports.
    fn name(&self) -> &str;

    /// Try to produce an output for `input`.
    async fn attempt(&self, input: &I) -> StrategyResult<O>;
}

/// Shared handle to a strategy.
pub type StrategyRef<I, O> = Arc<dyn Strategy<I, O>>;

/// Output of a successful cascade.
#[derive(Debug)]
pub struct Cascaded<O> {
    /// Name of the strategy that succeeded
    pub strategy: String,
    pub output: O,
    /// Strategies that failed before it, in order
    pub failures: Vec<StrategyFailure>,
}

/// Try `strategies` in order and stop at the first success.
///
/// Results are never cross-checked against later strategies: the first
/// success wins even if a later strategy would disagree. If every strategy
/// fails, the error carries each failure in order.
pub async fn cascade<I, O>(
    strategies: &[StrategyRef<I, O>],
    input: &I,
) -> Result<Cascaded<O>, CascadeError>
where
    I: ?Sized + Sync,
    O: Send,
{
    let mut failures = Vec::new();

    for strategy in strategies {
        let name = strategy.name().to_string();
        debug!(strategy = %name, "Trying strategy");

        match strategy.attempt(input).await {
            Ok(output) => {
                debug!(strategy = %name, skipped = failures.len(), "Strategy succeeded");
                return Ok(Cascaded {
                    strategy: name,
                    output,
                    failures,
                });
            }
            Err(error) => {
                match &error {
                    StrategyError::Unavailable(_) | StrategyError::Empty => {
                        debug!(strategy = %name, error = %error, "Strategy skipped")
                    }
                    _ => warn!(strategy = %name, error = %error, "Strategy failed"),
                }
                failures.push(StrategyFailure {
                    strategy: name,
                    error,
                });
            }
        }
    }

    Err(CascadeError { attempts: failures })
}
