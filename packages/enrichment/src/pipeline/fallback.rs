//! Ordered fallback strategies with early exit.
//!
//! Each strategy is a named thunk producing an optional result. Strategies
//! run one at a time in insertion order; the first `Some` wins and later
//! strategies never start.
//!
//! ```rust,ignore
//! let found = FallbackChain::new()
//!     .then("website", || Box::pin(async { try_website().await }))
//!     .then("search", || Box::pin(async { try_search().await }))
//!     .then("inference", || Box::pin(async { Some(infer()) }))
//!     .run()
//!     .await;
//! ```

use futures::future::BoxFuture;
use tracing::debug;

type Strategy<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Option<T>> + Send + 'a>;

/// A list of strategies tried in order.
pub struct FallbackChain<'a, T> {
    strategies: Vec<(&'static str, Strategy<'a, T>)>,
}

/// The value produced by the first successful strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome<T> {
    /// Name of the strategy that produced the value
    pub strategy: &'static str,

    pub value: T,
}

impl<'a, T: Send + 'a> FallbackChain<'a, T> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn then<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'a, Option<T>> + Send + 'a,
    {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies until one yields a value.
    pub async fn run(self) -> Option<FallbackOutcome<T>> {
        for (name, strategy) in self.strategies {
            match strategy().await {
                Some(value) => {
                    debug!(strategy = name, "fallback strategy succeeded");
                    return Some(FallbackOutcome {
                        strategy: name,
                        value,
                    });
                }
                None => debug!(strategy = name, "fallback strategy yielded nothing"),
            }
        }
        None
    }
}

impl<'a, T: Send + 'a> Default for FallbackChain<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}
