//! Fallback chains
//!
//! Every heuristic in the crawler (field extraction, link collection, page
//! count resolution) is an ordered list of strategies. Each strategy is a pure
//! function from a context to an optional value; the chain returns the first
//! value produced and records which strategy produced it.

/// A named strategy in a fallback chain
pub type StrategyFn<C, T> = fn(&C) -> Option<T>;

/// An ordered list of strategies tried until one yields a value
pub struct FallbackChain<C, T> {
    label: &'static str,
    steps: Vec<(&'static str, StrategyFn<C, T>)>,
}

impl<C, T> FallbackChain<C, T> {
    /// Creates an empty chain. The label only appears in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            steps: Vec::new(),
        }
    }

    /// Appends a strategy to the end of the chain
    pub fn then(mut self, name: &'static str, strategy: StrategyFn<C, T>) -> Self {
        self.steps.push((name, strategy));
        self
    }

    /// Names of the strategies, in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }

    /// Runs the strategies in order and returns the first success with its name
    pub fn resolve_named(&self, ctx: &C) -> Option<(&'static str, T)> {
        for (name, strategy) in &self.steps {
            match strategy(ctx) {
                Some(value) => {
                    tracing::debug!("{}: resolved by '{}'", self.label, name);
                    return Some((*name, value));
                }
                None => tracing::trace!("{}: '{}' found nothing", self.label, name),
            }
        }
        tracing::debug!("{}: every strategy came up empty", self.label);
        None
    }

    /// Runs the strategies in order and returns the first success
    pub fn resolve(&self, ctx: &C) -> Option<T> {
        self.resolve_named(ctx).map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &i32) -> Option<i32> {
        None
    }

    fn double(x: &i32) -> Option<i32> {
        Some(x * 2)
    }

    fn positive(x: &i32) -> Option<i32> {
        (*x > 0).then_some(*x)
    }

    #[test]
    fn test_first_success_wins() {
        let chain = FallbackChain::new("test")
            .then("never", never)
            .then("double", double)
            .then("positive", positive);

        assert_eq!(chain.resolve_named(&4), Some(("double", 8)));
    }

    #[test]
    fn test_falls_through_to_later_strategy() {
        let chain = FallbackChain::new("test")
            .then("positive", positive)
            .then("double", double);

        assert_eq!(chain.resolve_named(&-3), Some(("double", -6)));
    }

    #[test]
    fn test_empty_result() {
        let chain = FallbackChain::new("test").then("never", never);
        assert_eq!(chain.resolve(&1), None);

        let empty: FallbackChain<i32, i32> = FallbackChain::new("empty");
        assert_eq!(empty.resolve(&1), None);
    }

    #[test]
    fn test_strategy_names_in_order() {
        let chain = FallbackChain::new("test")
            .then("a", never)
            .then("b", double);
        assert_eq!(chain.strategy_names(), vec!["a", "b"]);
    }
}
