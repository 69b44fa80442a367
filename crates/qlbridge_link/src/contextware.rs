//! Context transforms run before each operation.
//!
//! Each contextware sees the context built so far and the operation, and
//! may return a partial context that is shallow-merged on top. Returning
//! `None` leaves the context as it is.

use crate::error::ContextError;
use crate::operation::Operation;
use qlbridge_runtime::Context;
use std::fmt;
use std::sync::Arc;

/// A context transform.
pub trait Contextware: Send + Sync {
    fn apply(&self, context: &Context, operation: &Operation)
        -> Result<Option<Context>, ContextError>;
}

/// A shared contextware.
pub type SharedContextware = Arc<dyn Contextware>;

/// Wraps an infallible function.
pub struct FnContextware<F>(F);

impl<F> Contextware for FnContextware<F>
where
    F: Fn(&Context, &Operation) -> Option<Context> + Send + Sync,
{
    fn apply(
        &self,
        context: &Context,
        operation: &Operation,
    ) -> Result<Option<Context>, ContextError> {
        Ok((self.0)(context, operation))
    }
}

impl<F> fmt::Debug for FnContextware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnContextware")
    }
}

/// Wraps a fallible function.
pub struct TryFnContextware<F>(F);

impl<F> Contextware for TryFnContextware<F>
where
    F: Fn(&Context, &Operation) -> Result<Option<Context>, ContextError> + Send + Sync,
{
    fn apply(
        &self,
        context: &Context,
        operation: &Operation,
    ) -> Result<Option<Context>, ContextError> {
        (self.0)(context, operation)
    }
}

impl<F> fmt::Debug for TryFnContextware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TryFnContextware")
    }
}

/// Creates a contextware from a function.
pub fn from_fn<F>(f: F) -> SharedContextware
where
    F: Fn(&Context, &Operation) -> Option<Context> + Send + Sync + 'static,
{
    Arc::new(FnContextware(f))
}

/// Creates a contextware from a fallible function.
pub fn try_from_fn<F>(f: F) -> SharedContextware
where
    F: Fn(&Context, &Operation) -> Result<Option<Context>, ContextError> + Send + Sync + 'static,
{
    Arc::new(TryFnContextware(f))
}

/// Folds `chain` over `initial`, left to right.
pub fn apply_all(
    chain: &[SharedContextware],
    initial: Context,
    operation: &Operation,
) -> Result<Context, ContextError> {
    chain.iter().try_fold(initial, |acc, contextware| {
        Ok(match contextware.apply(&acc, operation)? {
            Some(partial) => acc.merged(partial),
            None => acc,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operation() -> Operation {
        Operation::parse("query posts { posts { id } }").unwrap()
    }

    #[test]
    fn test_later_contextware_wins() {
        let chain = vec![
            from_fn(|_, _| Some(Context::new().with("a", 1).with("b", 1))),
            from_fn(|_, _| Some(Context::new().with("b", 2))),
        ];
        let context = apply_all(&chain, Context::new().with("base", true), &operation()).unwrap();
        assert_eq!(context.to_value(), json!({"base": true, "a": 1, "b": 2}));
    }

    #[test]
    fn test_none_keeps_context() {
        let chain = vec![from_fn(|_, _| None)];
        let initial = Context::new().with("base", true);
        assert_eq!(
            apply_all(&chain, initial.clone(), &operation()).unwrap(),
            initial
        );
    }

    #[test]
    fn test_contextware_sees_accumulator_and_operation() {
        let chain = vec![
            from_fn(|_, _| Some(Context::new().with("step", 1))),
            from_fn(|ctx, op| {
                let step = ctx.get("step").and_then(serde_json::Value::as_i64)?;
                Some(Context::new().with(
                    "seen",
                    format!("{}:{step}", op.operation_name.as_deref().unwrap_or_default()),
                ))
            }),
        ];
        let context = apply_all(&chain, Context::new(), &operation()).unwrap();
        assert_eq!(context.get("seen"), Some(&json!("posts:1")));
    }

    #[test]
    fn test_failure_stops_the_chain() {
        let chain = vec![
            try_from_fn(|_, _| Err(ContextError::new("no session"))),
            from_fn(|_, _| panic!("not reached")),
        ];
        let err = apply_all(&chain, Context::new(), &operation()).unwrap_err();
        assert_eq!(err.message, "no session");
    }
}
