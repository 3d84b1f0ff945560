//! The reader handler: `Ask`.

use axon_core::{
    Effect, EffectCtx, EffectKind, Handled, Handler, Store, Value, VmError, fx, ir,
};

/// Fulfills `Ask` from the performer's environment.
///
/// A binding that is itself a program (`Value::Prog`) is forced lazily:
/// the first `Ask` evaluates it and memoizes the result in the store
/// under the reserved `__memo__/` namespace, so later asks within the
/// task family see the same value. The memo write travels through a
/// returned `Put` program — this handler never writes the store
/// directly.
pub struct ReaderHandler;

impl Handler for ReaderHandler {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        let EffectKind::Ask { key } = &effect.kind else {
            return Handled::Delegate;
        };
        match ctx.env().get(key) {
            None => Handled::Throw(VmError::MissingBinding(key.clone())),
            Some(Value::Prog(lazy)) => {
                let memo_key = Store::memo_key(key);
                if let Some(memoized) = ctx.store().get(&memo_key) {
                    return Handled::Resume(memoized);
                }
                tracing::debug!(key = %key, "forcing lazy reader binding");
                let lazy = lazy.clone();
                Handled::Run(ir::bind(lazy, move |value| {
                    ir::seq(fx::put(memo_key.clone(), value.clone()), ir::pure(value))
                }))
            }
            Some(value) => Handled::Resume(value.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "reader"
    }
}
