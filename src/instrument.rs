//! Call instrumentation for cache operations.
//!
//! An instrumented operation declares a stable [`OperationId`] and is driven
//! through [`Instrumented::invoke`], which runs a [`CallInterceptor`] chain
//! around it. Two interceptors persist their state in the key-value store:
//!
//! - [`CountCalls`] increments the counter key `<operation>` before the call.
//! - [`RecordHistory`] appends the call's input to `<operation>:inputs` and its
//!   output to `<operation>:outputs` after the call returns successfully.
//!
//! Interceptors compose as tuples. `(A, B)` runs `A` outermost: `A.before`,
//! `B.before`, the call, `B.after`, `A.after`.
//!
//! ```ignore
//! let chain = Instrumented::new((
//!     CountCalls::new(backend.clone()),
//!     RecordHistory::new(backend.clone()),
//! ));
//! let key = chain.invoke(CallSite::new(&STORE, args), do_store()).await?;
//! ```

use crate::backend::CacheBackend;
use crate::error::Result;
use crate::key::CacheKeyBuilder;
use std::fmt;
use std::future::Future;

/// Stable identifier of an instrumented operation.
///
/// The name is the namespace for the operation's counter and history keys,
/// so it must not change between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(&'static str);

impl OperationId {
    pub const fn new(name: &'static str) -> Self {
        OperationId(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One invocation as seen by interceptors.
#[derive(Debug, Clone)]
pub struct CallSite<'a> {
    pub operation: &'a OperationId,
    /// Rendered argument tuple, e.g. `("abc",)`.
    pub input: String,
}

impl<'a> CallSite<'a> {
    /// Build a call site from the argument literals, in order.
    pub fn new(operation: &'a OperationId, args: &[String]) -> Self {
        CallSite {
            operation,
            input: render_args(args),
        }
    }
}

/// Render arguments as a tuple literal: `()`, `(1,)`, `(1, "a")`.
fn render_args(args: &[String]) -> String {
    match args {
        [] => "()".to_string(),
        [only] => format!("({},)", only),
        many => format!("({})", many.join(", ")),
    }
}

/// Hooks run around an instrumented operation.
///
/// Both hooks default to doing nothing. An error from either hook aborts the
/// invocation and is returned to the caller.
#[allow(async_fn_in_trait)]
pub trait CallInterceptor: Send + Sync {
    /// Runs before the wrapped operation.
    async fn before_call(&self, _call: &CallSite<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs after the wrapped operation returned `Ok(output)`.
    async fn after_call(&self, _call: &CallSite<'_>, _output: &str) -> Result<()> {
        Ok(())
    }
}

impl<A: CallInterceptor, B: CallInterceptor> CallInterceptor for (A, B) {
    async fn before_call(&self, call: &CallSite<'_>) -> Result<()> {
        self.0.before_call(call).await?;
        self.1.before_call(call).await
    }

    async fn after_call(&self, call: &CallSite<'_>, output: &str) -> Result<()> {
        self.1.after_call(call, output).await?;
        self.0.after_call(call, output).await
    }
}

/// Increments `<operation>` once per invocation, before the call runs.
#[derive(Clone)]
pub struct CountCalls<B: CacheBackend> {
    backend: B,
}

impl<B: CacheBackend> CountCalls<B> {
    pub fn new(backend: B) -> Self {
        CountCalls { backend }
    }
}

impl<B: CacheBackend> CallInterceptor for CountCalls<B> {
    async fn before_call(&self, call: &CallSite<'_>) -> Result<()> {
        let count = self.backend.incr(call.operation.name()).await?;
        debug!("» {} call #{}", call.operation, count);
        Ok(())
    }
}

/// Appends input and output to the operation's history lists.
#[derive(Clone)]
pub struct RecordHistory<B: CacheBackend> {
    backend: B,
}

impl<B: CacheBackend> RecordHistory<B> {
    pub fn new(backend: B) -> Self {
        RecordHistory { backend }
    }
}

impl<B: CacheBackend> CallInterceptor for RecordHistory<B> {
    async fn after_call(&self, call: &CallSite<'_>, output: &str) -> Result<()> {
        let name = call.operation.name();
        self.backend
            .rpush(
                &CacheKeyBuilder::history_inputs(name),
                call.input.clone().into_bytes(),
            )
            .await?;
        self.backend
            .rpush(
                &CacheKeyBuilder::history_outputs(name),
                output.as_bytes().to_vec(),
            )
            .await?;
        Ok(())
    }
}

/// Drives operations through an interceptor chain.
#[derive(Clone)]
pub struct Instrumented<I: CallInterceptor> {
    interceptor: I,
}

impl<I: CallInterceptor> Instrumented<I> {
    pub fn new(interceptor: I) -> Self {
        Instrumented { interceptor }
    }

    /// Run `operation` wrapped by the interceptor chain.
    ///
    /// If the operation fails, `before_call` hooks have already run and
    /// `after_call` hooks are skipped; the error is returned unchanged.
    ///
    /// # Errors
    /// Returns the first error from a hook or from the operation itself.
    pub async fn invoke<T, Fut>(&self, call: CallSite<'_>, operation: Fut) -> Result<T>
    where
        T: fmt::Display,
        Fut: Future<Output = Result<T>>,
    {
        self.interceptor.before_call(&call).await?;
        let output = operation.await?;
        self.interceptor
            .after_call(&call, &output.to_string())
            .await?;
        Ok(output)
    }
}

/// One recorded call: rendered input tuple and rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEntry {
    pub input: String,
    pub output: String,
}

/// Recorded history of an operation, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHistory {
    pub operation: String,
    /// Number of recorded inputs.
    pub calls: usize,
    /// Inputs zipped with outputs in call order.
    pub entries: Vec<CallEntry>,
}

impl CallHistory {
    /// Read the history lists of `operation` from `backend`.
    ///
    /// # Errors
    /// Returns `Err` if the backend fails or a history key has the wrong type
    pub async fn load<B: CacheBackend>(backend: &B, operation: &OperationId) -> Result<Self> {
        let name = operation.name();
        let inputs = backend
            .lrange(&CacheKeyBuilder::history_inputs(name), 0, -1)
            .await?;
        let outputs = backend
            .lrange(&CacheKeyBuilder::history_outputs(name), 0, -1)
            .await?;

        let calls = inputs.len();
        let entries = inputs
            .into_iter()
            .zip(outputs)
            .map(|(input, output)| CallEntry {
                input: String::from_utf8_lossy(&input).into_owned(),
                output: String::from_utf8_lossy(&output).into_owned(),
            })
            .collect();

        Ok(CallHistory {
            operation: name.to_string(),
            calls,
            entries,
        })
    }
}

impl fmt::Display for CallHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} was called {} times:", self.operation, self.calls)?;
        for entry in &self.entries {
            writeln!(f, "{}(*{}) -> {}", self.operation, entry.input, entry.output)?;
        }
        Ok(())
    }
}
