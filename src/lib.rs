//! # aspect
//!
//! Method interception for ordinary Rust structs. Mark methods of an
//! inherent impl as pointcuts, and obtain (usually through the container) a
//! proxy whose marked methods run a user-defined advice chain that may
//! proceed to, short-circuit, or wrap the original behavior, including
//! asynchronous behavior.
//!
//! ```ignore
//! #[interceptable]
//! impl Calculator {
//!     #[pointcut(advice(LoggingAdvice::new(&log)))]
//!     pub fn one_advice(&self, contract: Contract, y: f64) -> Contract {
//!         // original body, re-entered by the chain's proceed
//!     }
//! }
//!
//! let container = Container::new();
//! container.register::<Calculator>(Calculator::default)?;
//! let calculator = container.resolve::<Calculator>()?; // CalculatorProxy
//! ```
//!
//! The member crates split the runtime the way the original splits its
//! projects: `aspect-core` (advice model and dispatcher), `aspect-weave`
//! plus `aspect-macros` (proxy synthesis), `aspect-container` (DI glue).
pub use aspect_core::{
    advice, arg, arg_get, arg_ref, async_advice, boxed, build_chain, shared, unbox, Advice,
    AdviceBinding, AdviceKind, AdviceSource, Annotation, ArgValue, AspectError, AsyncAdvice,
    AsyncExecutor, AsyncProceed, BoxedValue, ChainNode, ConfigurationError, Dispatcher, Executor,
    InstanceProvider, Invocation, MethodBinding, MethodDescriptor, MethodKind, Proceed, Provided,
    ProxyAware, ProxyBackref, ProxySlot, SharedValue, SyncExecutor, Task, TaskFuture, TaskOutcome,
    TypeDescriptor, TypeRef, UnsupportedOperation, UserError,
};
pub use aspect_core::args;
// The derive shares the trait's name, in the macro namespace.
pub use aspect_macros::{interceptable, ProxyAware};
pub use aspect_weave::{
    weave, AspectTarget, ClassManifest, MethodEntry, MethodSite, ProxyRegistry, ProxyType,
};

pub use aspect_container::Container;
