//! # aspect-core
//!
//! The interception runtime: advice traits and chains, the per-call
//! invocation record, and the dispatcher that wires a method call to its
//! advice chain and back into the original body.
//!
//! ## Subsystems
//!
//! - **Descriptors** (`descriptor`): type/method keys for annotation tables
//!   and chain caches.
//! - **Advice model** (`advice`, `chain`, `aspects`): the advice traits, the
//!   immutable linked chain, and the declarative annotation surface.
//! - **Dispatch** (`dispatch`): chain lookup, memoization, and the proxy
//!   back-reference hook.
//! - **Async adaptation** (`task`): shared tasks so several advices can
//!   await one underlying body.
pub mod advice;
pub mod aspects;
pub mod chain;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod invocation;
pub mod provider;
pub mod slot;
pub mod task;
pub mod value;

pub use advice::{advice, async_advice, Advice, AdviceKind, AsyncAdvice};
pub use aspects::{AdviceBinding, AdviceSource, Annotation, MethodBinding, TypeRef};
pub use chain::{build_chain, AsyncProceed, ChainNode, Proceed};
pub use descriptor::{MethodDescriptor, MethodKind, TypeDescriptor};
pub use dispatch::{Dispatcher, ProxyBackref};
pub use error::{AspectError, ConfigurationError, UnsupportedOperation, UserError};
pub use invocation::{AsyncExecutor, Executor, Invocation, SyncExecutor};
pub use provider::{InstanceProvider, Provided};
pub use slot::{ProxyAware, ProxySlot};
pub use task::{Task, TaskFuture, TaskOutcome};
pub use value::{arg, arg_get, arg_ref, boxed, shared, unbox, ArgValue, BoxedValue, SharedValue};
