//! Shared fixtures for the end-to-end interception tests.
//!
//! Advice expressions inside `#[pointcut(...)]` are evaluated in the
//! generated bindings function, so anything the tests want to observe
//! afterwards lives in scenario-scoped statics.
#![allow(dead_code)]

use aspect::{Advice, AspectError, AsyncAdvice, AsyncProceed, Invocation, Proceed};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

pub type Log = Mutex<Vec<String>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Contract {
    pub x: f64,
}

/// The enter/exit instants of one logging bracket.
#[derive(Default)]
pub struct TimeWindow {
    pub entered: Option<Instant>,
    pub exited: Option<Instant>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Appends "Entering <method>" / "Exiting <method>" around the call,
/// optionally tagged with a context label, and records the bracket window.
pub struct LoggingAdvice {
    log: &'static Log,
    context: Option<&'static str>,
    window: Option<&'static Mutex<TimeWindow>>,
}

impl LoggingAdvice {
    pub fn new(log: &'static Log) -> Self {
        Self {
            log,
            context: None,
            window: None,
        }
    }

    pub fn with_context(log: &'static Log, context: &'static str) -> Self {
        Self {
            log,
            context: Some(context),
            window: None,
        }
    }

    pub fn tracked(log: &'static Log, window: &'static Mutex<TimeWindow>) -> Self {
        Self {
            log,
            context: None,
            window: Some(window),
        }
    }

    fn entry(&self, phase: &str, inv: &Invocation) -> String {
        match self.context {
            None => format!("{phase} {}", inv.method().name()),
            Some(context) => format!("{phase} {} ({context})", inv.method().name()),
        }
    }
}

impl Advice for LoggingAdvice {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
        self.log.lock().unwrap().push(self.entry("Entering", inv));
        if let Some(window) = self.window {
            window.lock().unwrap().entered = Some(Instant::now());
        }
        chain.proceed(inv)?;
        if let Some(window) = self.window {
            window.lock().unwrap().exited = Some(Instant::now());
        }
        self.log.lock().unwrap().push(self.entry("Exiting", inv));
        Ok(())
    }
}

/// Accepts the call when the watched argument exceeds one, stamping the
/// validation instant; rejects it otherwise.
pub struct ValidationAdvice {
    arg_index: usize,
    validated_at: &'static Mutex<Option<Instant>>,
}

impl ValidationAdvice {
    pub fn new(arg_index: usize, validated_at: &'static Mutex<Option<Instant>>) -> Self {
        Self {
            arg_index,
            validated_at,
        }
    }
}

impl Advice for ValidationAdvice {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
        let value = *aspect::arg_ref::<f64>(&inv.arguments, self.arg_index)?;
        if value <= 1.0 {
            return Err(aspect::UserError::msg(format!("rejected input {value}")).into());
        }
        *self.validated_at.lock().unwrap() = Some(Instant::now());
        chain.proceed(inv)
    }
}

/// Memoizes `Arc<Contract>` results by the first argument; a hit
/// short-circuits the rest of the chain.
pub struct CachingAdvice {
    cache: Mutex<HashMap<u64, std::sync::Arc<Contract>>>,
}

impl CachingAdvice {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl Advice for CachingAdvice {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
        let key = aspect::arg_ref::<f64>(&inv.arguments, 0)?.to_bits();
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            inv.set_return(hit.clone());
            return Ok(());
        }
        chain.proceed(inv)?;
        if let Some(result) = inv.return_ref::<std::sync::Arc<Contract>>() {
            self.cache.lock().unwrap().insert(key, result.clone());
        }
        Ok(())
    }
}

/// Awaits its own delay, stamps the instant, then proceeds; afterwards joins
/// the stored task a second time to confirm the body is shared.
pub struct DelayThenProceed {
    delay: Duration,
    applied_at: &'static Mutex<Option<Instant>>,
}

impl DelayThenProceed {
    pub fn new(delay_ms: u64, applied_at: &'static Mutex<Option<Instant>>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            applied_at,
        }
    }
}

#[async_trait]
impl AsyncAdvice for DelayThenProceed {
    async fn apply(
        &self,
        chain: AsyncProceed<'_>,
        inv: &mut Invocation,
    ) -> Result<(), AspectError> {
        tokio::time::sleep(self.delay).await;
        *self.applied_at.lock().unwrap() = Some(Instant::now());
        chain.proceed(inv).await?;
        let _ = inv.task()?.join().await;
        Ok(())
    }
}

/// Starts its own timed work up front, proceeds (driving the body), then
/// finishes the work and stamps the instant.
pub struct ParallelWork {
    delay: Duration,
    applied_at: &'static Mutex<Option<Instant>>,
}

impl ParallelWork {
    pub fn new(delay_ms: u64, applied_at: &'static Mutex<Option<Instant>>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            applied_at,
        }
    }
}

#[async_trait]
impl AsyncAdvice for ParallelWork {
    async fn apply(
        &self,
        chain: AsyncProceed<'_>,
        inv: &mut Invocation,
    ) -> Result<(), AspectError> {
        // The deadline is fixed here, before the chain proceeds.
        let work = tokio::time::sleep(self.delay);
        chain.proceed(inv).await?;
        work.await;
        *self.applied_at.lock().unwrap() = Some(Instant::now());
        Ok(())
    }
}
