use crate::Container;
use aspect_core::{
    advice, arg_get, args, Advice, AdviceBinding, Annotation, AspectError, ConfigurationError,
    Dispatcher, Executor, Invocation, MethodBinding, MethodDescriptor, MethodKind, Proceed,
    SharedValue, TypeDescriptor, TypeRef, UserError,
};
use aspect_weave::{AspectTarget, ClassManifest, MethodEntry};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Hand-woven target exercising the container without the macro layer.
pub struct Doubler {
    bias: f64,
}

impl Doubler {
    fn double(&self, value: f64) -> f64 {
        value * 2.0 + self.bias
    }
}

pub struct DoublerProxy {
    target: Arc<Doubler>,
    dispatcher: Arc<Dispatcher>,
}

impl std::fmt::Debug for DoublerProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoublerProxy").finish()
    }
}

impl DoublerProxy {
    fn method_double() -> MethodDescriptor {
        MethodDescriptor::new(TypeDescriptor::of::<Doubler>(), "double", 0)
    }

    fn exec_double_0() -> Executor {
        Executor::sync(|target, arguments| {
            let target = target
                .downcast_ref::<Doubler>()
                .ok_or_else(|| UserError::msg("receiver type mismatch"))?;
            let value = arg_get::<f64>(arguments, 0).map_err(UserError::new)?;
            Ok(Some(Box::new(target.double(value))))
        })
    }

    pub fn double(&self, value: f64) -> Result<f64, AspectError> {
        let target: SharedValue = self.target.clone();
        let mut inv = Invocation::new(
            target,
            Self::method_double(),
            args![value],
            Self::exec_double_0(),
        );
        self.dispatcher.dispatch(&mut inv)?;
        inv.take_return::<f64>()
    }
}

static APPLIED: AtomicUsize = AtomicUsize::new(0);

pub struct CountingAdvice;

impl Advice for CountingAdvice {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
        APPLIED.fetch_add(1, Ordering::SeqCst);
        chain.proceed(inv)
    }
}

impl AspectTarget for Doubler {
    type Proxy = DoublerProxy;

    fn manifest() -> ClassManifest {
        ClassManifest::new(TypeDescriptor::of::<Doubler>()).method(MethodEntry {
            method: DoublerProxy::method_double(),
            kind: MethodKind::Sync,
            overridable: true,
        })
    }

    fn bindings() -> Vec<MethodBinding> {
        vec![MethodBinding {
            method: DoublerProxy::method_double(),
            kind: MethodKind::Sync,
            annotation: Annotation::TypeList(vec![TypeRef::Advice(TypeDescriptor::of::<
                CountingAdvice,
            >())]),
        }]
    }

    fn weave(target: Arc<Self>, dispatcher: Arc<Dispatcher>) -> Arc<DoublerProxy> {
        Arc::new(DoublerProxy { target, dispatcher })
    }
}

#[test]
fn registration_substitutes_the_proxy_and_resolution_is_singleton() {
    let container = Container::new();
    container.register_advice(CountingAdvice).unwrap();
    container.register::<Doubler>(|| Doubler { bias: 1.0 }).unwrap();

    let first = container.resolve::<Doubler>().unwrap();
    let second = container.resolve::<Doubler>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let before = APPLIED.load(Ordering::SeqCst);
    assert_eq!(first.double(4.0).unwrap(), 9.0);
    assert_eq!(APPLIED.load(Ordering::SeqCst), before + 1);
}

#[test]
fn duplicate_registration_is_rejected() {
    let container = Container::new();
    container.register_advice(CountingAdvice).unwrap();
    container.register::<Doubler>(|| Doubler { bias: 0.0 }).unwrap();
    let err = container
        .register::<Doubler>(|| Doubler { bias: 0.0 })
        .unwrap_err();
    assert!(matches!(
        err,
        AspectError::Configuration(ConfigurationError::DuplicateRegistration(_))
    ));
}

#[test]
fn resolving_an_unregistered_type_is_rejected() {
    let container = Container::new();
    let err = container.resolve::<Doubler>().unwrap_err();
    assert!(matches!(
        err,
        AspectError::Configuration(ConfigurationError::MissingRegistration(_))
    ));
}

#[test]
fn deferred_advices_fail_without_any_provider() {
    // No advice registration ever happened, so no provider was installed.
    let container = Container::new();
    container.register::<Doubler>(|| Doubler { bias: 0.0 }).unwrap();
    let proxy = container.resolve::<Doubler>().unwrap();
    let err = proxy.double(1.0).unwrap_err();
    assert!(matches!(
        err,
        AspectError::Configuration(ConfigurationError::MissingInstanceProvider(_))
    ));
}

#[test]
fn deferred_advices_fail_when_the_type_is_unregistered() {
    let container = Container::new();
    // Installing an unrelated advice wires the provider in, but the type the
    // pointcut asks for is still unknown.
    container.register_advice(UnrelatedAdvice).unwrap();
    container.register::<Doubler>(|| Doubler { bias: 0.0 }).unwrap();
    let proxy = container.resolve::<Doubler>().unwrap();
    let err = proxy.double(1.0).unwrap_err();
    assert!(matches!(
        err,
        AspectError::Configuration(ConfigurationError::UnresolvableAdviceType(_))
    ));
}

pub struct UnrelatedAdvice;

impl Advice for UnrelatedAdvice {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
        chain.proceed(inv)
    }
}

#[test]
fn duplicate_advice_type_registration_is_rejected() {
    let container = Container::new();
    container.register_advice(CountingAdvice).unwrap();
    let err = container.register_advice(CountingAdvice).unwrap_err();
    assert!(matches!(
        err,
        AspectError::Configuration(ConfigurationError::DuplicateRegistration(_))
    ));
}

#[test]
fn raw_registration_resolves_without_a_proxy() {
    let container = Container::new();
    container
        .register_raw::<String>(|| "plain".to_string())
        .unwrap();
    let value = container.resolve_raw::<String>().unwrap();
    assert_eq!(value.as_str(), "plain");
}

#[test]
fn concurrent_first_resolution_runs_the_factory_once() {
    let container = Container::new();
    let built = Arc::new(AtomicUsize::new(0));
    let observer = built.clone();
    container
        .register_raw::<u64>(move || {
            observer.fetch_add(1, Ordering::SeqCst);
            42u64
        })
        .unwrap();

    let threads = 8;
    let barrier = std::sync::Barrier::new(threads);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    container.resolve_raw::<u64>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(built.load(Ordering::SeqCst), 1);
    for value in &results {
        assert_eq!(**value, 42);
        assert!(Arc::ptr_eq(&results[0], value));
    }
}

pub struct GroupMarker;

#[test]
fn bundle_types_expand_through_the_container_provider() {
    let container = Container::new();
    container
        .register_advice_factory(|| UnrelatedAdvice)
        .unwrap();
    container
        .register_advice_bundle::<GroupMarker>(vec![
            TypeRef::Advice(TypeDescriptor::of::<UnrelatedAdvice>()),
            TypeRef::Advice(TypeDescriptor::of::<UnrelatedAdvice>()),
        ])
        .unwrap();

    let dispatcher = container.dispatcher();
    let method = MethodDescriptor::new(TypeDescriptor::of::<GroupMarker>(), "observed", 0);
    dispatcher
        .annotate(
            &method,
            MethodKind::Sync,
            Annotation::TypeList(vec![TypeRef::Bundle(TypeDescriptor::of::<GroupMarker>())]),
        )
        .unwrap();

    let target: SharedValue = Arc::new(GroupMarker);
    let mut inv = Invocation::new(
        target,
        method,
        args![],
        Executor::sync(|_, _| Ok(Some(Box::new(5u32)))),
    );
    dispatcher.dispatch(&mut inv).unwrap();
    assert_eq!(inv.return_ref::<u32>(), Some(&5));
}

#[test]
fn direct_annotations_still_work_through_container_dispatch() {
    let container = Container::new();
    let counted = Arc::new(AtomicUsize::new(0));

    struct Local(Arc<AtomicUsize>);
    impl Advice for Local {
        fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            chain.proceed(inv)
        }
    }

    let method = MethodDescriptor::new(TypeDescriptor::of::<u8>(), "direct", 0);
    container
        .dispatcher()
        .annotate(
            &method,
            MethodKind::Sync,
            Annotation::Single(AdviceBinding::new(advice(Local(counted.clone())))),
        )
        .unwrap();

    let target: SharedValue = Arc::new(0u8);
    let mut inv = Invocation::new(
        target,
        method,
        args![],
        Executor::sync(|_, _| Ok(None)),
    );
    container.dispatcher().dispatch(&mut inv).unwrap();
    assert_eq!(counted.load(Ordering::SeqCst), 1);
}
