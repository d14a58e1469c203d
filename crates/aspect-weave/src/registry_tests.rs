use crate::{
    manifest::{ClassManifest, MethodEntry},
    proxy::{weave, AspectTarget},
    registry::ProxyRegistry,
};
use aspect_core::{
    advice, arg_get, args, Advice, AdviceBinding, Annotation, AspectError, ConfigurationError,
    Dispatcher, Executor, Invocation, MethodBinding, MethodDescriptor, MethodKind, Proceed,
    SharedValue, TypeDescriptor, UserError,
};
use std::sync::{Arc, Barrier};

struct Greeter {
    greeting: String,
}

impl Greeter {
    fn greet(&self, name: String) -> String {
        format!("{}, {name}", self.greeting)
    }
}

/// Hand-written proxy in the shape `#[interceptable]` generates: a
/// trampoline that boxes the call and a non-virtual executor that re-enters
/// the original inherent method.
struct GreeterProxy {
    target: Arc<Greeter>,
    dispatcher: Arc<Dispatcher>,
}

impl GreeterProxy {
    fn method_greet() -> MethodDescriptor {
        MethodDescriptor::new(TypeDescriptor::of::<Greeter>(), "greet", 0)
    }

    fn exec_greet_0() -> Executor {
        Executor::sync(|target, arguments| {
            let target = target
                .downcast_ref::<Greeter>()
                .ok_or_else(|| UserError::msg("receiver type mismatch"))?;
            let name = arg_get::<String>(arguments, 0).map_err(UserError::new)?;
            Ok(Some(Box::new(target.greet(name))))
        })
    }

    fn greet(&self, name: String) -> String {
        let target: SharedValue = self.target.clone();
        let mut inv = Invocation::new(
            target,
            Self::method_greet(),
            args![name],
            Self::exec_greet_0(),
        );
        self.dispatcher.dispatch(&mut inv).unwrap();
        inv.take_return::<String>().unwrap()
    }
}

struct Shout;

impl Advice for Shout {
    fn apply(&self, chain: Proceed<'_>, inv: &mut Invocation) -> Result<(), AspectError> {
        chain.proceed(inv)?;
        if let Some(s) = inv.return_ref::<String>() {
            let loud = s.to_uppercase();
            inv.set_return(loud);
        }
        Ok(())
    }
}

impl AspectTarget for Greeter {
    type Proxy = GreeterProxy;

    fn manifest() -> ClassManifest {
        ClassManifest::new(TypeDescriptor::of::<Greeter>()).method(MethodEntry {
            method: GreeterProxy::method_greet(),
            kind: MethodKind::Sync,
            overridable: true,
        })
    }

    fn bindings() -> Vec<MethodBinding> {
        vec![MethodBinding {
            method: GreeterProxy::method_greet(),
            kind: MethodKind::Sync,
            annotation: Annotation::Single(AdviceBinding::new(advice(Shout))),
        }]
    }

    fn weave(target: Arc<Self>, dispatcher: Arc<Dispatcher>) -> Arc<GreeterProxy> {
        Arc::new(GreeterProxy { target, dispatcher })
    }
}

#[test]
fn hand_written_proxy_routes_through_the_dispatcher() {
    let registry = ProxyRegistry::new();
    let dispatcher = Arc::new(Dispatcher::new());
    let proxy = weave(
        Greeter {
            greeting: "hello".into(),
        },
        dispatcher,
        &registry,
    )
    .unwrap();

    assert_eq!(proxy.greet("world".into()), "HELLO, WORLD");

    let published = registry.get(&TypeDescriptor::of::<Greeter>()).unwrap();
    assert_eq!(published.name(), "GreeterProxy");
    assert_eq!(published.intercepted().len(), 1);
    assert_eq!(published.intercepted()[0].executor_name, "exec_greet_0");
}

#[test]
fn synthesis_is_idempotent() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    let first = registry
        .get_or_synthesize(&Greeter::manifest(), &Greeter::bindings(), &dispatcher)
        .unwrap();
    let second = registry
        .get_or_synthesize(&Greeter::manifest(), &Greeter::bindings(), &dispatcher)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn concurrent_synthesis_publishes_once() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    let threads = 8;
    let barrier = Barrier::new(threads);
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry
                        .get_or_synthesize(&Greeter::manifest(), &Greeter::bindings(), &dispatcher)
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for proxy in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], proxy));
    }
}

mod alpha {
    pub struct Widget;
}

mod beta {
    pub struct Widget;
}

#[test]
fn same_simple_name_gets_a_numeric_suffix() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    let first = registry
        .get_or_synthesize(
            &ClassManifest::new(TypeDescriptor::of::<alpha::Widget>()),
            &[],
            &dispatcher,
        )
        .unwrap();
    let second = registry
        .get_or_synthesize(
            &ClassManifest::new(TypeDescriptor::of::<beta::Widget>()),
            &[],
            &dispatcher,
        )
        .unwrap();
    assert_eq!(first.name(), "WidgetProxy");
    assert_eq!(second.name(), "WidgetProxy2");
}

#[test]
fn no_pointcut_class_publishes_an_empty_site_table() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    assert!(!ProxyRegistry::is_aspect_target(&[]));
    let proxy = registry
        .get_or_synthesize(
            &ClassManifest::new(TypeDescriptor::of::<alpha::Widget>()),
            &[],
            &dispatcher,
        )
        .unwrap();
    assert!(proxy.intercepted().is_empty());
}

struct Sealed;

impl Sealed {
    fn frozen(&self) -> u32 {
        1
    }
}

#[test]
fn non_overridable_pointcut_fails_and_publishes_nothing() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    let method = MethodDescriptor::new(TypeDescriptor::of::<Sealed>(), "frozen", 0);
    let manifest = ClassManifest::new(TypeDescriptor::of::<Sealed>()).method(MethodEntry {
        method: method.clone(),
        kind: MethodKind::Sync,
        overridable: false,
    });
    let bindings = vec![MethodBinding {
        method: method.clone(),
        kind: MethodKind::Sync,
        annotation: Annotation::Single(AdviceBinding::new(advice(Shout))),
    }];

    let err = registry
        .get_or_synthesize(&manifest, &bindings, &dispatcher)
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::MethodNotOverridable(_)));
    assert!(registry.get(&TypeDescriptor::of::<Sealed>()).is_none());
    // Validation runs before annotation install, so nothing leaked into the
    // dispatcher either.
    assert!(!dispatcher.is_pointcut(&method));
    let _ = Sealed.frozen();
}

#[test]
fn open_generic_manifest_is_rejected() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    let manifest = ClassManifest::new(TypeDescriptor::of::<alpha::Widget>()).open_generic();
    let err = registry
        .get_or_synthesize(&manifest, &[], &dispatcher)
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::OpenGenericTarget(_)));
}

#[test]
fn binding_for_an_undeclared_method_is_rejected() {
    let registry = ProxyRegistry::new();
    let dispatcher = Dispatcher::new();
    let manifest = ClassManifest::new(TypeDescriptor::of::<Sealed>());
    let bindings = vec![MethodBinding {
        method: MethodDescriptor::new(TypeDescriptor::of::<Sealed>(), "phantom", 3),
        kind: MethodKind::Sync,
        annotation: Annotation::Single(AdviceBinding::new(advice(Shout))),
    }];
    let err = registry
        .get_or_synthesize(&manifest, &bindings, &dispatcher)
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingRegistration(_)));
}
