use nova_cdi::{ComponentKind, DeploymentProblem, CDI_CIRCULAR_CODE};
use nova_core::names;
use nova_index::{AnnotationInstance, ClassInfo, MemoryIndex, MethodInfo};
use nova_types::Type;
use pretty_assertions::assert_eq;

use super::fixtures::{
    annotation, application_scoped, generated_names, inject, interceptor, interceptor_binding, keep_all, process,
    singleton,
};

/// A injects B, B injects C, C injects A.
fn cycle(b: ClassInfo) -> MemoryIndex {
    MemoryIndex::new()
        .with(singleton("com.acme.A").field(inject("b", Type::class("com.acme.B"))))
        .with(b.field(inject("c", Type::class("com.acme.C"))))
        .with(singleton("com.acme.C").field(inject("a", Type::class("com.acme.A"))))
}

#[test]
fn pseudo_scoped_cycle_is_rejected() {
    let err = process(cycle(singleton("com.acme.B")), keep_all()).unwrap_err();
    assert!(err.has_code(CDI_CIRCULAR_CODE));
    let DeploymentProblem::CircularDependency { remaining } = &err.problems[0] else {
        panic!("expected a circular dependency, got {err}");
    };
    assert_eq!(remaining.len(), 3);
    assert!(err.to_string().starts_with("Circular dependencies not supported:\n\t- "));
}

#[test]
fn normal_scoped_bean_breaks_the_cycle() {
    let output = process(cycle(application_scoped("com.acme.B")), keep_all()).expect("cycle is proxied");
    assert_eq!(
        generated_names(&output),
        vec!["com.acme.B_Bean", "com.acme.A_Bean", "com.acme.C_Bean"]
    );
}

#[test]
fn producers_follow_their_declaring_bean() {
    let index = MemoryIndex::new()
        .with(singleton("com.acme.Car").field(inject("engine", Type::class("com.acme.Engine"))))
        .with(singleton("com.acme.Garage").method(
            MethodInfo::new("engine", Vec::new(), Type::class("com.acme.Engine")).annotated(annotation(*names::PRODUCES)),
        ))
        .with(ClassInfo::class("com.acme.Engine"));
    let output = process(index, keep_all()).expect("deployment is valid");
    let generated = generated_names(&output);
    assert_eq!(generated.len(), 3);
    assert_eq!(generated[0], "com.acme.Garage_Bean");
    assert!(generated[1].starts_with("com.acme.Garage_ProducerMethod_engine_"));
    assert_eq!(generated[2], "com.acme.Car_Bean");
    assert_eq!(output.components[2].references, vec![generated[1].to_owned()]);
}

#[test]
fn interceptors_precede_intercepted_beans_and_observers_come_last() {
    let logged = AnnotationInstance::new("com.acme.Logged");
    let index = MemoryIndex::new()
        .with(interceptor_binding("com.acme.Logged"))
        .with(interceptor("com.acme.LoggingInterceptor", logged.clone(), 1))
        .with(singleton("com.acme.Audit").method(
            MethodInfo::new("onEvent", vec![Type::class(*names::STRING)], Type::Void)
                .param_annotated(0, annotation(*names::OBSERVES)),
        ))
        .with(
            singleton("com.acme.Service")
                .method(MethodInfo::new("ping", Vec::new(), Type::Void).annotated(logged)),
        );
    let output = process(index, keep_all()).expect("deployment is valid");
    let kinds: Vec<ComponentKind> = output.components.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ComponentKind::Interceptor,
            ComponentKind::Bean,
            ComponentKind::Bean,
            ComponentKind::Observer,
        ]
    );
    let service = output
        .components
        .iter()
        .find(|c| c.generated_name == "com.acme.Service_Bean")
        .expect("service component");
    assert_eq!(service.references, vec!["com.acme.LoggingInterceptor_Interceptor".to_owned()]);
    assert_eq!(service.intercepted_methods, vec!["ping()".to_owned()]);
    assert!(output.components[3].generated_name.starts_with("com.acme.Audit_Observer_onEvent_"));
}
