use std::sync::Arc;

use nova_cdi::{
    named, BuiltinBean, CDI_AMBIGUOUS_CODE, CDI_LOOKUP_CODE, CDI_UNSATISFIED_CODE, DeploymentProblem,
};
use nova_core::names;
use nova_index::{ClassInfo, MemoryIndex, MethodInfo};
use nova_types::Type;
use pretty_assertions::assert_eq;

use super::fixtures::{annotation, class_bean, inject, keep_all, priority, process, singleton};

fn garage() -> MemoryIndex {
    MemoryIndex::new()
        .with(singleton("com.acme.Engine"))
        .with(singleton("com.acme.Car").field(inject("engine", Type::class("com.acme.Engine"))))
        .with(
            singleton("com.acme.SportsCar")
                .extends(Type::class("com.acme.Car"))
                .annotated(annotation(*names::ALTERNATIVE))
                .annotated(priority(10)),
        )
}

#[test]
fn alternative_subclass_wins_tie_break() {
    let output = process(garage(), keep_all()).expect("deployment is valid");
    let resolver = output.deployment.resolver();
    let engine = class_bean(&output, "com.acme.Engine");
    let car = class_bean(&output, "com.acme.Car");
    let sports_car = class_bean(&output, "com.acme.SportsCar");

    assert_eq!(&*resolver.resolve(&Type::class("com.acme.Engine"), &[]), &[engine]);

    let cars = resolver.resolve(&Type::class("com.acme.Car"), &[]);
    assert_eq!(&*cars, &[car, sports_car]);
    assert_eq!(resolver.resolve_ambiguity(&cars), Ok(sports_car));

    // Both the car and the inherited field of the sports car resolve to the engine.
    let injected: Vec<_> = output
        .deployment
        .injection_points()
        .iter()
        .map(|ip| ip.resolved_bean())
        .collect();
    assert_eq!(injected, vec![Some(engine), Some(engine)]);
}

#[test]
fn resolution_is_memoized() {
    let output = process(garage(), keep_all()).expect("deployment is valid");
    let resolver = output.deployment.resolver();
    let first = resolver.resolve(&Type::class("com.acme.Car"), &[]);
    let second = resolver.resolve(&Type::class("com.acme.Car"), &[]);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn concurrent_queries_share_one_answer() {
    let output = process(garage(), keep_all()).expect("deployment is valid");
    let resolver = output.deployment.resolver();
    let required = Type::class("com.acme.Car");

    let answers: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| resolver.resolve(&required, &[])))
            .collect();
        handles.into_iter().map(|h| h.join().expect("no panic")).collect()
    });
    let cached = resolver.resolve(&required, &[]);
    for answer in &answers {
        assert!(Arc::ptr_eq(answer, &cached));
    }
}

#[test]
fn named_qualifier_selects_one_implementation() {
    let index = MemoryIndex::new()
        .with(ClassInfo::interface("com.acme.Engine"))
        .with(
            singleton("com.acme.V6")
                .implements(Type::class("com.acme.Engine"))
                .annotated(named("v6")),
        )
        .with(
            singleton("com.acme.V8")
                .implements(Type::class("com.acme.Engine"))
                .annotated(named("v8")),
        )
        .with(
            singleton("com.acme.Car")
                .field(inject("engine", Type::class("com.acme.Engine")).annotated(named("v8"))),
        );
    let output = process(index, keep_all()).expect("deployment is valid");
    let v8 = class_bean(&output, "com.acme.V8");
    assert_eq!(output.deployment.injection_points()[0].resolved_bean(), Some(v8));
}

#[test]
fn field_named_without_value_uses_the_field_name() {
    let index = MemoryIndex::new()
        .with(singleton("com.acme.Tank").annotated(named("fuel")))
        .with(
            singleton("com.acme.Car")
                .field(inject("fuel", Type::class("com.acme.Tank")).annotated(annotation(*names::NAMED))),
        );
    let output = process(index, keep_all()).expect("deployment is valid");
    assert_eq!(output.deployment.injection_points()[0].qualifiers, vec![named("fuel")]);
}

#[test]
fn all_resolution_problems_are_reported_together() {
    let index = MemoryIndex::new()
        .with(ClassInfo::interface("com.acme.Engine"))
        .with(singleton("com.acme.V6").implements(Type::class("com.acme.Engine")))
        .with(singleton("com.acme.V8").implements(Type::class("com.acme.Engine")))
        .with(
            singleton("com.acme.Car")
                .field(inject("engine", Type::class("com.acme.Engine")))
                .field(inject("wheel", Type::class("com.acme.Wheel"))),
        );
    let err = process(index, keep_all()).unwrap_err();
    assert_eq!(err.problems.len(), 2);
    assert!(err.has_code(CDI_AMBIGUOUS_CODE));
    assert!(err.has_code(CDI_UNSATISFIED_CODE));

    let unsatisfied = err
        .problems
        .iter()
        .find(|p| matches!(p, DeploymentProblem::Unsatisfied { .. }))
        .expect("unsatisfied problem");
    assert_eq!(
        unsatisfied.to_string(),
        "Unsatisfied dependency for type com.acme.Wheel and qualifiers [@jakarta.enterprise.inject.Default]\n\t- injection target: com.acme.Car#wheel"
    );
    match err
        .problems
        .iter()
        .find(|p| matches!(p, DeploymentProblem::Ambiguous { .. }))
    {
        Some(DeploymentProblem::Ambiguous { candidates, .. }) => assert_eq!(candidates.len(), 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Found 2 deployment problems: \n[1] "));
}

#[test]
fn failed_programmatic_lookup_only_warns() {
    let instance = Type::parameterized(*names::INSTANCE, vec![Type::class("com.acme.Plugin")]);
    let index = MemoryIndex::new().with(singleton("com.acme.Host").field(inject("plugins", instance)));
    let output = process(index, keep_all()).expect("lookups are not validated eagerly");

    let ip = &output.deployment.injection_points()[0];
    assert_eq!(ip.builtin, Some(BuiltinBean::Instance));
    assert_eq!(ip.resolved_bean(), None);
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == CDI_LOOKUP_CODE && d.message.contains("com.acme.Plugin")));
}

#[test]
fn primitive_injection_point_matches_boxed_producer() {
    let index = MemoryIndex::new()
        .with(
            singleton("com.acme.Defaults").method(
                MethodInfo::new("getTimeout", Vec::new(), Type::class(*names::INTEGER))
                    .annotated(annotation(*names::PRODUCES)),
            ),
        )
        .with(singleton("com.acme.Client").field(inject("timeout", Type::primitive("int").expect("int"))));
    let output = process(index, keep_all()).expect("deployment is valid");
    let producer = output
        .deployment
        .all_beans()
        .iter()
        .find(|bean| bean.is_producer())
        .expect("producer")
        .id;
    assert_eq!(output.deployment.injection_points()[0].resolved_bean(), Some(producer));
}
