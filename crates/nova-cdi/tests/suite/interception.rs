use nova_cdi::{
    intercepted_method_candidates, BeanId, InterceptionOptions, InterceptorBindings, ProcessorOutput,
    Transformation, CDI_DEFINITION_CODE, CDI_FINAL_METHOD_CODE, CDI_INTERCEPTED_PRIVATE_METHOD_CODE,
};
use nova_config::CdiConfig;
use nova_core::{names, DotName};
use nova_index::{
    access, AnnotationInstance, AnnotationValue, ClassIndex, ClassInfo, MemoryIndex, MethodInfo,
};
use nova_types::Type;
use pretty_assertions::assert_eq;

use super::fixtures::{
    application_scoped, class_bean, interceptor, interceptor_binding, keep_all, process, singleton,
};

fn logged() -> AnnotationInstance {
    AnnotationInstance::new("com.acme.Logged")
}

fn audited() -> AnnotationInstance {
    AnnotationInstance::new("com.acme.Audited")
}

fn void_method(name: &str) -> MethodInfo {
    MethodInfo::new(name, Vec::new(), Type::Void)
}

/// `@Logged` and `@Audited(level = "info")` bindings with one interceptor each.
fn bindings_index() -> MemoryIndex {
    MemoryIndex::new()
        .with(interceptor_binding("com.acme.Logged"))
        .with(interceptor_binding("com.acme.Audited").method(MethodInfo::member(
            "level",
            Type::class(*names::STRING),
            Some(AnnotationValue::from("info")),
        )))
        .with(interceptor("com.acme.LoggingInterceptor", logged(), 10))
        .with(interceptor("com.acme.AuditInterceptor", audited(), 5))
}

fn interceptor_id(output: &ProcessorOutput, class: &str) -> BeanId {
    output
        .deployment
        .interceptors()
        .find(|bean| bean.bean_class == DotName::new(class))
        .map(|bean| bean.id)
        .unwrap_or_else(|| panic!("no interceptor {class}"))
}

fn intercepted(output: &ProcessorOutput, class: &str) -> Vec<(String, Vec<BeanId>)> {
    let bean = class_bean(output, class);
    output
        .deployment
        .intercepted_methods(bean)
        .map(|methods| {
            methods
                .iter()
                .map(|(key, method)| (key.to_string(), method.interceptors.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn method_level_binding_shadows_class_level_binding() {
    let index = bindings_index().with(
        singleton("com.acme.Foo")
            .annotated(logged())
            .annotated(audited())
            .method(void_method("ping"))
            .method(void_method("trace").annotated(audited().with("level", "debug"))),
    );
    let (bindings, problems) = InterceptorBindings::new(&index);
    assert!(problems.is_empty());
    let foo = index.class_by_name("com.acme.Foo".into()).expect("Foo is indexed");
    let class_level = bindings.class_level(&index, &foo);
    assert_eq!(class_level, vec![logged(), audited()]);

    let candidates =
        intercepted_method_candidates(&index, &bindings, &foo, &class_level, InterceptionOptions::default());
    let ping = candidates.methods.values().find(|m| m.method.name == "ping").expect("ping");
    assert_eq!(ping.bindings, vec![logged(), audited()]);
    let trace = candidates.methods.values().find(|m| m.method.name == "trace").expect("trace");
    assert_eq!(trace.bindings.len(), 2);
    assert_eq!(trace.bindings[0].name, DotName::new("com.acme.Audited"));
    assert_eq!(
        trace.bindings[0].value("level").and_then(AnnotationValue::as_str),
        Some("debug")
    );
    assert_eq!(trace.bindings[1], logged());
}

#[test]
fn superclass_binding_merges_with_method_binding() {
    let index = bindings_index()
        .with(interceptor_binding("com.acme.Tracked").annotated(AnnotationInstance::new(*names::INHERITED)))
        .with(ClassInfo::class("com.acme.Base").annotated(AnnotationInstance::new("com.acme.Tracked")))
        .with(
            singleton("com.acme.Foo")
                .extends(Type::class("com.acme.Base"))
                .method(void_method("bar").annotated(logged()))
                .method(
                    void_method("baz")
                        .annotated(AnnotationInstance::new("com.acme.Tracked").with("level", "debug")),
                ),
        );
    let (bindings, problems) = InterceptorBindings::new(&index);
    assert!(problems.is_empty());
    let foo = index.class_by_name("com.acme.Foo".into()).expect("Foo is indexed");
    let class_level = bindings.class_level(&index, &foo);
    assert_eq!(class_level, vec![AnnotationInstance::new("com.acme.Tracked")]);

    let candidates =
        intercepted_method_candidates(&index, &bindings, &foo, &class_level, InterceptionOptions::default());
    let bar = candidates.methods.values().find(|m| m.method.name == "bar").expect("bar");
    assert_eq!(
        bar.bindings,
        vec![logged(), AnnotationInstance::new("com.acme.Tracked")]
    );
    let baz = candidates.methods.values().find(|m| m.method.name == "baz").expect("baz");
    assert_eq!(
        baz.bindings,
        vec![AnnotationInstance::new("com.acme.Tracked").with("level", "debug")]
    );
}

#[test]
fn interceptors_are_bound_by_binding_values_and_sorted_by_priority() {
    let index = bindings_index().with(
        singleton("com.acme.Foo")
            .annotated(logged())
            .method(void_method("ping"))
            .method(void_method("audit").annotated(audited()))
            .method(void_method("trace").annotated(audited().with("level", "debug"))),
    );
    let output = process(index, keep_all()).expect("deployment is valid");
    let logging = interceptor_id(&output, "com.acme.LoggingInterceptor");
    let audit = interceptor_id(&output, "com.acme.AuditInterceptor");

    let methods = intercepted(&output, "com.acme.Foo");
    let find = |name: &str| {
        methods
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_else(|| panic!("{name} is not intercepted"))
    };
    assert_eq!(find("ping()"), vec![logging]);
    assert_eq!(find("audit()"), vec![audit, logging]);
    // `level` is a binding member, so "debug" does not match the interceptor's "info".
    assert_eq!(find("trace()"), vec![logging]);

    let foo = class_bean(&output, "com.acme.Foo");
    assert_eq!(output.deployment.bound_interceptors(foo), &[audit, logging]);
}

#[test]
fn beans_without_matching_interceptors_are_not_intercepted() {
    let index = bindings_index()
        .with(interceptor_binding("com.acme.Timed"))
        .with(
            singleton("com.acme.Foo").method(void_method("ping").annotated(AnnotationInstance::new("com.acme.Timed"))),
        );
    let output = process(index, keep_all()).expect("deployment is valid");
    assert!(intercepted(&output, "com.acme.Foo").is_empty());
    assert!(output.deployment.bound_interceptors(class_bean(&output, "com.acme.Foo")).is_empty());
}

fn final_service() -> MemoryIndex {
    MemoryIndex::new().with(application_scoped("com.acme.Service").with_flags(access::FINAL))
}

#[test]
fn final_normal_scoped_class_is_rejected_without_transformation() {
    let config = CdiConfig {
        transform_unproxyable_classes: false,
        ..keep_all()
    };
    let err = process(final_service(), config).unwrap_err();
    assert!(err.has_code(CDI_DEFINITION_CODE));
    assert!(err.to_string().contains("Normal scoped beans must not be final"));
}

#[test]
fn final_normal_scoped_class_is_transformed() {
    let output = process(final_service(), keep_all()).expect("final modifier is removed");
    assert_eq!(
        output.transformations,
        vec![Transformation::FinalClassRemoval {
            class: DotName::new("com.acme.Service"),
        }]
    );
}

fn final_method_index() -> MemoryIndex {
    bindings_index().with(
        singleton("com.acme.Foo")
            .method(void_method("ping").annotated(logged()))
            .method(void_method("pong").annotated(logged()).with_flags(access::FINAL)),
    )
}

#[test]
fn final_methods_are_transformed_when_allowed() {
    let output = process(final_method_index(), keep_all()).expect("deployment is valid");
    let names: Vec<String> = intercepted(&output, "com.acme.Foo").into_iter().map(|(key, _)| key).collect();
    assert_eq!(names, vec!["ping()", "pong()"]);
    assert!(matches!(
        output.transformations.as_slice(),
        [Transformation::FinalMethodRemoval { class, method }]
            if *class == DotName::new("com.acme.Foo") && method.name == "pong"
    ));
}

#[test]
fn final_methods_are_skipped_with_a_warning_otherwise() {
    let config = CdiConfig {
        transform_unproxyable_classes: false,
        ..keep_all()
    };
    let output = process(final_method_index(), config).expect("deployment is valid");
    let names: Vec<String> = intercepted(&output, "com.acme.Foo").into_iter().map(|(key, _)| key).collect();
    assert_eq!(names, vec!["ping()"]);
    assert!(output.transformations.is_empty());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == CDI_FINAL_METHOD_CODE && d.message.contains("pong")));
}

fn private_method_index() -> MemoryIndex {
    bindings_index().with(
        singleton("com.acme.Foo").method(void_method("hidden").annotated(logged()).with_flags(access::PRIVATE)),
    )
}

#[test]
fn private_method_binding_warns_by_default() {
    let output = process(private_method_index(), keep_all()).expect("deployment is valid");
    assert!(intercepted(&output, "com.acme.Foo").is_empty());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == CDI_INTERCEPTED_PRIVATE_METHOD_CODE));
}

#[test]
fn private_method_binding_fails_when_strict() {
    let config = CdiConfig {
        fail_on_intercepted_private_method: true,
        ..keep_all()
    };
    let err = process(private_method_index(), config).unwrap_err();
    assert!(err.has_code(CDI_INTERCEPTED_PRIVATE_METHOD_CODE));
    assert!(err.to_string().contains("because the method is private"));
}
