//! Built-in stubs for platform classes that deployments reference but never contain.

use std::sync::Arc;

use nova_core::{names, DotName};
use nova_types::{PrimitiveType, Type, TypeVariable};

use crate::access;
use crate::annotation::{AnnotationInstance, AnnotationValue};
use crate::index::{ClassIndex, MemoryIndex};
use crate::model::{ClassInfo, MethodInfo};

/// An index of the JDK core types plus the Jakarta annotation/injection API.
///
/// Only hierarchy and annotation metadata is modeled; method tables are limited to what
/// interception matching and qualifier handling look at.
#[derive(Debug, Clone)]
pub struct JdkIndex {
    inner: MemoryIndex,
}

impl Default for JdkIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl JdkIndex {
    pub fn new() -> Self {
        let mut inner = MemoryIndex::new();
        for class in jdk_classes().into_iter().chain(jakarta_classes()) {
            inner.insert(class);
        }
        Self { inner }
    }
}

impl ClassIndex for JdkIndex {
    fn class_by_name(&self, name: DotName) -> Option<Arc<ClassInfo>> {
        self.inner.class_by_name(name)
    }

    fn known_direct_subclasses(&self, name: DotName) -> Vec<DotName> {
        self.inner.known_direct_subclasses(name)
    }

    fn known_direct_implementors(&self, name: DotName) -> Vec<DotName> {
        self.inner.known_direct_implementors(name)
    }

    fn known_classes(&self) -> Vec<Arc<ClassInfo>> {
        self.inner.known_classes()
    }
}

fn t(name: &str) -> TypeVariable {
    TypeVariable::new(name, Vec::new())
}

fn tv(name: &str) -> Type {
    Type::type_var(name, Vec::new())
}

fn generic(name: impl Into<DotName>, arg: &str) -> Type {
    Type::parameterized(name, vec![tv(arg)])
}

fn jdk_classes() -> Vec<ClassInfo> {
    let object = ClassInfo {
        super_type: None,
        ..ClassInfo::class(*names::OBJECT)
    }
    .method(MethodInfo::constructor(Vec::new()))
    .method(MethodInfo::new("toString", vec![], Type::class(*names::STRING)))
    .method(MethodInfo::new("hashCode", vec![], Type::Primitive(PrimitiveType::Int)))
    .method(MethodInfo::new(
        "equals",
        vec![Type::object()],
        Type::Primitive(PrimitiveType::Boolean),
    ))
    .method(
        MethodInfo::new("getClass", vec![], Type::parameterized(*names::CLASS, vec![Type::wildcard()]))
            .with_flags(access::FINAL | access::NATIVE),
    )
    .method(MethodInfo::new("clone", vec![], Type::object()).with_flags(access::PROTECTED | access::NATIVE))
    .method(MethodInfo::new("finalize", vec![], Type::Void).with_flags(access::PROTECTED));

    let comparable = ClassInfo::interface("java.lang.Comparable").type_param(t("T"));
    let serializable = ClassInfo::interface("java.io.Serializable");
    let char_sequence = ClassInfo::interface("java.lang.CharSequence");
    let string = ClassInfo::class(*names::STRING)
        .with_flags(access::FINAL)
        .implements(Type::class("java.io.Serializable"))
        .implements(Type::parameterized(
            "java.lang.Comparable",
            vec![Type::class(*names::STRING)],
        ))
        .implements(Type::class("java.lang.CharSequence"));
    let number = ClassInfo::class(*names::NUMBER)
        .with_flags(access::ABSTRACT)
        .implements(Type::class("java.io.Serializable"));

    let mut classes = vec![object, comparable, serializable, char_sequence, string, number];

    for wrapper in [
        &names::INTEGER,
        &names::LONG,
        &names::SHORT,
        &names::BYTE,
        &names::FLOAT,
        &names::DOUBLE,
    ] {
        classes.push(
            ClassInfo::class(**wrapper)
                .with_flags(access::FINAL)
                .extends(Type::class(*names::NUMBER))
                .implements(Type::parameterized(
                    "java.lang.Comparable",
                    vec![Type::class(**wrapper)],
                )),
        );
    }
    for wrapper in [&names::BOOLEAN, &names::CHARACTER] {
        classes.push(
            ClassInfo::class(**wrapper)
                .with_flags(access::FINAL)
                .implements(Type::class("java.io.Serializable"))
                .implements(Type::parameterized(
                    "java.lang.Comparable",
                    vec![Type::class(**wrapper)],
                )),
        );
    }

    classes.push(
        ClassInfo::class(*names::ENUM)
            .with_flags(access::ABSTRACT)
            .type_param(TypeVariable::new("E", vec![generic("java.lang.Enum", "E")]))
            .implements(generic("java.lang.Comparable", "E"))
            .implements(Type::class("java.io.Serializable")),
    );
    classes.push(ClassInfo::class(*names::CLASS).with_flags(access::FINAL).type_param(t("T")));
    classes.push(ClassInfo::interface(*names::ANNOTATION));
    classes.push(ClassInfo::interface("java.lang.Runnable"));
    classes.push(ClassInfo::interface("java.lang.AutoCloseable"));

    classes.push(ClassInfo::interface("java.lang.Iterable").type_param(t("T")));
    classes.push(
        ClassInfo::interface("java.util.Collection")
            .type_param(t("E"))
            .implements(generic("java.lang.Iterable", "E")),
    );
    for (name, parent) in [
        ("java.util.List", "java.util.Collection"),
        ("java.util.Set", "java.util.Collection"),
        ("java.util.Queue", "java.util.Collection"),
    ] {
        classes.push(
            ClassInfo::interface(name)
                .type_param(t("E"))
                .implements(generic(parent, "E")),
        );
    }
    classes.push(
        ClassInfo::class("java.util.AbstractCollection")
            .with_flags(access::ABSTRACT)
            .type_param(t("E"))
            .implements(generic("java.util.Collection", "E")),
    );
    classes.push(
        ClassInfo::class("java.util.AbstractList")
            .with_flags(access::ABSTRACT)
            .type_param(t("E"))
            .extends(generic("java.util.AbstractCollection", "E"))
            .implements(generic("java.util.List", "E")),
    );
    classes.push(
        ClassInfo::class("java.util.ArrayList")
            .type_param(t("E"))
            .extends(generic("java.util.AbstractList", "E"))
            .implements(generic("java.util.List", "E"))
            .implements(Type::class("java.io.Serializable")),
    );
    classes.push(
        ClassInfo::class("java.util.HashSet")
            .type_param(t("E"))
            .extends(generic("java.util.AbstractCollection", "E"))
            .implements(generic("java.util.Set", "E"))
            .implements(Type::class("java.io.Serializable")),
    );
    classes.push(
        ClassInfo::interface("java.util.Map")
            .type_param(t("K"))
            .type_param(t("V")),
    );
    classes.push(
        ClassInfo::class("java.util.HashMap")
            .type_param(t("K"))
            .type_param(t("V"))
            .implements(Type::parameterized("java.util.Map", vec![tv("K"), tv("V")]))
            .implements(Type::class("java.io.Serializable")),
    );
    classes.push(
        ClassInfo::class("java.util.Optional")
            .with_flags(access::FINAL)
            .type_param(t("T")),
    );
    classes.push(ClassInfo::interface("java.util.function.Supplier").type_param(t("T")));
    classes
}

fn annotation_with_meta(name: DotName, meta: &[DotName]) -> ClassInfo {
    meta.iter().fold(ClassInfo::annotation(name), |class, m| {
        class.annotated(AnnotationInstance::new(*m))
    })
}

fn jakarta_classes() -> Vec<ClassInfo> {
    let string = Type::class(*names::STRING);
    let mut classes = vec![
        annotation_with_meta(*names::INHERITED, &[]),
        annotation_with_meta(*names::QUALIFIER, &[]),
        annotation_with_meta(*names::SCOPE, &[]),
        annotation_with_meta(*names::NORMAL_SCOPE, &[]),
        annotation_with_meta(*names::INTERCEPTOR_BINDING, &[]),
        annotation_with_meta(*names::NONBINDING, &[]),
        annotation_with_meta(*names::INJECT, &[]),
        annotation_with_meta(*names::PRODUCES, &[]),
        annotation_with_meta(*names::ALTERNATIVE, &[]),
        annotation_with_meta(*names::INTERCEPTOR, &[]),
        annotation_with_meta(*names::DECORATOR, &[]),
        annotation_with_meta(*names::DELEGATE, &[]),
        annotation_with_meta(*names::OBSERVES, &[]),
        annotation_with_meta(*names::OBSERVES_ASYNC, &[]),
        annotation_with_meta(*names::NO_CLASS_INTERCEPTORS, &[]),
        annotation_with_meta(*names::DEFAULT, &[*names::QUALIFIER]),
        annotation_with_meta(*names::ANY, &[*names::QUALIFIER]),
        annotation_with_meta(*names::NAMED, &[*names::QUALIFIER]).method(MethodInfo::member(
            "value",
            string.clone(),
            Some(AnnotationValue::from("")),
        )),
        annotation_with_meta(*names::PRIORITY, &[])
            .method(MethodInfo::member("value", Type::Primitive(PrimitiveType::Int), None)),
        annotation_with_meta(*names::TYPED, &[]).method(MethodInfo::member(
            "value",
            Type::array(Type::parameterized(*names::CLASS, vec![Type::wildcard()])),
            Some(AnnotationValue::Array(Vec::new())),
        )),
        annotation_with_meta(*names::SINGLETON, &[*names::SCOPE]),
        annotation_with_meta(*names::DEPENDENT, &[*names::SCOPE]),
        annotation_with_meta(*names::APPLICATION_SCOPED, &[*names::NORMAL_SCOPE, *names::INHERITED]),
        annotation_with_meta(*names::REQUEST_SCOPED, &[*names::NORMAL_SCOPE, *names::INHERITED]),
        annotation_with_meta(*names::SESSION_SCOPED, &[*names::NORMAL_SCOPE, *names::INHERITED]),
    ];

    classes.push(ClassInfo::interface(*names::PROVIDER).type_param(t("T")));
    classes.push(
        ClassInfo::interface(*names::INSTANCE)
            .type_param(t("T"))
            .implements(generic(*names::PROVIDER, "T"))
            .implements(generic("java.lang.Iterable", "T")),
    );
    classes.push(
        ClassInfo::interface(*names::INJECTABLE_INSTANCE)
            .type_param(t("T"))
            .implements(generic(*names::INSTANCE, "T")),
    );
    classes.push(ClassInfo::interface(*names::EVENT).type_param(t("T")));
    classes.push(ClassInfo::interface(*names::INJECTION_POINT));
    classes.push(ClassInfo::interface(*names::BEAN_MANAGER));
    classes
}
