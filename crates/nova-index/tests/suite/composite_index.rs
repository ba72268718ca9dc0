use std::sync::Arc;

use nova_core::{names, DotName};
use nova_index::{ClassIndex, ClassInfo, CompositeIndex, JdkIndex, MemoryIndex};
use nova_types::Type;
use pretty_assertions::assert_eq;

fn app_index() -> MemoryIndex {
    MemoryIndex::new()
        .with(ClassInfo::class("com.acme.Counter").extends(Type::class("java.lang.Number")))
        .with(
            ClassInfo::class("com.acme.Names")
                .extends(Type::parameterized(
                    "java.util.ArrayList",
                    vec![Type::class("java.lang.String")],
                )),
        )
}

#[test]
fn application_classes_shadow_nothing_and_jdk_loads_on_demand() {
    let index = CompositeIndex::new(Arc::new(app_index()), Arc::new(JdkIndex::new()));
    assert_eq!(index.loaded_len(), 0);

    let number = index.class_by_name(*names::NUMBER).expect("Number is a JDK class");
    assert_eq!(number.name, *names::NUMBER);
    assert_eq!(index.loaded_len(), 1);

    // A second lookup is served from the memo.
    index.class_by_name(*names::NUMBER);
    assert_eq!(index.loaded_len(), 1);

    assert!(index.class_by_name("com.acme.Missing".into()).is_none());
    assert_eq!(index.loaded_len(), 2);
}

#[test]
fn known_classes_are_application_classes_only() {
    let index = CompositeIndex::new(Arc::new(app_index()), Arc::new(JdkIndex::new()));
    let names: Vec<&str> = index
        .known_classes()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["com.acme.Counter", "com.acme.Names"]);
}

#[test]
fn hierarchy_spans_both_indexes() {
    let index = CompositeIndex::new(Arc::new(app_index()), Arc::new(JdkIndex::new()));

    let numbers = index.all_known_subclasses(*names::NUMBER);
    assert!(numbers.contains(&DotName::new("com.acme.Counter")));
    assert!(numbers.contains(&*names::INTEGER));

    let lists = index.all_known_implementors("java.util.List".into());
    assert!(lists.contains(&DotName::new("java.util.ArrayList")));
    assert!(lists.contains(&DotName::new("com.acme.Names")));
}
