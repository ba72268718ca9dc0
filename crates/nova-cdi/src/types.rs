//! Bean type closures.

use std::collections::HashSet;

use indexmap::IndexSet;

use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, ClassIndex, ClassInfo};
use nova_types::{substitute, type_arguments_map, Type, TypeArguments};

// Guards against hierarchy cycles in a hand-built index.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Bean types of a class bean: the class as a (possibly generic) type, then its interfaces
/// and superclasses with type arguments substituted, ending with `Object`.
pub fn class_bean_types(index: &dyn ClassIndex, class: &ClassInfo) -> IndexSet<Type> {
    let mut types = IndexSet::new();
    collect(index, class, class.as_type(), &TypeArguments::new(), &mut types, 0);
    types.insert(Type::object());
    types
}

/// Bean types of a producer whose declared type is `produced`.
pub fn producer_bean_types(index: &dyn ClassIndex, produced: &Type) -> IndexSet<Type> {
    let mut types = IndexSet::new();
    match produced {
        Type::Class(_) | Type::Parameterized(_) => walk(index, produced, &TypeArguments::new(), &mut types, 0),
        other => {
            types.insert(other.boxed());
        }
    }
    types.insert(Type::object());
    types
}

fn walk(
    index: &dyn ClassIndex,
    declared: &Type,
    outer: &TypeArguments,
    types: &mut IndexSet<Type>,
    depth: usize,
) {
    let Some(class) = index.class_by_name(declared.name()) else {
        types.insert(substitute(declared, outer));
        return;
    };
    // A raw reference to a generic type contributes raw types only.
    let (this, args) = match declared {
        Type::Parameterized(_) => (
            substitute(declared, outer),
            type_arguments_map(&class.type_params, declared, outer),
        ),
        _ => (Type::Class(class.name), TypeArguments::new()),
    };
    collect(index, &class, this, &args, types, depth);
}

fn collect(
    index: &dyn ClassIndex,
    class: &ClassInfo,
    this: Type,
    args: &TypeArguments,
    types: &mut IndexSet<Type>,
    depth: usize,
) {
    if depth > MAX_HIERARCHY_DEPTH || !types.insert(this) {
        return;
    }
    for interface in &class.interfaces {
        walk(index, interface, args, types, depth + 1);
    }
    if let Some(super_type) = &class.super_type {
        walk(index, super_type, args, types, depth + 1);
    }
}

/// Keep only the types listed by `@Typed`, plus `Object`.
pub fn restrict_to_typed(types: IndexSet<Type>, typed: &AnnotationInstance) -> IndexSet<Type> {
    let allowed: HashSet<DotName> = typed
        .value("value")
        .map(|value| value.as_slice().iter().filter_map(|v| v.as_class()).map(Type::name).collect())
        .unwrap_or_default();
    types
        .into_iter()
        .filter(|ty| ty.is_object() || allowed.contains(&ty.name()))
        .collect()
}

/// Types named in `@Typed` that are not bean types; each one is a definition error.
pub fn typed_violations(types: &IndexSet<Type>, typed: &AnnotationInstance) -> Vec<DotName> {
    let present: HashSet<DotName> = types.iter().map(Type::name).collect();
    typed
        .value("value")
        .map(|value| value.as_slice().iter().filter_map(|v| v.as_class()).map(Type::name).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter(|name| *name != *names::OBJECT && !present.contains(name))
        .collect()
}
