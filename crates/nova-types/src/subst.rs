use std::collections::HashMap;

use smol_str::SmolStr;

use crate::{ParameterizedType, Type, TypeVariable, WildcardBound};

/// Type variable identifier → actual type argument.
pub type TypeArguments = HashMap<SmolStr, Type>;

/// Replace every type variable in `ty` that has an entry in `args`.
///
/// Variables without an entry are kept as-is (their bounds are substituted too), so
/// partially resolved hierarchies still produce well-formed types.
pub fn substitute(ty: &Type, args: &TypeArguments) -> Type {
    if args.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(tv) => match args.get(&tv.identifier) {
            Some(actual) => actual.clone(),
            None => Type::TypeVar(TypeVariable {
                identifier: tv.identifier.clone(),
                bounds: tv
                    .bounds
                    .iter()
                    .map(|bound| substitute_bound(bound, &tv.identifier, args))
                    .collect(),
            }),
        },
        Type::Parameterized(p) => Type::Parameterized(ParameterizedType {
            name: p.name,
            args: p.args.iter().map(|arg| substitute(arg, args)).collect(),
        }),
        Type::Array(component) => Type::array(substitute(component, args)),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            Type::wildcard_extends(substitute(upper, args))
        }
        Type::Wildcard(WildcardBound::Super(lower)) => Type::wildcard_super(substitute(lower, args)),
        other => other.clone(),
    }
}

// Recursive bounds (`T extends Comparable<T>`) must not expand the variable into itself.
fn substitute_bound(bound: &Type, owner: &SmolStr, args: &TypeArguments) -> Type {
    match bound {
        Type::TypeVar(tv) if tv.identifier == *owner => bound.clone(),
        Type::Parameterized(p) => Type::Parameterized(ParameterizedType {
            name: p.name,
            args: p
                .args
                .iter()
                .map(|arg| match arg {
                    Type::TypeVar(tv) if tv.identifier == *owner => arg.clone(),
                    other => substitute(other, args),
                })
                .collect(),
        }),
        other => substitute(other, args),
    }
}

/// Build the variable → argument map for a generic declaration applied to `actual`.
///
/// `actual` arguments are resolved against `outer` first, which lets callers walk a
/// hierarchy (`class Foo<T> extends Bar<List<T>>`) one level at a time. A raw use of a
/// generic type yields an empty map.
pub fn type_arguments_map(
    type_params: &[TypeVariable],
    actual: &Type,
    outer: &TypeArguments,
) -> TypeArguments {
    let actual_args = actual.arguments();
    if actual_args.len() != type_params.len() {
        return TypeArguments::new();
    }
    type_params
        .iter()
        .zip(actual_args)
        .map(|(param, arg)| (param.identifier.clone(), substitute(arg, outer)))
        .collect()
}
