//! Type-safe bean resolution.
//!
//! [`BeanResolver::resolve`] answers "which beans have a bean type assignable to this
//! required type and carry these qualifiers". Answers are memoized per
//! `(type, qualifiers)` and returned as shared slices, so repeated queries return the very
//! same allocation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, ClassIndex};
use nova_types::{Type, TypeVariable, WildcardBound};

use crate::bean::{BeanId, BeanInfo};
use crate::qualifiers::{default_qualifier, QualifierRegistry};

// Type variables bounded by type variables form chains; Java forbids cycles but the index
// is untrusted input.
const MAX_BOUND_DEPTH: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ResolutionKey {
    ty: Type,
    qualifiers: Vec<AnnotationInstance>,
}

pub struct BeanResolver<'d> {
    index: &'d dyn ClassIndex,
    qualifiers: &'d QualifierRegistry,
    beans: &'d [BeanInfo],
    candidates: Vec<BeanId>,
    beans_by_type: HashMap<DotName, Vec<BeanId>>,
    resolved: RwLock<HashMap<ResolutionKey, Arc<[BeanId]>>>,
    assignables: RwLock<HashMap<DotName, Arc<HashSet<DotName>>>>,
}

impl<'d> BeanResolver<'d> {
    /// `candidates` are the beans eligible for injection (interceptors and removed beans
    /// excluded); `beans` is the arena they index into.
    pub fn new(
        index: &'d dyn ClassIndex,
        qualifiers: &'d QualifierRegistry,
        beans: &'d [BeanInfo],
        candidates: impl IntoIterator<Item = BeanId>,
    ) -> Self {
        let candidates: Vec<BeanId> = candidates.into_iter().collect();
        let mut beans_by_type: HashMap<DotName, Vec<BeanId>> = HashMap::new();
        for id in &candidates {
            for ty in &beans[id.index()].types {
                if ty.is_object() {
                    continue;
                }
                let bucket = beans_by_type.entry(ty.boxed().name()).or_default();
                if !bucket.contains(id) {
                    bucket.push(*id);
                }
            }
        }
        Self {
            index,
            qualifiers,
            beans,
            candidates,
            beans_by_type,
            resolved: RwLock::new(HashMap::new()),
            assignables: RwLock::new(HashMap::new()),
        }
    }

    pub fn bean(&self, id: BeanId) -> &'d BeanInfo {
        &self.beans[id.index()]
    }

    pub fn candidates(&self) -> &[BeanId] {
        &self.candidates
    }

    /// All beans matching `required` and `qualifiers`. An empty qualifier set means
    /// `@Default`.
    pub fn resolve(&self, required: &Type, qualifiers: &[AnnotationInstance]) -> Arc<[BeanId]> {
        let qualifiers = if qualifiers.is_empty() {
            vec![default_qualifier()]
        } else {
            qualifiers.to_vec()
        };
        let key = ResolutionKey {
            ty: required.clone(),
            qualifiers,
        };
        if let Some(hit) = self.resolved.read().get(&key) {
            return Arc::clone(hit);
        }

        let found: Arc<[BeanId]> = self
            .potential_beans(&key.ty)
            .iter()
            .copied()
            .filter(|id| self.matches_bean(self.bean(*id), &key.ty, &key.qualifiers))
            .collect();
        tracing::trace!(
            target: "nova.cdi.resolver",
            required = %key.ty,
            found = found.len(),
            "resolved"
        );

        // A concurrent caller may have won the race; keep the first answer.
        let mut resolved = self.resolved.write();
        Arc::clone(resolved.entry(key).or_insert(found))
    }

    fn potential_beans(&self, required: &Type) -> &[BeanId] {
        match required {
            Type::Class(_) | Type::Parameterized(_) if !required.is_object() => self
                .beans_by_type
                .get(&required.name())
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            _ => &self.candidates,
        }
    }

    pub fn matches_bean(
        &self,
        bean: &BeanInfo,
        required: &Type,
        qualifiers: &[AnnotationInstance],
    ) -> bool {
        self.matches_type(bean, required) && self.qualifiers.has_qualifiers(&bean.qualifiers, qualifiers)
    }

    pub fn matches_type(&self, bean: &BeanInfo, required: &Type) -> bool {
        bean.types.iter().any(|bean_type| self.matches(required, bean_type))
    }

    /// CDI assignability of a bean type to a required type. Primitives are boxed first.
    pub fn matches(&self, required: &Type, bean_type: &Type) -> bool {
        self.matches_no_boxing(&required.boxed(), &bean_type.boxed())
    }

    fn matches_no_boxing(&self, required: &Type, bean_type: &Type) -> bool {
        if required == bean_type {
            return true;
        }
        match (required, bean_type) {
            (Type::Array(required), Type::Array(bean)) => self.matches(required, bean),
            (Type::Class(required), Type::Class(bean)) => required == bean,
            // A parameterized bean type is usable as its raw type only when unconstrained.
            (Type::Class(required), Type::Parameterized(bean)) => {
                *required == bean.name && unbounded_or_objects(&bean.args)
            }
            (Type::Parameterized(required), Type::Class(bean)) => {
                required.name == *bean && unbounded_or_objects(&required.args)
            }
            (Type::Parameterized(required), Type::Parameterized(bean)) => {
                if required.name != bean.name {
                    return false;
                }
                if required.args.len() != bean.args.len() {
                    tracing::debug!(
                        target: "nova.cdi.resolver",
                        required = %Type::Parameterized(required.clone()),
                        bean = %Type::Parameterized(bean.clone()),
                        "type argument count mismatch"
                    );
                    return false;
                }
                required
                    .args
                    .iter()
                    .zip(&bean.args)
                    .all(|(r, b)| self.parameters_match(r, b))
            }
            (Type::Wildcard(_), _) => self.parameters_match(required, bean_type),
            _ => false,
        }
    }

    fn parameters_match(&self, required: &Type, bean: &Type) -> bool {
        match (required, bean) {
            (r, b) if r.is_actual_type() && b.is_actual_type() => self.matches(r, b),
            (Type::Wildcard(wildcard), b) if b.is_actual_type() => {
                self.lower_bound_of_wildcard_matches(std::slice::from_ref(b), wildcard)
                    && self.bounds_match(&[wildcard.extends_bound()], std::slice::from_ref(b))
            }
            (Type::Wildcard(wildcard), Type::TypeVar(tv)) => {
                let bean_bounds = uppermost_type_variable_bounds(tv);
                if !self.lower_bound_of_wildcard_matches(&bean_bounds, wildcard) {
                    return false;
                }
                let required_upper = [wildcard.extends_bound()];
                self.bounds_match(&required_upper, &bean_bounds)
                    || self.bounds_match(&bean_bounds, &required_upper)
            }
            (r, Type::TypeVar(tv)) if r.is_actual_type() => uppermost_type_variable_bounds(tv)
                .iter()
                .all(|bound| self.is_assignable_from(bound, r)),
            (Type::TypeVar(required), Type::TypeVar(bean)) => self.bounds_match(
                &uppermost_type_variable_bounds(bean),
                &uppermost_type_variable_bounds(required),
            ),
            _ => false,
        }
    }

    fn lower_bound_of_wildcard_matches(&self, bean_bounds: &[Type], wildcard: &WildcardBound) -> bool {
        match wildcard.super_bound() {
            Some(lower) => self.bounds_match(bean_bounds, std::slice::from_ref(lower)),
            None => true,
        }
    }

    /// Every bound is assignable from every stricter bound.
    fn bounds_match(&self, bounds: &[Type], stricter: &[Type]) -> bool {
        let bounds = uppermost_bounds(bounds);
        let stricter = uppermost_bounds(stricter);
        bounds
            .iter()
            .all(|bound| stricter.iter().all(|s| self.is_assignable_from(bound, s)))
    }

    /// Raw assignability: `Object` accepts everything, equal names match, otherwise `t2`
    /// must be a known subtype of `t1`.
    pub fn is_assignable_from(&self, t1: &Type, t2: &Type) -> bool {
        let n1 = t1.name();
        let n2 = t2.name();
        n1 == *names::OBJECT || n1 == n2 || self.assignables(n1).contains(&n2)
    }

    fn assignables(&self, name: DotName) -> Arc<HashSet<DotName>> {
        if let Some(hit) = self.assignables.read().get(&name) {
            return Arc::clone(hit);
        }
        let closure: HashSet<DotName> = self
            .index
            .all_known_subclasses(name)
            .into_iter()
            .chain(self.index.all_known_implementors(name))
            .collect();
        let mut assignables = self.assignables.write();
        Arc::clone(assignables.entry(name).or_insert_with(|| Arc::new(closure)))
    }

    pub fn is_alternative(&self, bean: &BeanInfo) -> bool {
        bean.alternative
            || bean
                .declaring_bean
                .is_some_and(|declaring| self.bean(declaring).alternative)
    }

    /// Alternative priority; producers fall back to their declaring bean.
    pub fn priority(&self, bean: &BeanInfo) -> Option<i32> {
        bean.priority.or_else(|| {
            bean.declaring_bean
                .and_then(|declaring| self.bean(declaring).priority)
        })
    }

    /// Pick one bean out of several matches.
    ///
    /// Only alternatives survive; among several alternatives only those with the highest
    /// priority survive. `Err` carries the beans still tied.
    pub fn resolve_ambiguity(&self, matching: &[BeanId]) -> Result<BeanId, Vec<BeanId>> {
        if let [single] = matching {
            return Ok(*single);
        }
        let alternatives: Vec<BeanId> = matching
            .iter()
            .copied()
            .filter(|id| self.is_alternative(self.bean(*id)))
            .collect();
        match alternatives.as_slice() {
            [] => Err(matching.to_vec()),
            [single] => Ok(*single),
            _ => {
                let highest = alternatives
                    .iter()
                    .map(|id| self.priority(self.bean(*id)))
                    .max()
                    .flatten();
                let top: Vec<BeanId> = alternatives
                    .into_iter()
                    .filter(|id| self.priority(self.bean(*id)) == highest)
                    .collect();
                match top.as_slice() {
                    [single] => Ok(*single),
                    _ => Err(top),
                }
            }
        }
    }
}

fn is_object_or_unbounded(ty: &Type) -> bool {
    match ty {
        Type::Class(_) => ty.is_object(),
        Type::TypeVar(tv) => tv.is_unbounded(),
        Type::Wildcard(bound) => bound.is_unbounded(),
        _ => false,
    }
}

fn unbounded_or_objects(args: &[Type]) -> bool {
    args.iter().all(is_object_or_unbounded)
}

/// Bounds of `tv`, following bounds that are themselves type variables.
pub(crate) fn uppermost_type_variable_bounds(tv: &TypeVariable) -> Vec<Type> {
    let mut bounds = tv.bounds_or_object();
    for _ in 0..MAX_BOUND_DEPTH {
        match bounds.first() {
            Some(Type::TypeVar(inner)) => bounds = inner.bounds_or_object(),
            _ => break,
        }
    }
    bounds
}

fn uppermost_bounds(bounds: &[Type]) -> Vec<Type> {
    match bounds.first() {
        // A variable bounded by a type variable declares no other bound.
        Some(Type::TypeVar(tv)) => uppermost_type_variable_bounds(tv),
        _ => bounds.to_vec(),
    }
}
