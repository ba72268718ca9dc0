//! Qualifier metadata and binding-member equality.

use std::collections::{BTreeMap, HashMap, HashSet};

use smol_str::SmolStr;

use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, AnnotationValue, ClassIndex, ClassInfo};
use nova_types::Type;

use crate::error::DeploymentProblem;

/// Member metadata of an annotation type used for binding comparisons (qualifiers and
/// interceptor bindings).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationMeta {
    pub name: DotName,
    /// Members that take part in equality, with their default values.
    pub binding_members: BTreeMap<SmolStr, Option<AnnotationValue>>,
    pub nonbinding_members: HashSet<SmolStr>,
}

impl AnnotationMeta {
    /// An annotation type without members (`@Default`).
    pub fn marker(name: DotName) -> Self {
        Self {
            name,
            binding_members: BTreeMap::new(),
            nonbinding_members: HashSet::new(),
        }
    }

    pub fn from_class(class: &ClassInfo) -> Self {
        let mut meta = AnnotationMeta::marker(class.name);
        for member in &class.methods {
            if member.is_static() || member.is_constructor() || member.is_static_initializer() {
                continue;
            }
            if member.has_annotation(*names::NONBINDING) {
                meta.nonbinding_members.insert(member.name.clone());
            } else {
                meta.binding_members
                    .insert(member.name.clone(), member.default_value.clone());
            }
        }
        meta
    }

    fn value_with_default<'a>(
        &'a self,
        instance: &'a AnnotationInstance,
        member: &str,
    ) -> Option<&'a AnnotationValue> {
        instance
            .value(member)
            .or_else(|| self.binding_members.get(member).and_then(Option::as_ref))
    }

    /// Same annotation type and equal values for every binding member.
    pub fn instances_equal(&self, a: &AnnotationInstance, b: &AnnotationInstance) -> bool {
        if a.name != b.name || a.name != self.name {
            return false;
        }
        self.binding_members
            .keys()
            .all(|member| self.value_with_default(a, member) == self.value_with_default(b, member))
    }

    /// Rejects member types an annotation literal cannot represent.
    pub fn validate_member_types(&self, class: &ClassInfo) -> Vec<DeploymentProblem> {
        class
            .methods
            .iter()
            .filter(|m| self.binding_members.contains_key(&m.name))
            .filter(|m| !is_valid_member_type(&m.return_type))
            .map(|m| DeploymentProblem::InvalidMemberType {
                annotation: self.name,
                member: m.name.to_string(),
                member_type: m.return_type.clone(),
            })
            .collect()
    }
}

fn is_valid_member_type(ty: &Type) -> bool {
    match ty {
        Type::Primitive(_) | Type::Class(_) => true,
        // `Class<?>`, `Class<? extends Foo>`
        Type::Parameterized(p) => p.name == *names::CLASS,
        Type::Array(component) => {
            !matches!(**component, Type::Array(_)) && is_valid_member_type(component)
        }
        Type::Void | Type::TypeVar(_) | Type::Wildcard(_) => false,
    }
}

/// Compare `a` and `b` with member metadata when available; annotations whose class is not
/// known compare on explicitly written members.
pub fn annotations_equal(
    meta: Option<&AnnotationMeta>,
    a: &AnnotationInstance,
    b: &AnnotationInstance,
) -> bool {
    match meta {
        Some(meta) => meta.instances_equal(a, b),
        None => a == b,
    }
}

/// All annotation types meta-annotated `@Qualifier`, plus the built-in qualifiers.
#[derive(Clone, Debug)]
pub struct QualifierRegistry {
    qualifiers: HashMap<DotName, AnnotationMeta>,
}

impl QualifierRegistry {
    /// Scans the index for qualifier annotations. Member type problems are returned
    /// alongside the registry.
    pub fn new(index: &dyn ClassIndex) -> (Self, Vec<DeploymentProblem>) {
        let mut qualifiers = HashMap::new();
        let mut problems = Vec::new();

        for builtin in [*names::DEFAULT, *names::ANY, *names::NAMED] {
            let meta = match index.class_by_name(builtin) {
                Some(class) => AnnotationMeta::from_class(&class),
                None => builtin_meta(builtin),
            };
            qualifiers.insert(builtin, meta);
        }

        for class in index.known_classes() {
            if !class.is_annotation() || !class.has_annotation(*names::QUALIFIER) {
                continue;
            }
            let meta = AnnotationMeta::from_class(&class);
            problems.extend(meta.validate_member_types(&class));
            qualifiers.insert(class.name, meta);
        }

        tracing::debug!(target: "nova.cdi", count = qualifiers.len(), "registered qualifiers");
        (Self { qualifiers }, problems)
    }

    pub fn is_qualifier(&self, name: DotName) -> bool {
        self.qualifiers.contains_key(&name)
    }

    pub fn meta(&self, name: DotName) -> Option<&AnnotationMeta> {
        self.qualifiers.get(&name)
    }

    /// Qualifier annotations among `annotations`.
    pub fn extract(&self, annotations: &[AnnotationInstance]) -> Vec<AnnotationInstance> {
        annotations
            .iter()
            .filter(|a| self.is_qualifier(a.name))
            .cloned()
            .collect()
    }

    /// Returns `true` when `candidates` contains an instance equal to `required`
    /// (binding members only).
    pub fn has_qualifier(
        &self,
        candidates: &[AnnotationInstance],
        required: &AnnotationInstance,
    ) -> bool {
        let meta = self.meta(required.name);
        candidates
            .iter()
            .any(|candidate| annotations_equal(meta, required, candidate))
    }

    pub fn has_qualifiers(
        &self,
        candidates: &[AnnotationInstance],
        required: &[AnnotationInstance],
    ) -> bool {
        required.iter().all(|r| self.has_qualifier(candidates, r))
    }
}

// Used when the index carries no Jakarta API stubs.
fn builtin_meta(name: DotName) -> AnnotationMeta {
    let mut meta = AnnotationMeta::marker(name);
    if name == *names::NAMED {
        meta.binding_members
            .insert("value".into(), Some(AnnotationValue::from("")));
    }
    meta
}

pub fn default_qualifier() -> AnnotationInstance {
    AnnotationInstance::new(*names::DEFAULT)
}

pub fn any_qualifier() -> AnnotationInstance {
    AnnotationInstance::new(*names::ANY)
}

pub fn named(value: &str) -> AnnotationInstance {
    AnnotationInstance::new(*names::NAMED).with("value", value)
}

/// Render a qualifier set as `[@Default, @Named("x")]`, used in problem messages.
pub fn format_qualifiers(qualifiers: &[AnnotationInstance]) -> String {
    let rendered: Vec<String> = qualifiers.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
