//! Interceptor binding metadata and interceptor resolution.

use std::collections::{HashMap, HashSet};

use nova_core::names;
use nova_core::DotName;
use nova_index::{AnnotationInstance, ClassIndex, ClassInfo};

use crate::bean::{BeanId, BeanInfo};
use crate::error::DeploymentProblem;
use crate::qualifiers::{annotations_equal, AnnotationMeta};

/// Annotation types meta-annotated `@InterceptorBinding`.
#[derive(Clone, Debug, Default)]
pub struct InterceptorBindings {
    bindings: HashMap<DotName, AnnotationMeta>,
    /// Bindings declared on a binding annotation class.
    inherited: HashMap<DotName, Vec<AnnotationInstance>>,
    /// Binding types declared `@Inherited`.
    inheritable: HashSet<DotName>,
}

impl InterceptorBindings {
    pub fn new(index: &dyn ClassIndex) -> (Self, Vec<DeploymentProblem>) {
        let mut bindings = HashMap::new();
        let mut declared = HashMap::new();
        let mut inheritable = HashSet::new();
        let mut problems = Vec::new();
        for class in index.known_classes() {
            if !class.is_annotation() || !class.has_annotation(*names::INTERCEPTOR_BINDING) {
                continue;
            }
            let meta = AnnotationMeta::from_class(&class);
            problems.extend(meta.validate_member_types(&class));
            if class.has_annotation(*names::INHERITED) {
                inheritable.insert(class.name);
            }
            bindings.insert(class.name, meta);
            declared.insert(class.name, class.annotations.clone());
        }
        let inherited = declared
            .into_iter()
            .map(|(name, annotations)| {
                let nested = annotations
                    .into_iter()
                    .filter(|a| bindings.contains_key(&a.name))
                    .collect();
                (name, nested)
            })
            .collect();
        tracing::debug!(target: "nova.cdi", count = bindings.len(), "registered interceptor bindings");
        (
            Self {
                bindings,
                inherited,
                inheritable,
            },
            problems,
        )
    }

    pub fn is_binding(&self, name: DotName) -> bool {
        self.bindings.contains_key(&name)
    }

    pub fn meta(&self, name: DotName) -> Option<&AnnotationMeta> {
        self.bindings.get(&name)
    }

    /// Binding annotations among `annotations`, with bindings they carry transitively.
    /// The first occurrence of an annotation type wins.
    pub fn extract(&self, annotations: &[AnnotationInstance]) -> Vec<AnnotationInstance> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for annotation in annotations {
            self.expand(annotation, &mut out, &mut seen);
        }
        out
    }

    fn expand(
        &self,
        annotation: &AnnotationInstance,
        out: &mut Vec<AnnotationInstance>,
        seen: &mut HashSet<DotName>,
    ) {
        if !self.is_binding(annotation.name) || !seen.insert(annotation.name) {
            return;
        }
        out.push(annotation.clone());
        if let Some(nested) = self.inherited.get(&annotation.name) {
            for binding in nested {
                self.expand(binding, out, seen);
            }
        }
    }

    /// Class-level bindings: the class and its superclasses (excluding `Object`), nearest
    /// declaration first. Superclasses contribute only `@Inherited` binding types.
    pub fn class_level(&self, index: &dyn ClassIndex, class: &ClassInfo) -> Vec<AnnotationInstance> {
        let mut annotations: Vec<AnnotationInstance> = class.annotations.clone();
        let mut next = class.super_name();
        let mut visited = HashSet::from([class.name]);
        while let Some(name) = next {
            if name == *names::OBJECT || !visited.insert(name) {
                break;
            }
            let Some(super_class) = index.class_by_name(name) else {
                break;
            };
            annotations.extend(
                super_class
                    .annotations
                    .iter()
                    .filter(|a| self.inheritable.contains(&a.name))
                    .cloned(),
            );
            next = super_class.super_name();
        }
        self.extract(&annotations)
    }

    /// Returns `true` when `set` holds an instance equal to `binding` on binding members.
    pub fn contains(&self, set: &[AnnotationInstance], binding: &AnnotationInstance) -> bool {
        let meta = self.meta(binding.name);
        set.iter().any(|candidate| annotations_equal(meta, binding, candidate))
    }
}

/// Selects interceptors for a set of bindings.
pub struct InterceptorResolver<'a> {
    bindings: &'a InterceptorBindings,
    interceptors: Vec<&'a BeanInfo>,
}

impl<'a> InterceptorResolver<'a> {
    pub fn new(bindings: &'a InterceptorBindings, interceptors: impl IntoIterator<Item = &'a BeanInfo>) -> Self {
        let mut interceptors: Vec<&BeanInfo> = interceptors
            .into_iter()
            .filter(|bean| bean.is_interceptor())
            .collect();
        interceptors.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.bean_class.cmp(&b.bean_class))
        });
        Self {
            bindings,
            interceptors,
        }
    }

    /// Interceptors all of whose bindings appear in `bindings`, by priority then class name.
    pub fn resolve(&self, bindings: &[AnnotationInstance]) -> Vec<BeanId> {
        if bindings.is_empty() {
            return Vec::new();
        }
        self.interceptors
            .iter()
            .filter(|interceptor| {
                !interceptor.interceptor_bindings.is_empty()
                    && interceptor
                        .interceptor_bindings
                        .iter()
                        .all(|required| self.bindings.contains(bindings, required))
            })
            .map(|interceptor| interceptor.id)
            .collect()
    }

    /// Sort ids the same way resolution results are sorted.
    pub fn sort(&self, ids: &mut Vec<BeanId>) {
        ids.sort_by_key(|id| {
            self.interceptors
                .iter()
                .position(|interceptor| interceptor.id == *id)
                .unwrap_or(usize::MAX)
        });
        ids.dedup();
    }
}
