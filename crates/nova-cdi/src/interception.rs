//! Which methods of a bean class can be intercepted, and with which bindings.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, ClassIndex, ClassInfo, MethodInfo};
use nova_types::Type;

use crate::bean::BeanId;
use crate::error::{DeploymentProblem, Diagnostic, CDI_FINAL_METHOD_CODE, CDI_INTERCEPTED_PRIVATE_METHOD_CODE};
use crate::interceptors::InterceptorBindings;
use crate::qualifiers::format_qualifiers;

/// Name, erased parameter types and erased return type.
///
/// Two methods with the same key are treated as one even when the language would not
/// consider one an override of the other.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: SmolStr,
    pub params: Vec<Type>,
    pub return_type: Type,
}

impl MethodKey {
    pub fn of(method: &MethodInfo) -> Self {
        Self {
            name: method.name.clone(),
            params: method.params.iter().map(Type::erasure).collect(),
            return_type: method.return_type.erasure(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// A class-file change the code generator must apply before the class can be proxied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transformation {
    FinalMethodRemoval { class: DotName, method: MethodKey },
    FinalClassRemoval { class: DotName },
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::FinalMethodRemoval { class, method } => {
                write!(f, "remove final from {class}#{method}")
            }
            Transformation::FinalClassRemoval { class } => write!(f, "remove final from {class}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterceptedMethod {
    pub method: MethodInfo,
    /// Effective bindings: method-level first, then class-level ones not shadowed.
    pub bindings: Vec<AnnotationInstance>,
    /// Filled in once interceptors are resolved.
    pub interceptors: Vec<BeanId>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InterceptionOptions {
    /// Drop `final` from methods instead of skipping them.
    pub transform_final_methods: bool,
    pub fail_on_intercepted_private_method: bool,
}

#[derive(Debug, Default)]
pub struct MethodCandidates {
    pub methods: IndexMap<MethodKey, InterceptedMethod>,
    pub transformations: Vec<Transformation>,
    pub diagnostics: Vec<Diagnostic>,
    pub problems: Vec<DeploymentProblem>,
}

struct Matcher<'a> {
    index: &'a dyn ClassIndex,
    bindings: &'a InterceptorBindings,
    options: InterceptionOptions,
    class_level: &'a [AnnotationInstance],
}

/// Collect interception candidates of `class`.
///
/// The class and its superclasses are visited first, then every interface of that chain.
/// Interface methods see the class-level bindings too. Only the first method with a given
/// [`MethodKey`] is considered, whether or not it ends up intercepted.
pub fn intercepted_method_candidates(
    index: &dyn ClassIndex,
    bindings: &InterceptorBindings,
    class: &ClassInfo,
    class_level: &[AnnotationInstance],
    options: InterceptionOptions,
) -> MethodCandidates {
    let matcher = Matcher {
        index,
        bindings,
        options,
        class_level,
    };
    let mut out = MethodCandidates::default();
    let mut visited = HashSet::new();
    let mut suppressed = HashSet::new();

    let mut chain = vec![Arc::new(class.clone())];
    let mut seen = HashSet::from([class.name]);
    let mut next = class.super_name();
    while let Some(name) = next {
        if !seen.insert(name) {
            break;
        }
        let Some(info) = index.class_by_name(name) else {
            break;
        };
        next = info.super_name();
        chain.push(info);
    }
    for info in &chain {
        matcher.visit(info, &mut visited, &mut suppressed, &mut out);
    }

    let mut visited_interfaces = HashSet::new();
    for info in &chain {
        for interface in info.interface_names() {
            matcher.visit_interface(
                interface,
                &mut visited_interfaces,
                &mut visited,
                &mut suppressed,
                &mut out,
            );
        }
    }
    out
}

impl Matcher<'_> {
    fn visit_interface(
        &self,
        name: DotName,
        visited_interfaces: &mut HashSet<DotName>,
        visited: &mut HashSet<MethodKey>,
        suppressed: &mut HashSet<MethodKey>,
        out: &mut MethodCandidates,
    ) {
        if !visited_interfaces.insert(name) {
            return;
        }
        let Some(interface) = self.index.class_by_name(name) else {
            return;
        };
        self.visit(&interface, visited, suppressed, out);
        for parent in interface.interface_names() {
            self.visit_interface(parent, visited_interfaces, visited, suppressed, out);
        }
    }

    fn visit(
        &self,
        class: &ClassInfo,
        visited: &mut HashSet<MethodKey>,
        suppressed: &mut HashSet<MethodKey>,
        out: &mut MethodCandidates,
    ) {
        for method in &class.methods {
            if self.skip(class, method) {
                continue;
            }
            // An override hides the overridden method even when it is not intercepted itself.
            let key = MethodKey::of(method);
            if !visited.insert(key.clone()) {
                continue;
            }

            let method_level = self.bindings.extract(&method.annotations);
            if method.has_annotation(*names::NO_CLASS_INTERCEPTORS) {
                suppressed.insert(key.clone());
            }

            if method.is_private() {
                if !method_level.is_empty() {
                    self.private_method(method, &method_level, out);
                }
                continue;
            }

            let merged = if suppressed.contains(&key) {
                method_level
            } else {
                merge(method_level, self.class_level)
            };
            if merged.is_empty() {
                continue;
            }

            if method.is_final() {
                if self.options.transform_final_methods && !class.name.is_jdk() {
                    out.transformations.push(Transformation::FinalMethodRemoval {
                        class: class.name,
                        method: key.clone(),
                    });
                } else {
                    let message = format!(
                        "Final method {} will not be intercepted",
                        method.display_name()
                    );
                    tracing::warn!(target: "nova.cdi.interception", "{message}");
                    out.diagnostics.push(Diagnostic::warning(CDI_FINAL_METHOD_CODE, message));
                    continue;
                }
            }

            out.methods.insert(
                key,
                InterceptedMethod {
                    method: method.clone(),
                    bindings: merged,
                    interceptors: Vec::new(),
                },
            );
        }
    }

    fn skip(&self, class: &ClassInfo, method: &MethodInfo) -> bool {
        if method.is_static() || method.is_constructor() || method.is_static_initializer() {
            return true;
        }
        if method.is_synthetic() && !method.is_bridge() {
            return true;
        }
        if method.is_bridge()
            && class.methods.iter().any(|other| {
                !other.is_bridge() && other.name == method.name && other.params.len() == method.params.len()
            })
        {
            return true;
        }
        if class.name == *names::OBJECT && method.name != "toString" {
            return true;
        }
        class.is_interface() && method.is_abstract()
    }

    fn private_method(&self, method: &MethodInfo, bindings: &[AnnotationInstance], out: &mut MethodCandidates) {
        let problem = DeploymentProblem::InterceptedPrivateMethod {
            method: method.display_name(),
            bindings: format_qualifiers(bindings),
        };
        if self.options.fail_on_intercepted_private_method {
            out.problems.push(problem);
        } else {
            tracing::warn!(target: "nova.cdi.interception", "{problem}");
            out.diagnostics.push(Diagnostic::warning(
                CDI_INTERCEPTED_PRIVATE_METHOD_CODE,
                problem.to_string(),
            ));
        }
    }
}

// A method-level binding shadows the class-level binding of the same type.
fn merge(method_level: Vec<AnnotationInstance>, class_level: &[AnnotationInstance]) -> Vec<AnnotationInstance> {
    let mut merged = method_level;
    let declared: HashSet<DotName> = merged.iter().map(|a| a.name).collect();
    merged.extend(
        class_level
            .iter()
            .filter(|binding| !declared.contains(&binding.name))
            .cloned(),
    );
    merged
}
