//! Bean discovery: turns index classes and registered synthetic beans into bean,
//! observer and injection point metadata.

use std::collections::HashSet;

use globset::GlobSet;

use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, ClassIndex, ClassInfo, FieldInfo, MethodInfo};
use nova_types::Type;

use crate::bean::{BeanId, BeanInfo, BeanKind, ObserverId, ObserverInfo, SyntheticBean};
use crate::error::{
    DeploymentProblem, Diagnostic, CDI_DISABLED_ALTERNATIVE_CODE, CDI_INTERCEPTOR_PRIORITY_CODE,
};
use crate::injection::{InjectionOwner, InjectionPoint, InjectionPointId, InjectionTarget};
use crate::interceptors::InterceptorBindings;
use crate::qualifiers::{any_qualifier, default_qualifier, named, QualifierRegistry};
use crate::scope::{ScopeInfo, Scopes};
use crate::types::{class_bean_types, producer_bean_types, restrict_to_typed, typed_violations};

/// Everything discovery produced. Problems are reported together once discovery is done.
#[derive(Debug, Default)]
pub struct Discovered {
    pub beans: Vec<BeanInfo>,
    pub observers: Vec<ObserverInfo>,
    pub injection_points: Vec<InjectionPoint>,
    pub problems: Vec<DeploymentProblem>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct BeanDiscovery<'a> {
    index: &'a dyn ClassIndex,
    qualifiers: &'a QualifierRegistry,
    scopes: &'a Scopes,
    bindings: &'a InterceptorBindings,
    bean_defining: HashSet<DotName>,
    selected_alternatives: &'a GlobSet,
    out: Discovered,
}

struct Alternative {
    enabled: bool,
    priority: Option<i32>,
}

impl<'a> BeanDiscovery<'a> {
    pub fn new(
        index: &'a dyn ClassIndex,
        qualifiers: &'a QualifierRegistry,
        scopes: &'a Scopes,
        bindings: &'a InterceptorBindings,
        bean_defining: impl IntoIterator<Item = DotName>,
        selected_alternatives: &'a GlobSet,
    ) -> Self {
        Self {
            index,
            qualifiers,
            scopes,
            bindings,
            bean_defining: bean_defining.into_iter().collect(),
            selected_alternatives,
            out: Discovered::default(),
        }
    }

    pub fn discover(mut self, synthetic: &[SyntheticBean]) -> Discovered {
        for class in self.index.known_classes() {
            if class.is_annotation() || class.is_interface() {
                continue;
            }
            if class.has_annotation(*names::INTERCEPTOR) {
                self.interceptor(&class);
            } else if !class.is_abstract() {
                self.class_bean(&class);
            }
        }
        for bean in synthetic {
            self.synthetic(bean);
        }
        tracing::debug!(
            target: "nova.cdi",
            beans = self.out.beans.len(),
            observers = self.out.observers.len(),
            injection_points = self.out.injection_points.len(),
            "discovery finished"
        );
        self.out
    }

    fn next_bean_id(&self) -> BeanId {
        BeanId(self.out.beans.len() as u32)
    }

    fn class_bean(&mut self, class: &ClassInfo) {
        let declared = match self.scopes.declared(&class.annotations) {
            Ok(scope) => scope,
            Err(found) => {
                self.multiple_scopes(class.name, &found);
                return;
            }
        };
        let scope = declared.or_else(|| self.scopes.inherited(self.index, class));
        let bean_defining = scope.is_some()
            || class
                .annotations
                .iter()
                .any(|a| self.bean_defining.contains(&a.name));

        let producer_methods: Vec<&MethodInfo> = class
            .methods
            .iter()
            .filter(|m| m.has_annotation(*names::PRODUCES))
            .collect();
        let producer_fields: Vec<&FieldInfo> = class
            .fields
            .iter()
            .filter(|f| f.has_annotation(*names::PRODUCES))
            .collect();
        let observer_methods: Vec<&MethodInfo> =
            class.methods.iter().filter(|m| observed_parameter(m).is_some()).collect();
        if !bean_defining
            && producer_methods.is_empty()
            && producer_fields.is_empty()
            && observer_methods.is_empty()
        {
            return;
        }

        let Some(alternative) = self.alternative(&class.annotations, class.name, None) else {
            return;
        };
        let Some(types) = self.typed(class.name, class_bean_types(self.index, class), &class.annotations)
        else {
            return;
        };
        let (qualifiers, name) =
            self.bean_qualifiers(&class.annotations, decapitalize(class.name.simple_name()));

        let id = self.next_bean_id();
        let injection_points = self.class_injection_points(class, InjectionOwner::Bean(id));
        let mut bean = BeanInfo::new(
            id,
            BeanKind::Class,
            class.name,
            class.as_type(),
            types,
            qualifiers,
            scope.unwrap_or_else(ScopeInfo::dependent),
        );
        bean.name = name;
        bean.alternative = alternative.enabled;
        bean.priority = alternative.priority;
        bean.injection_points = injection_points;
        bean.interceptor_bindings = self.bindings.class_level(self.index, class);
        tracing::trace!(target: "nova.cdi", %bean, "discovered");
        self.out.beans.push(bean);

        for method in producer_methods {
            self.producer_method(id, &alternative, method);
        }
        for field in producer_fields {
            self.producer_field(id, &alternative, field);
        }
        for method in observer_methods {
            self.observer(id, method);
        }
    }

    fn interceptor(&mut self, class: &ClassInfo) {
        let Some(priority) = priority_of(&class.annotations) else {
            let message = format!("Interceptor {} has no @Priority and will be ignored", class.name);
            tracing::warn!(target: "nova.cdi", "{message}");
            self.out
                .diagnostics
                .push(Diagnostic::warning(CDI_INTERCEPTOR_PRIORITY_CODE, message));
            return;
        };
        let bindings = self.bindings.extract(&class.annotations);
        if bindings.is_empty() {
            self.out.problems.push(DeploymentProblem::definition(
                class.name,
                "Interceptor declares no interceptor binding",
            ));
            return;
        }

        let id = self.next_bean_id();
        let injection_points = self.class_injection_points(class, InjectionOwner::Bean(id));
        let mut bean = BeanInfo::new(
            id,
            BeanKind::Interceptor,
            class.name,
            class.as_type(),
            class_bean_types(self.index, class).into_iter().collect(),
            vec![any_qualifier()],
            ScopeInfo::dependent(),
        );
        bean.priority = Some(priority);
        bean.interceptor_bindings = bindings;
        bean.injection_points = injection_points;
        self.out.beans.push(bean);
    }

    fn producer_method(&mut self, declaring: BeanId, declaring_alt: &Alternative, method: &MethodInfo) {
        let target = format!("{}#{}()", method.declaring_class, method.name);
        let Some(scope) = self.member_scope(&target, &method.annotations) else {
            return;
        };
        let Some(alternative) = self.alternative(&method.annotations, method.declaring_class, Some(declaring_alt))
        else {
            return;
        };
        let produced = method.return_type.clone();
        let Some(types) = self.typed(&target, producer_bean_types(self.index, &produced), &method.annotations)
        else {
            return;
        };
        let (qualifiers, name) = self.bean_qualifiers(&method.annotations, property_name(&method.name));

        let id = self.next_bean_id();
        let injection_points = self.parameter_injection_points(method, InjectionOwner::Bean(id), None);
        let mut bean = BeanInfo::new(
            id,
            BeanKind::ProducerMethod(method.clone()),
            method.declaring_class,
            produced,
            types,
            qualifiers,
            scope,
        );
        bean.name = name;
        bean.alternative = alternative.enabled;
        bean.priority = alternative.priority;
        bean.declaring_bean = Some(declaring);
        bean.injection_points = injection_points;
        self.out.beans.push(bean);
    }

    fn producer_field(&mut self, declaring: BeanId, declaring_alt: &Alternative, field: &FieldInfo) {
        let target = format!("{}#{}", field.declaring_class, field.name);
        let Some(scope) = self.member_scope(&target, &field.annotations) else {
            return;
        };
        let Some(alternative) = self.alternative(&field.annotations, field.declaring_class, Some(declaring_alt))
        else {
            return;
        };
        let Some(types) = self.typed(&target, producer_bean_types(self.index, &field.ty), &field.annotations)
        else {
            return;
        };
        let (qualifiers, name) = self.bean_qualifiers(&field.annotations, field.name.to_string());

        let mut bean = BeanInfo::new(
            self.next_bean_id(),
            BeanKind::ProducerField(field.clone()),
            field.declaring_class,
            field.ty.clone(),
            types,
            qualifiers,
            scope,
        );
        bean.name = name;
        bean.alternative = alternative.enabled;
        bean.priority = alternative.priority;
        bean.declaring_bean = Some(declaring);
        self.out.beans.push(bean);
    }

    fn observer(&mut self, declaring: BeanId, method: &MethodInfo) {
        let Some((position, is_async)) = observed_parameter(method) else {
            return;
        };
        let id = ObserverId(self.out.observers.len() as u32);
        let injection_points =
            self.parameter_injection_points(method, InjectionOwner::Observer(id), Some(position));
        let observed_type = method.params[position].clone();
        let qualifiers = self.qualifiers.extract(method.parameter_annotations(position));
        self.out.observers.push(ObserverInfo {
            id,
            declaring_bean: declaring,
            method: method.clone(),
            observed_type,
            qualifiers,
            is_async,
            injection_points,
        });
    }

    fn synthetic(&mut self, synthetic: &SyntheticBean) {
        let scope = match synthetic.scope {
            None => ScopeInfo::dependent(),
            Some(name) => match self.scopes.get(name) {
                Some(scope) => scope,
                None => {
                    self.out.problems.push(DeploymentProblem::definition(
                        synthetic.implementation_class,
                        format!("Unknown scope {name} on synthetic bean"),
                    ));
                    return;
                }
            },
        };
        let mut types = synthetic.types.clone();
        if !types.iter().any(Type::is_object) {
            types.push(Type::object());
        }
        let mut annotations = synthetic.qualifiers.clone();
        if let Some(name) = &synthetic.name {
            annotations.push(named(name));
        }
        let (qualifiers, name) = self.bean_qualifiers(
            &annotations,
            decapitalize(synthetic.implementation_class.simple_name()),
        );

        let mut bean = BeanInfo::new(
            self.next_bean_id(),
            BeanKind::Synthetic,
            synthetic.implementation_class,
            Type::Class(synthetic.implementation_class),
            types,
            qualifiers,
            scope,
        );
        bean.name = name;
        bean.alternative = synthetic.alternative_priority.is_some();
        bean.priority = synthetic.alternative_priority;
        self.out.beans.push(bean);
    }

    fn multiple_scopes(&mut self, target: impl std::fmt::Display, found: &[ScopeInfo]) {
        let rendered: Vec<String> = found.iter().map(ToString::to_string).collect();
        self.out.problems.push(DeploymentProblem::definition(
            target,
            format!("Multiple scopes declared [{}]", rendered.join(", ")),
        ));
    }

    fn member_scope(&mut self, target: &str, annotations: &[AnnotationInstance]) -> Option<ScopeInfo> {
        match self.scopes.declared(annotations) {
            Ok(scope) => Some(scope.unwrap_or_else(ScopeInfo::dependent)),
            Err(found) => {
                self.multiple_scopes(target, &found);
                None
            }
        }
    }

    /// Alternative status; producers inherit it from their declaring bean.
    fn alternative(
        &mut self,
        annotations: &[AnnotationInstance],
        class: DotName,
        declaring: Option<&Alternative>,
    ) -> Option<Alternative> {
        let own = annotations.iter().any(|a| a.name == *names::ALTERNATIVE);
        let inherited = declaring.is_some_and(|d| d.enabled);
        if !own && !inherited {
            return Some(Alternative {
                enabled: false,
                priority: None,
            });
        }
        let priority = priority_of(annotations).or_else(|| declaring.and_then(|d| d.priority));
        if priority.is_some() {
            return Some(Alternative {
                enabled: true,
                priority,
            });
        }
        if self.selected_alternatives.is_match(class.as_str()) {
            return Some(Alternative {
                enabled: true,
                priority: Some(i32::MAX),
            });
        }
        let message = format!("Alternative {class} has no priority and is not selected; it is disabled");
        tracing::debug!(target: "nova.cdi", "{message}");
        self.out
            .diagnostics
            .push(Diagnostic::info(CDI_DISABLED_ALTERNATIVE_CODE, message));
        None
    }

    fn typed(
        &mut self,
        target: impl std::fmt::Display,
        types: indexmap::IndexSet<Type>,
        annotations: &[AnnotationInstance],
    ) -> Option<Vec<Type>> {
        let Some(typed) = annotations.iter().find(|a| a.name == *names::TYPED) else {
            return Some(types.into_iter().collect());
        };
        let violations = typed_violations(&types, typed);
        if !violations.is_empty() {
            let listed: Vec<&str> = violations.iter().map(|n| n.as_str()).collect();
            self.out.problems.push(DeploymentProblem::definition(
                target,
                format!("@Typed lists types that are not bean types [{}]", listed.join(", ")),
            ));
            return None;
        }
        Some(restrict_to_typed(types, typed).into_iter().collect())
    }

    /// Qualifiers with `@Named` normalized and `@Default`/`@Any` added.
    fn bean_qualifiers(
        &self,
        annotations: &[AnnotationInstance],
        default_name: String,
    ) -> (Vec<AnnotationInstance>, Option<String>) {
        let mut qualifiers = self.qualifiers.extract(annotations);
        let mut name = None;
        for qualifier in &mut qualifiers {
            if qualifier.name != *names::NAMED {
                continue;
            }
            let value = qualifier
                .value("value")
                .and_then(|v| v.as_str())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| default_name.clone());
            *qualifier = named(&value);
            name = Some(value);
        }
        if !qualifiers
            .iter()
            .any(|q| q.name != *names::NAMED && q.name != *names::ANY)
        {
            qualifiers.push(default_qualifier());
        }
        if !qualifiers.iter().any(|q| q.name == *names::ANY) {
            qualifiers.push(any_qualifier());
        }
        (qualifiers, name)
    }

    /// Constructor, field and initializer injection points of a class and its superclasses.
    fn class_injection_points(&mut self, class: &ClassInfo, owner: InjectionOwner) -> Vec<InjectionPointId> {
        let mut ids = Vec::new();
        let inject_constructors: Vec<&MethodInfo> = class
            .constructors()
            .filter(|c| c.has_annotation(*names::INJECT))
            .collect();
        match inject_constructors.as_slice() {
            [] if class.no_args_constructor().is_none() => {
                self.out.problems.push(DeploymentProblem::definition(
                    class.name,
                    "Bean class must declare a no-args constructor or a constructor annotated @Inject",
                ));
            }
            [] => {}
            [constructor] => ids.extend(self.parameter_injection_points(constructor, owner, None)),
            _ => self.out.problems.push(DeploymentProblem::definition(
                class.name,
                "Multiple @Inject constructors found",
            )),
        }

        // Supertypes are injected first.
        let mut hierarchy = vec![];
        let mut seen = HashSet::from([class.name]);
        let mut next = class.super_name();
        while let Some(name) = next {
            if name == *names::OBJECT || !seen.insert(name) {
                break;
            }
            let Some(super_class) = self.index.class_by_name(name) else {
                break;
            };
            next = super_class.super_name();
            hierarchy.push(super_class);
        }
        hierarchy.reverse();

        for info in hierarchy.iter().map(|c| &**c).chain(std::iter::once(class)) {
            for field in &info.fields {
                if !field.has_annotation(*names::INJECT) || field.is_static() {
                    continue;
                }
                let target = InjectionTarget::Field {
                    class: info.name,
                    field: field.name.clone(),
                };
                let id = self.injection_point(owner, field.ty.clone(), &field.annotations, target, Some(field.name.as_str()));
                self.out.injection_points[id.index()].transient = field.is_transient();
                ids.push(id);
            }
            for method in &info.methods {
                if method.has_annotation(*names::INJECT) && !method.is_constructor() && !method.is_static() {
                    ids.extend(self.parameter_injection_points(method, owner, None));
                }
            }
        }
        ids
    }

    fn parameter_injection_points(
        &mut self,
        method: &MethodInfo,
        owner: InjectionOwner,
        skip: Option<usize>,
    ) -> Vec<InjectionPointId> {
        let mut ids = Vec::with_capacity(method.params.len());
        for (position, param) in method.params.iter().enumerate() {
            if Some(position) == skip {
                continue;
            }
            let target = InjectionTarget::Parameter {
                class: method.declaring_class,
                method: method.name.clone(),
                position,
            };
            ids.push(self.injection_point(
                owner,
                param.clone(),
                method.parameter_annotations(position),
                target,
                None,
            ));
        }
        ids
    }

    fn injection_point(
        &mut self,
        owner: InjectionOwner,
        required_type: Type,
        annotations: &[AnnotationInstance],
        target: InjectionTarget,
        default_name: Option<&str>,
    ) -> InjectionPointId {
        let mut qualifiers = self.qualifiers.extract(annotations);
        if let Some(default_name) = default_name {
            for qualifier in &mut qualifiers {
                let empty = qualifier.value("value").and_then(|v| v.as_str()).map_or(true, str::is_empty);
                if qualifier.name == *names::NAMED && empty {
                    *qualifier = named(default_name);
                }
            }
        }
        let id = InjectionPointId(self.out.injection_points.len() as u32);
        let mut ip = InjectionPoint::new(id, owner, required_type, qualifiers, target);
        ip.delegate = annotations.iter().any(|a| a.name == *names::DELEGATE);
        self.out.injection_points.push(ip);
        id
    }
}

fn priority_of(annotations: &[AnnotationInstance]) -> Option<i32> {
    annotations
        .iter()
        .find(|a| a.name == *names::PRIORITY)
        .and_then(|a| a.value("value"))
        .and_then(|v| v.as_int())
}

/// Position of the `@Observes`/`@ObservesAsync` parameter and whether it is async.
fn observed_parameter(method: &MethodInfo) -> Option<(usize, bool)> {
    (0..method.params.len()).find_map(|position| {
        let annotations = method.parameter_annotations(position);
        if annotations.iter().any(|a| a.name == *names::OBSERVES) {
            Some((position, false))
        } else if annotations.iter().any(|a| a.name == *names::OBSERVES_ASYNC) {
            Some((position, true))
        } else {
            None
        }
    })
}

/// `Foo` → `foo`; names starting with two capitals are kept (`URLFoo`).
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
        return name.to_owned();
    }
    first.to_lowercase().chain(name.chars().skip(1)).collect()
}

/// `getEngine` → `engine`, `isReady` → `ready`; other names unchanged.
pub fn property_name(method: &str) -> String {
    for prefix in ["get", "is"] {
        if let Some(rest) = method.strip_prefix(prefix) {
            if rest.chars().next().is_some_and(char::is_uppercase) {
                return decapitalize(rest);
            }
        }
    }
    method.to_owned()
}
