//! Component descriptions handed to the code generator.

use serde::Serialize;
use thiserror::Error;

use nova_core::DotName;

use crate::bean::{BeanId, BeanInfo, BeanKind, ObserverInfo};
use crate::deployment::BeanDeployment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Bean,
    Interceptor,
    Observer,
}

/// What the code generator needs to emit one class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentDescription {
    pub kind: ComponentKind,
    /// Bean class, or the declaring class of a producer or observer.
    pub target: DotName,
    pub identifier: String,
    pub generated_name: String,
    /// Generated names this component refers to directly, in injection order.
    pub references: Vec<String>,
    /// Intercepted methods as `name(params)`.
    pub intercepted_methods: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedClass {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to generate {component}: {message}")]
    Failed { component: String, message: String },
}

/// Turns component descriptions into class files. Shared across generation threads.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, component: &ComponentDescription) -> Result<GeneratedClass, GenerationError>;
}

fn short_hash(input: &str) -> String {
    let hash = blake3::hash(input.as_bytes()).to_hex();
    hash.as_str()[..10].to_string()
}

// Nested classes (`Outer$Inner`) become `Outer_Inner`.
fn base_name(class: DotName) -> String {
    class.as_str().replace('$', "_")
}

pub fn bean_generated_name(bean: &BeanInfo) -> String {
    let base = base_name(bean.bean_class);
    match &bean.kind {
        BeanKind::Class => format!("{base}_Bean"),
        BeanKind::Interceptor => format!("{base}_Interceptor"),
        BeanKind::ProducerMethod(method) => {
            let signature: Vec<String> = method.params.iter().map(|p| p.descriptor()).collect();
            let hash = short_hash(&format!(
                "{}({}){}",
                method.name,
                signature.join(""),
                method.return_type.descriptor()
            ));
            format!("{base}_ProducerMethod_{}_{hash}_Bean", method.name)
        }
        BeanKind::ProducerField(field) => format!("{base}_ProducerField_{}_Bean", field.name),
        BeanKind::Synthetic => format!("{base}_{}_Synthetic_Bean", &bean.identifier()[..10]),
    }
}

pub fn observer_generated_name(observer: &ObserverInfo) -> String {
    let params: Vec<String> = observer.method.params.iter().map(|p| p.descriptor()).collect();
    let hash = short_hash(&format!(
        "{}{}({})",
        observer.declaring_bean.index(),
        observer.method.name,
        params.join("")
    ));
    format!(
        "{}_Observer_{}_{hash}",
        base_name(observer.method.declaring_class),
        observer.method.name
    )
}

/// Describe `order` (beans and interceptors) followed by every kept observer.
pub fn describe(deployment: &BeanDeployment, order: &[BeanId]) -> Vec<ComponentDescription> {
    let mut components: Vec<ComponentDescription> = order
        .iter()
        .map(|id| describe_bean(deployment, deployment.bean(*id)))
        .collect();
    components.extend(deployment.observers().map(|observer| describe_observer(deployment, observer)));
    components
}

fn push_unique(references: &mut Vec<String>, name: String) {
    if !references.contains(&name) {
        references.push(name);
    }
}

fn describe_bean(deployment: &BeanDeployment, bean: &BeanInfo) -> ComponentDescription {
    let mut references = Vec::new();
    if let Some(declaring) = bean.declaring_bean {
        push_unique(&mut references, bean_generated_name(deployment.bean(declaring)));
    }
    for ip in deployment.bean_injection_points(bean) {
        if let Some(resolved) = ip.resolved_bean() {
            push_unique(&mut references, bean_generated_name(deployment.bean(resolved)));
        }
    }
    for interceptor in deployment.bound_interceptors(bean.id) {
        push_unique(&mut references, bean_generated_name(deployment.bean(*interceptor)));
    }
    let intercepted_methods = deployment
        .intercepted_methods(bean.id)
        .map(|methods| methods.keys().map(ToString::to_string).collect())
        .unwrap_or_default();
    ComponentDescription {
        kind: if bean.is_interceptor() {
            ComponentKind::Interceptor
        } else {
            ComponentKind::Bean
        },
        target: bean.bean_class,
        identifier: bean.identifier().to_owned(),
        generated_name: bean_generated_name(bean),
        references,
        intercepted_methods,
    }
}

fn describe_observer(deployment: &BeanDeployment, observer: &ObserverInfo) -> ComponentDescription {
    let mut references = vec![bean_generated_name(deployment.bean(observer.declaring_bean))];
    for id in &observer.injection_points {
        if let Some(resolved) = deployment.injection_point(*id).resolved_bean() {
            push_unique(&mut references, bean_generated_name(deployment.bean(resolved)));
        }
    }
    let generated_name = observer_generated_name(observer);
    ComponentDescription {
        kind: ComponentKind::Observer,
        target: observer.method.declaring_class,
        identifier: short_hash(&generated_name),
        generated_name,
        references,
        intercepted_methods: Vec::new(),
    }
}
