use nova_cdi::{BeanId, BeanProcessor, DeploymentError, ProcessorOutput};
use nova_config::CdiConfig;
use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, ClassInfo, FieldInfo, MemoryIndex};
use nova_types::Type;

pub fn annotation(name: DotName) -> AnnotationInstance {
    AnnotationInstance::new(name)
}

pub fn singleton(name: &str) -> ClassInfo {
    ClassInfo::class(name).annotated(annotation(*names::SINGLETON))
}

pub fn application_scoped(name: &str) -> ClassInfo {
    ClassInfo::class(name).annotated(annotation(*names::APPLICATION_SCOPED))
}

pub fn inject(field: &str, ty: Type) -> FieldInfo {
    FieldInfo::new(field, ty).annotated(annotation(*names::INJECT))
}

pub fn priority(value: i32) -> AnnotationInstance {
    AnnotationInstance::new(*names::PRIORITY).with("value", value)
}

pub fn interceptor_binding(name: &str) -> ClassInfo {
    ClassInfo::annotation(name).annotated(annotation(*names::INTERCEPTOR_BINDING))
}

pub fn interceptor(name: &str, binding: AnnotationInstance, prio: i32) -> ClassInfo {
    ClassInfo::class(name)
        .annotated(annotation(*names::INTERCEPTOR))
        .annotated(binding)
        .annotated(priority(prio))
}

/// Keep every bean unless a test is about removal.
pub fn keep_all() -> CdiConfig {
    CdiConfig {
        remove_unused_beans: false,
        ..CdiConfig::default()
    }
}

pub fn process(index: MemoryIndex, config: CdiConfig) -> Result<ProcessorOutput, DeploymentError> {
    BeanProcessor::builder(index)
        .config(config)
        .build()
        .expect("valid config")
        .process()
}

/// The class bean (not producer) for `class`.
pub fn class_bean(output: &ProcessorOutput, class: &str) -> BeanId {
    output
        .deployment
        .all_beans()
        .iter()
        .find(|bean| bean.is_class_bean() && bean.bean_class == DotName::new(class))
        .map(|bean| bean.id)
        .unwrap_or_else(|| panic!("no class bean for {class}"))
}

pub fn generated_names(output: &ProcessorOutput) -> Vec<&str> {
    output
        .components
        .iter()
        .map(|component| component.generated_name.as_str())
        .collect()
}
