use std::collections::BTreeSet;

use nova_cdi::{
    named, BeanDeployment, BeanProcessor, CodeGenerator, ComponentDescription, DeploymentProblem, GeneratedClass,
    GenerationError, ProcessorOutput, SyntheticBean, CDI_AMBIGUOUS_NAME_CODE, CDI_DEFINITION_CODE,
    CDI_DISABLED_ALTERNATIVE_CODE, CDI_INVALID_MEMBER_TYPE_CODE, CDI_UNUSED_BEAN_CODE, CDI_VALIDATOR_CODE,
};
use nova_config::{CdiConfig, NovaConfig};
use nova_core::names;
use nova_index::{ClassInfo, MemoryIndex, MethodInfo};
use nova_types::Type;
use pretty_assertions::assert_eq;

use super::fixtures::{
    annotation, application_scoped, class_bean, generated_names, inject, keep_all, process, singleton,
};

fn producer(name: &str, returns: &str) -> MethodInfo {
    MethodInfo::new(name, Vec::new(), Type::class(returns)).annotated(annotation(*names::PRODUCES))
}

/// `Car` is named and injects `Engine` and a produced `Oil`; everything else is unused.
fn removal_index() -> MemoryIndex {
    MemoryIndex::new()
        .with(
            singleton("com.acme.Car")
                .annotated(named("car"))
                .field(inject("engine", Type::class("com.acme.Engine")))
                .field(inject("oil", Type::class("com.acme.Oil"))),
        )
        .with(singleton("com.acme.Engine"))
        .with(singleton("com.acme.Orphan"))
        .with(singleton("com.acme.keep.Tool"))
        .with(
            singleton("com.acme.Factory")
                .method(producer("oil", "com.acme.Oil"))
                .method(producer("widget", "com.acme.Widget")),
        )
        .with(singleton("com.acme.Spare").method(producer("gadget", "com.acme.Gadget")))
        .with(ClassInfo::class("com.acme.Oil"))
        .with(ClassInfo::class("com.acme.Widget"))
        .with(ClassInfo::class("com.acme.Gadget"))
}

fn removal_config() -> CdiConfig {
    CdiConfig {
        unremovable: vec!["com.acme.keep.*".to_owned()],
        ..CdiConfig::default()
    }
}

#[test]
fn unused_beans_are_removed() {
    let output = process(removal_index(), removal_config()).expect("deployment is valid");
    let removed: BTreeSet<String> = output
        .deployment
        .removed_beans()
        .map(|bean| match bean.member_name() {
            Some(member) => format!("{}#{member}", bean.bean_class),
            None => bean.bean_class.to_string(),
        })
        .collect();
    assert_eq!(
        removed,
        BTreeSet::from([
            "com.acme.Factory#widget".to_owned(),
            "com.acme.Orphan".to_owned(),
            "com.acme.Spare".to_owned(),
            "com.acme.Spare#gadget".to_owned(),
        ])
    );
    let unused = output
        .diagnostics
        .iter()
        .filter(|d| d.code == CDI_UNUSED_BEAN_CODE)
        .count();
    assert_eq!(unused, removed.len());

    let generated = generated_names(&output);
    assert!(generated.contains(&"com.acme.keep.Tool_Bean"));
    assert!(generated.contains(&"com.acme.Factory_Bean"));
    assert!(!generated.contains(&"com.acme.Orphan_Bean"));
    assert!(!generated.iter().any(|name| name.starts_with("com.acme.Spare")));
}

#[test]
fn removal_can_be_disabled_from_toml() {
    let text = r#"
[cdi]
remove_unused_beans = false
remove_unused = true
"#;
    let (config, diagnostics) = NovaConfig::load_from_str_with_diagnostics(text).expect("valid toml");
    assert_eq!(diagnostics.unknown_keys, vec!["cdi.remove_unused"]);
    assert!(!config.cdi.remove_unused_beans);

    let output = process(removal_index(), config.cdi).expect("deployment is valid");
    assert_eq!(output.deployment.removed_beans().count(), 0);
    assert!(generated_names(&output).contains(&"com.acme.Orphan_Bean"));
}

#[test]
fn synthetic_beans_satisfy_injection_and_are_never_removed() {
    let index = MemoryIndex::new()
        .with(
            singleton("com.acme.Scheduler")
                .annotated(named("scheduler"))
                .field(inject("clock", Type::class("com.acme.Clock"))),
        )
        .with(ClassInfo::interface("com.acme.Clock"));
    let processor = BeanProcessor::builder(index)
        .synthetic_bean(SyntheticBean::new("com.acme.Clock").scope(*names::SINGLETON))
        .synthetic_bean(SyntheticBean::new("com.acme.Unused"))
        .build()
        .expect("valid config");
    let output = processor.process().expect("deployment is valid");
    assert_eq!(output.deployment.removed_beans().count(), 0);

    let generated = generated_names(&output);
    assert_eq!(generated.len(), 3);
    assert!(generated[0].starts_with("com.acme.Clock_"));
    assert!(generated[0].ends_with("_Synthetic_Bean"));
    let scheduler = generated
        .iter()
        .position(|name| *name == "com.acme.Scheduler_Bean")
        .expect("scheduler is generated");
    assert_eq!(output.components[scheduler].references, vec![generated[0].to_owned()]);
}

#[test]
fn custom_validators_contribute_problems() {
    let index = MemoryIndex::new().with(singleton("com.acme.Legacy").annotated(named("legacy")));
    let processor = BeanProcessor::builder(index)
        .validator(|deployment: &BeanDeployment, problems: &mut Vec<DeploymentProblem>| {
            for bean in deployment.beans() {
                if bean.bean_class.as_str().ends_with("Legacy") {
                    problems.push(DeploymentProblem::Validator {
                        message: format!("{} is deprecated", bean.bean_class),
                    });
                }
            }
        })
        .build()
        .expect("valid config");
    let err = processor.process().unwrap_err();
    assert!(err.has_code(CDI_VALIDATOR_CODE));
    assert_eq!(err.to_string(), "com.acme.Legacy is deprecated");
}

#[test]
fn invalid_unremovable_glob_fails_the_build() {
    let config = CdiConfig {
        unremovable: vec!["com.acme.[".to_owned()],
        ..CdiConfig::default()
    };
    let result = BeanProcessor::builder(MemoryIndex::new()).config(config).build();
    assert!(result.is_err());
}

#[test]
fn injection_point_metadata_requires_dependent_scope() {
    let index = MemoryIndex::new()
        .with(application_scoped("com.acme.Service").field(inject("ip", Type::class(*names::INJECTION_POINT))))
        .with(singleton("com.acme.Helper").field(inject("ip", Type::class(*names::INJECTION_POINT))));
    let err = process(index, keep_all()).unwrap_err();
    assert_eq!(err.problems.len(), 2);
    assert!(err.problems.iter().all(|p| p.code() == CDI_DEFINITION_CODE));
    assert!(err.to_string().contains("com.acme.Service#ip"));
    assert!(err.to_string().contains("com.acme.Helper#ip"));
}

#[test]
fn injection_point_metadata_in_dependent_bean_is_valid() {
    let index = MemoryIndex::new()
        .with(
            ClassInfo::class("com.acme.Tracer")
                .annotated(annotation(*names::DEPENDENT))
                .field(inject("ip", Type::class(*names::INJECTION_POINT))),
        )
        .with(singleton("com.acme.Service").field(inject("tracer", Type::class("com.acme.Tracer"))));
    let output = process(index, keep_all()).expect("deployment is valid");
    let tracer = class_bean(&output, "com.acme.Tracer");
    assert!(!output.deployment.is_removed(tracer));
}

#[test]
fn ambiguous_bean_names_are_reported() {
    let index = MemoryIndex::new()
        .with(singleton("com.acme.PetrolEngine").annotated(named("engine")))
        .with(singleton("com.acme.DieselEngine").annotated(named("engine")));
    let err = process(index, keep_all()).unwrap_err();
    assert!(err.has_code(CDI_AMBIGUOUS_NAME_CODE));
    let DeploymentProblem::AmbiguousName { name, candidates } = &err.problems[0] else {
        panic!("expected an ambiguous name, got {err}");
    };
    assert_eq!(name, "engine");
    assert_eq!(candidates.len(), 2);
}

#[test]
fn invalid_qualifier_member_type_is_rejected() {
    let index = MemoryIndex::new().with(
        ClassInfo::annotation("com.acme.Tagged")
            .annotated(annotation(*names::QUALIFIER))
            .method(MethodInfo::member(
                "tags",
                Type::parameterized("java.util.List", vec![Type::class(*names::STRING)]),
                None,
            )),
    );
    let err = process(index, keep_all()).unwrap_err();
    assert!(err.has_code(CDI_INVALID_MEMBER_TYPE_CODE));
    assert_eq!(
        err.to_string(),
        "Invalid type of annotation member com.acme.Tagged#tags(): java.util.List<java.lang.String>"
    );
}

/// Emits the component's references as the class body.
struct ReferenceWriter;

impl CodeGenerator for ReferenceWriter {
    fn generate(&self, component: &ComponentDescription) -> Result<GeneratedClass, GenerationError> {
        Ok(GeneratedClass {
            name: component.generated_name.clone(),
            data: component.references.join("\n").into_bytes(),
        })
    }
}

struct FailOn(&'static str);

impl CodeGenerator for FailOn {
    fn generate(&self, component: &ComponentDescription) -> Result<GeneratedClass, GenerationError> {
        if component.generated_name == self.0 {
            return Err(GenerationError::Failed {
                component: component.generated_name.clone(),
                message: "boom".to_owned(),
            });
        }
        ReferenceWriter.generate(component)
    }
}

fn chain_index() -> MemoryIndex {
    (0..12).fold(MemoryIndex::new(), |index, idx| {
        let mut class = singleton(&format!("com.acme.Step{idx:02}"));
        if idx > 0 {
            class = class.field(inject("previous", Type::class(format!("com.acme.Step{:02}", idx - 1).as_str())));
        }
        index.with(class)
    })
}

#[test]
fn parallel_generation_keeps_component_order() {
    let inline = process(chain_index(), keep_all()).expect("deployment is valid");
    let parallel = process(
        chain_index(),
        CdiConfig {
            generation_threads: 4,
            ..keep_all()
        },
    )
    .expect("deployment is valid");

    let sequential = inline.generate(&ReferenceWriter).expect("generation succeeds");
    let concurrent = parallel.generate(&ReferenceWriter).expect("generation succeeds");
    assert_eq!(sequential, concurrent);

    let names: Vec<&str> = sequential.iter().map(|class| class.name.as_str()).collect();
    assert_eq!(names, generated_names(&inline));
    assert_eq!(names.first(), Some(&"com.acme.Step00_Bean"));
    assert_eq!(names.last(), Some(&"com.acme.Step11_Bean"));
    assert_eq!(sequential[1].data, b"com.acme.Step00_Bean".to_vec());
}

#[test]
fn generation_failures_propagate() {
    let output = process(
        chain_index(),
        CdiConfig {
            generation_threads: 2,
            ..keep_all()
        },
    )
    .expect("deployment is valid");
    let err = output.generate(&FailOn("com.acme.Step05_Bean")).unwrap_err();
    assert_eq!(err.to_string(), "failed to generate com.acme.Step05_Bean: boom");
}

#[test]
fn additional_bean_defining_annotations_are_honored() {
    let index = || {
        MemoryIndex::new()
            .with(ClassInfo::annotation("com.acme.Component"))
            .with(ClassInfo::class("com.acme.Widget").annotated(annotation("com.acme.Component".into())))
    };
    let plain = process(index(), keep_all()).expect("deployment is valid");
    assert!(plain.components.is_empty());

    let config = CdiConfig {
        additional_bean_defining_annotations: vec!["com.acme.Component".to_owned()],
        ..keep_all()
    };
    let output = process(index(), config).expect("deployment is valid");
    assert_eq!(generated_names(&output), vec!["com.acme.Widget_Bean"]);
}

#[test]
fn selected_alternative_replaces_the_default_implementation() {
    let index = || {
        MemoryIndex::new()
            .with(ClassInfo::interface("com.acme.Engine"))
            .with(singleton("com.acme.PetrolEngine").implements(Type::class("com.acme.Engine")))
            .with(
                singleton("com.acme.ElectricEngine")
                    .annotated(annotation(*names::ALTERNATIVE))
                    .implements(Type::class("com.acme.Engine")),
            )
            .with(singleton("com.acme.Car").field(inject("engine", Type::class("com.acme.Engine"))))
    };
    let engine_of = |output: &ProcessorOutput| {
        let car = class_bean(output, "com.acme.Car");
        let ip = output.deployment.bean_injection_points(output.deployment.bean(car)).next().expect("engine");
        let engine = ip.resolved_bean().expect("engine is resolved");
        output.deployment.bean(engine).bean_class.to_string()
    };

    let output = process(index(), keep_all()).expect("deployment is valid");
    assert_eq!(engine_of(&output), "com.acme.PetrolEngine");
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.code == CDI_DISABLED_ALTERNATIVE_CODE));

    let config = CdiConfig {
        selected_alternatives: vec!["com.acme.Electric*".to_owned()],
        ..keep_all()
    };
    let output = process(index(), config).expect("deployment is valid");
    assert_eq!(engine_of(&output), "com.acme.ElectricEngine");
}
