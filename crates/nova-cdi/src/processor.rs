//! The processing pipeline: discovery, interception, resolution, validation, removal and
//! ordering, followed by code generation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use globset::GlobSet;
use indexmap::IndexMap;
use rayon::prelude::*;

use nova_config::{CdiConfig, ConfigError};
use nova_core::DotName;
use nova_index::{ClassIndex, CompositeIndex, JdkIndex};

use crate::bean::{BeanId, SyntheticBean};
use crate::components::{describe, CodeGenerator, ComponentDescription, GeneratedClass, GenerationError};
use crate::deployment::BeanDeployment;
use crate::discovery::BeanDiscovery;
use crate::error::{DeploymentError, DeploymentProblem, Diagnostic};
use crate::graph::order_beans;
use crate::injection::resolve_injection_points;
use crate::interception::{
    intercepted_method_candidates, InterceptedMethod, InterceptionOptions, MethodKey, Transformation,
};
use crate::interceptors::{InterceptorBindings, InterceptorResolver};
use crate::qualifiers::QualifierRegistry;
use crate::removal::find_unused_beans;
use crate::scope::Scopes;
use crate::validation::{validate, BeanDeploymentValidator};

pub struct BeanProcessorBuilder {
    index: Arc<dyn ClassIndex>,
    config: CdiConfig,
    synthetic: Vec<SyntheticBean>,
    validators: Vec<Box<dyn BeanDeploymentValidator>>,
}

impl BeanProcessorBuilder {
    pub fn config(mut self, config: CdiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn synthetic_bean(mut self, bean: SyntheticBean) -> Self {
        self.synthetic.push(bean);
        self
    }

    pub fn validator(mut self, validator: impl BeanDeploymentValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Fails when a configured glob pattern is invalid.
    pub fn build(self) -> Result<BeanProcessor, ConfigError> {
        let unremovable = self.config.unremovable_matcher()?;
        let selected_alternatives = self.config.selected_alternatives_matcher()?;
        Ok(BeanProcessor {
            index: self.index,
            config: self.config,
            synthetic: self.synthetic,
            validators: self.validators,
            unremovable,
            selected_alternatives,
        })
    }
}

pub struct BeanProcessor {
    index: Arc<dyn ClassIndex>,
    config: CdiConfig,
    synthetic: Vec<SyntheticBean>,
    validators: Vec<Box<dyn BeanDeploymentValidator>>,
    unremovable: GlobSet,
    selected_alternatives: GlobSet,
}

/// Result of a successful [`BeanProcessor::process`].
#[derive(Debug)]
pub struct ProcessorOutput {
    pub deployment: BeanDeployment,
    /// Components in emission order.
    pub components: Vec<ComponentDescription>,
    pub transformations: Vec<Transformation>,
    pub diagnostics: Vec<Diagnostic>,
    generation_threads: usize,
}

#[derive(Default)]
struct Interception {
    intercepted: HashMap<BeanId, IndexMap<MethodKey, InterceptedMethod>>,
    bound_interceptors: HashMap<BeanId, Vec<BeanId>>,
    problems: Vec<DeploymentProblem>,
    transformations: Vec<Transformation>,
    diagnostics: Vec<Diagnostic>,
}

impl BeanProcessor {
    /// `index` holds the application classes; platform classes are added automatically.
    pub fn builder(index: impl ClassIndex + 'static) -> BeanProcessorBuilder {
        BeanProcessorBuilder {
            index: Arc::new(index),
            config: CdiConfig::default(),
            synthetic: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn config(&self) -> &CdiConfig {
        &self.config
    }

    pub fn process(&self) -> Result<ProcessorOutput, DeploymentError> {
        let index: Arc<dyn ClassIndex> = Arc::new(CompositeIndex::new(
            Arc::clone(&self.index),
            Arc::new(JdkIndex::new()),
        ));

        let (qualifiers, mut problems) = QualifierRegistry::new(&*index);
        let scopes = Scopes::new(&*index);
        let (bindings, binding_problems) = InterceptorBindings::new(&*index);
        problems.extend(binding_problems);

        let bean_defining = self
            .config
            .additional_bean_defining_annotations
            .iter()
            .map(|name| DotName::new(name));
        let discovered = BeanDiscovery::new(
            &*index,
            &qualifiers,
            &scopes,
            &bindings,
            bean_defining,
            &self.selected_alternatives,
        )
        .discover(&self.synthetic);
        problems.extend(discovered.problems);
        DeploymentError::check(problems)?;

        let mut diagnostics = discovered.diagnostics;
        let mut deployment = BeanDeployment {
            index,
            beans: discovered.beans,
            observers: discovered.observers,
            injection_points: discovered.injection_points,
            qualifiers,
            scopes,
            interceptor_bindings: bindings,
            intercepted: HashMap::new(),
            bound_interceptors: HashMap::new(),
            removed: BTreeSet::new(),
        };

        let interception = self.intercept(&deployment);
        deployment.intercepted = interception.intercepted;
        deployment.bound_interceptors = interception.bound_interceptors;
        let mut problems = interception.problems;
        let mut transformations = interception.transformations;
        diagnostics.extend(interception.diagnostics);

        let looked_up = {
            let resolver = deployment.resolver();
            let report = resolve_injection_points(&resolver, deployment.injection_points());
            problems.extend(report.problems);
            diagnostics.extend(report.diagnostics);

            let validation = validate(&deployment, &resolver, self.config.transform_unproxyable_classes);
            problems.extend(validation.problems);
            transformations.extend(validation.transformations);
            for validator in &self.validators {
                validator.validate(&deployment, &mut problems);
            }
            report.looked_up
        };
        DeploymentError::check(problems)?;

        if self.config.remove_unused_beans {
            let (removed, removal_diagnostics) = find_unused_beans(&deployment, &self.unremovable, &looked_up);
            tracing::debug!(target: "nova.cdi", removed = removed.len(), "removed unused beans");
            deployment.removed = removed;
            diagnostics.extend(removal_diagnostics);
        }

        let order = order_beans(&deployment)?;
        let components = describe(&deployment, &order);
        tracing::info!(
            target: "nova.cdi",
            components = components.len(),
            transformations = transformations.len(),
            diagnostics = diagnostics.len(),
            "bean deployment processed"
        );
        Ok(ProcessorOutput {
            deployment,
            components,
            transformations,
            diagnostics,
            generation_threads: self.config.generation_threads,
        })
    }

    fn intercept(&self, deployment: &BeanDeployment) -> Interception {
        let options = InterceptionOptions {
            transform_final_methods: self.config.transform_unproxyable_classes,
            fail_on_intercepted_private_method: self.config.fail_on_intercepted_private_method,
        };
        let resolver = InterceptorResolver::new(deployment.interceptor_bindings(), deployment.interceptors());
        let mut out = Interception::default();

        for bean in deployment.beans().filter(|bean| bean.is_class_bean()) {
            let Some(class) = deployment.index().class_by_name(bean.bean_class) else {
                continue;
            };
            let candidates = intercepted_method_candidates(
                deployment.index(),
                deployment.interceptor_bindings(),
                &class,
                &bean.interceptor_bindings,
                options,
            );
            out.problems.extend(candidates.problems);
            out.diagnostics.extend(candidates.diagnostics);

            let mut bound = Vec::new();
            let methods: IndexMap<MethodKey, InterceptedMethod> = candidates
                .methods
                .into_iter()
                .filter_map(|(key, mut method)| {
                    method.interceptors = resolver.resolve(&method.bindings);
                    if method.interceptors.is_empty() {
                        return None;
                    }
                    bound.extend(method.interceptors.iter().copied());
                    Some((key, method))
                })
                .collect();
            out.transformations.extend(candidates.transformations.into_iter().filter(|t| match t {
                Transformation::FinalMethodRemoval { method, .. } => methods.contains_key(method),
                Transformation::FinalClassRemoval { .. } => true,
            }));
            if methods.is_empty() {
                continue;
            }
            resolver.sort(&mut bound);
            tracing::debug!(
                target: "nova.cdi.interception",
                bean = %bean.bean_class,
                methods = methods.len(),
                interceptors = bound.len(),
                "bean is intercepted"
            );
            out.intercepted.insert(bean.id, methods);
            out.bound_interceptors.insert(bean.id, bound);
        }
        out
    }
}

impl ProcessorOutput {
    /// Emit every component. Results keep component order whether or not generation runs
    /// on a thread pool.
    pub fn generate(&self, generator: &dyn CodeGenerator) -> Result<Vec<GeneratedClass>, GenerationError> {
        if self.generation_threads == 0 {
            return self.generate_inline(generator);
        }
        match build_generation_pool(self.generation_threads) {
            Some(pool) => pool.install(|| {
                self.components
                    .par_iter()
                    .map(|component| generator.generate(component))
                    .collect()
            }),
            None => self.generate_inline(generator),
        }
    }

    fn generate_inline(&self, generator: &dyn CodeGenerator) -> Result<Vec<GeneratedClass>, GenerationError> {
        self.components
            .iter()
            .map(|component| generator.generate(component))
            .collect()
    }
}

fn build_generation_pool(threads: usize) -> Option<rayon::ThreadPool> {
    // Thread creation can fail under low process limits; retry smaller, then give up and
    // generate inline.
    let mut threads = threads.max(1);
    loop {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("nova-cdi-gen-{idx}"))
            .build()
        {
            Ok(pool) => return Some(pool),
            Err(err) if threads > 1 => {
                tracing::debug!(target: "nova.cdi", threads, error = %err, "shrinking generation pool");
                threads = (threads / 2).max(1);
            }
            Err(err) => {
                tracing::warn!(target: "nova.cdi", error = %err, "generating inline");
                return None;
            }
        }
    }
}
