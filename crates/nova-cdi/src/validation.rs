//! Deployment validation run after injection points are resolved.

use std::collections::BTreeMap;

use crate::bean::BeanId;
use crate::builtin::BuiltinBean;
use crate::deployment::BeanDeployment;
use crate::error::DeploymentProblem;
use crate::injection::InjectionOwner;
use crate::interception::Transformation;
use crate::resolver::BeanResolver;

/// Additional checks supplied by the caller. Problems are reported together with the
/// built-in validation problems.
pub trait BeanDeploymentValidator: Send + Sync {
    fn validate(&self, deployment: &BeanDeployment, problems: &mut Vec<DeploymentProblem>);
}

impl<F> BeanDeploymentValidator for F
where
    F: Fn(&BeanDeployment, &mut Vec<DeploymentProblem>) + Send + Sync,
{
    fn validate(&self, deployment: &BeanDeployment, problems: &mut Vec<DeploymentProblem>) {
        self(deployment, problems)
    }
}

#[derive(Debug, Default)]
pub struct Validation {
    pub problems: Vec<DeploymentProblem>,
    pub transformations: Vec<Transformation>,
}

pub fn validate(
    deployment: &BeanDeployment,
    resolver: &BeanResolver<'_>,
    transform_unproxyable_classes: bool,
) -> Validation {
    let mut out = Validation::default();
    validate_proxyable(deployment, transform_unproxyable_classes, &mut out);
    validate_names(deployment, resolver, &mut out.problems);
    validate_injection_point_metadata(deployment, &mut out.problems);
    out
}

fn validate_proxyable(deployment: &BeanDeployment, transform: bool, out: &mut Validation) {
    for bean in deployment.beans().filter(|bean| bean.is_class_bean()) {
        let intercepted = !deployment.bound_interceptors(bean.id).is_empty();
        if !bean.is_normal_scoped() && !intercepted {
            continue;
        }
        let Some(class) = deployment.index().class_by_name(bean.bean_class) else {
            continue;
        };
        if class.is_final() {
            if transform {
                out.transformations
                    .push(Transformation::FinalClassRemoval { class: class.name });
            } else {
                let message = if bean.is_normal_scoped() {
                    "Normal scoped beans must not be final"
                } else {
                    "Intercepted beans must not be final"
                };
                out.problems.push(DeploymentProblem::definition(bean, message));
            }
        }
        if bean.is_normal_scoped() && class.no_args_constructor().map_or(true, |c| c.is_private()) {
            out.problems.push(DeploymentProblem::definition(
                bean,
                "Normal scoped beans must declare a non-private constructor with no parameters",
            ));
        }
    }
}

fn validate_names(deployment: &BeanDeployment, resolver: &BeanResolver<'_>, problems: &mut Vec<DeploymentProblem>) {
    let mut by_name: BTreeMap<&str, Vec<BeanId>> = BTreeMap::new();
    for bean in deployment.beans() {
        if let Some(name) = &bean.name {
            by_name.entry(name.as_str()).or_default().push(bean.id);
        }
    }
    for (name, beans) in by_name {
        if beans.len() < 2 {
            continue;
        }
        if let Err(tied) = resolver.resolve_ambiguity(&beans) {
            problems.push(DeploymentProblem::AmbiguousName {
                name: name.to_owned(),
                candidates: tied.iter().map(|id| deployment.bean(*id).to_string()).collect(),
            });
        }
    }
}

fn validate_injection_point_metadata(deployment: &BeanDeployment, problems: &mut Vec<DeploymentProblem>) {
    for ip in deployment.injection_points() {
        if ip.builtin != Some(BuiltinBean::InjectionPoint) {
            continue;
        }
        let InjectionOwner::Bean(owner) = ip.owner else {
            continue;
        };
        let bean = deployment.bean(owner);
        if !bean.scope.is_dependent() {
            problems.push(DeploymentProblem::definition(
                &ip.target,
                format!(
                    "Only @Dependent beans can access metadata about an injection point, declared by a {} bean",
                    bean.scope
                ),
            ));
        }
    }
}
