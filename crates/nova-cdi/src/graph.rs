//! Emission order of generated components.
//!
//! A bean must be emitted after every bean it holds a direct reference to. Normal-scoped
//! beans are reached through a client proxy, so a cycle passing through one of them can be
//! broken; a cycle of pseudo-scoped beans cannot.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::bean::BeanId;
use crate::deployment::BeanDeployment;
use crate::error::DeploymentProblem;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeTraits {
    pub normal_scoped: bool,
    pub producer: bool,
}

/// Which beans a pass may emit, from strictest to most relaxed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterLevel {
    /// Beans with no pending dependencies.
    Ready,
    /// Also normal-scoped beans that are not producers.
    NormalScopedExceptProducers,
    /// Also any normal-scoped bean.
    NormalScoped,
}

impl FilterLevel {
    fn relaxed(self) -> Option<FilterLevel> {
        match self {
            FilterLevel::Ready => Some(FilterLevel::NormalScopedExceptProducers),
            FilterLevel::NormalScopedExceptProducers => Some(FilterLevel::NormalScoped),
            FilterLevel::NormalScoped => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// This many beans were emitted; the next pass starts over at [`FilterLevel::Ready`].
    Progress(usize),
    /// Nothing qualified; the next pass uses a more relaxed filter.
    Escalated(FilterLevel),
    /// Nothing qualified even under the most relaxed filter.
    Stuck,
    Done,
}

/// Fixed-point ordering over a map of `dependency → dependents`.
#[derive(Debug)]
pub struct DependencyOrder {
    dependents: IndexMap<BeanId, Vec<BeanId>>,
    traits: HashMap<BeanId, NodeTraits>,
    level: FilterLevel,
    emitted: Vec<BeanId>,
}

impl DependencyOrder {
    pub fn new(dependents: IndexMap<BeanId, Vec<BeanId>>, traits: HashMap<BeanId, NodeTraits>) -> Self {
        Self {
            dependents,
            traits,
            level: FilterLevel::Ready,
            emitted: Vec::new(),
        }
    }

    pub fn level(&self) -> FilterLevel {
        self.level
    }

    pub fn emitted(&self) -> &[BeanId] {
        &self.emitted
    }

    /// Beans not yet emitted, with the beans they are injected into.
    pub fn remaining(&self) -> impl Iterator<Item = (&BeanId, &Vec<BeanId>)> {
        self.dependents.iter()
    }

    /// Returns `true` while `bean` still depends on a bean that has not been emitted.
    fn has_pending_dependencies(&self, bean: BeanId) -> bool {
        self.dependents.values().any(|dependents| dependents.contains(&bean))
    }

    fn qualifies(&self, bean: BeanId) -> bool {
        let traits = self.traits.get(&bean).copied().unwrap_or_default();
        match self.level {
            FilterLevel::Ready => !self.has_pending_dependencies(bean),
            FilterLevel::NormalScopedExceptProducers => {
                !traits.producer && (traits.normal_scoped || !self.has_pending_dependencies(bean))
            }
            FilterLevel::NormalScoped => traits.normal_scoped || !self.has_pending_dependencies(bean),
        }
    }

    /// One pass over the remaining beans. Each emission is visible to the rest of the pass.
    pub fn step(&mut self) -> Step {
        if self.dependents.is_empty() {
            return Step::Done;
        }
        let mut emitted = 0;
        let mut idx = 0;
        while idx < self.dependents.len() {
            let Some((&bean, _)) = self.dependents.get_index(idx) else {
                break;
            };
            if self.qualifies(bean) {
                self.dependents.shift_remove_index(idx);
                self.emitted.push(bean);
                emitted += 1;
            } else {
                idx += 1;
            }
        }
        if emitted > 0 {
            self.level = FilterLevel::Ready;
            return Step::Progress(emitted);
        }
        match self.level.relaxed() {
            Some(level) => {
                self.level = level;
                Step::Escalated(level)
            }
            None => Step::Stuck,
        }
    }

    /// Run to completion. `Err` carries the beans that could not be ordered.
    pub fn run(mut self) -> Result<Vec<BeanId>, Vec<(BeanId, Vec<BeanId>)>> {
        loop {
            match self.step() {
                Step::Done => return Ok(self.emitted),
                Step::Stuck => return Err(self.dependents.into_iter().collect()),
                Step::Progress(_) | Step::Escalated(_) => {}
            }
        }
    }
}

/// `dependency → dependents` for every bean and interceptor still in the deployment.
///
/// Edges come from resolved injection points, producer declaring beans and bound
/// interceptors. Built-in beans and observers do not take part.
pub fn dependency_map(deployment: &BeanDeployment) -> IndexMap<BeanId, Vec<BeanId>> {
    let mut map: IndexMap<BeanId, Vec<BeanId>> = IndexMap::new();
    let mut add = |dependency: BeanId, dependent: BeanId| {
        let dependents = map.entry(dependency).or_default();
        if !dependents.contains(&dependent) {
            dependents.push(dependent);
        }
    };
    for bean in deployment.beans().chain(deployment.interceptors()) {
        for ip in deployment.bean_injection_points(bean) {
            if let Some(resolved) = ip.resolved_bean() {
                add(resolved, bean.id);
            }
        }
        if let Some(declaring) = bean.declaring_bean {
            add(declaring, bean.id);
        }
        for interceptor in deployment.bound_interceptors(bean.id) {
            add(*interceptor, bean.id);
        }
    }
    map
}

/// Beans and interceptors in emission order: ordered dependencies first, then the
/// remaining beans, then the remaining interceptors.
pub fn order_beans(deployment: &BeanDeployment) -> Result<Vec<BeanId>, DeploymentProblem> {
    let dependents = dependency_map(deployment);
    let traits = dependents
        .keys()
        .map(|id| {
            let bean = deployment.bean(*id);
            let traits = NodeTraits {
                normal_scoped: bean.is_normal_scoped(),
                producer: bean.is_producer(),
            };
            (*id, traits)
        })
        .collect();

    let mut ordered = DependencyOrder::new(dependents, traits).run().map_err(|remaining| {
        DeploymentProblem::CircularDependency {
            remaining: remaining
                .into_iter()
                .map(|(bean, dependents)| {
                    (
                        deployment.bean(bean).to_string(),
                        dependents
                            .iter()
                            .map(|d| deployment.bean(*d).to_string())
                            .collect(),
                    )
                })
                .collect(),
        }
    })?;

    let emitted: std::collections::HashSet<BeanId> = ordered.iter().copied().collect();
    let rest: Vec<BeanId> = deployment
        .beans()
        .chain(deployment.interceptors())
        .map(|bean| bean.id)
        .filter(|id| !emitted.contains(id))
        .collect();
    ordered.extend(rest);
    tracing::debug!(target: "nova.cdi", beans = ordered.len(), "ordered components");
    Ok(ordered)
}
