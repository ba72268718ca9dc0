//! Injection points and their resolution against the bean resolver.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use smol_str::SmolStr;
use thiserror::Error;

use nova_core::DotName;
use nova_index::AnnotationInstance;
use nova_types::Type;

use crate::bean::{BeanId, ObserverId};
use crate::builtin::BuiltinBean;
use crate::error::{DeploymentProblem, Diagnostic, CDI_LOOKUP_CODE};
use crate::qualifiers::{default_qualifier, format_qualifiers};
use crate::resolver::BeanResolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InjectionPointId(pub(crate) u32);

impl InjectionPointId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a dependency is consumed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InjectionTarget {
    Field {
        class: DotName,
        field: SmolStr,
    },
    Parameter {
        class: DotName,
        method: SmolStr,
        position: usize,
    },
}

impl fmt::Display for InjectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionTarget::Field { class, field } => write!(f, "{class}#{field}"),
            InjectionTarget::Parameter {
                class,
                method,
                position,
            } => write!(f, "{class}#{method}() parameter {position}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectionOwner {
    Bean(BeanId),
    Observer(ObserverId),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("injection point already resolved")]
pub struct AlreadyResolved;

/// A write-once slot. The first `set` wins; later writes fail.
#[derive(Debug)]
pub struct ResolvedOnce<T>(OnceLock<T>);

impl<T> ResolvedOnce<T> {
    pub fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn set(&self, value: T) -> Result<(), AlreadyResolved> {
        self.0.set(value).map_err(|_| AlreadyResolved)
    }

    pub fn get(&self) -> Option<&T> {
        self.0.get()
    }
}

impl<T> Default for ResolvedOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct InjectionPoint {
    pub id: InjectionPointId,
    pub owner: InjectionOwner,
    pub required_type: Type,
    /// Declared qualifiers; empty means `@Default`.
    pub qualifiers: Vec<AnnotationInstance>,
    pub target: InjectionTarget,
    pub transient: bool,
    pub delegate: bool,
    pub builtin: Option<BuiltinBean>,
    resolved: ResolvedOnce<BeanId>,
}

impl InjectionPoint {
    pub(crate) fn new(
        id: InjectionPointId,
        owner: InjectionOwner,
        required_type: Type,
        qualifiers: Vec<AnnotationInstance>,
        target: InjectionTarget,
    ) -> Self {
        let builtin = BuiltinBean::for_type(&required_type);
        Self {
            id,
            owner,
            required_type,
            qualifiers,
            target,
            transient: false,
            delegate: false,
            builtin,
            resolved: ResolvedOnce::new(),
        }
    }

    pub fn required_qualifiers(&self) -> Vec<AnnotationInstance> {
        if self.qualifiers.is_empty() {
            vec![default_qualifier()]
        } else {
            self.qualifiers.clone()
        }
    }

    pub fn is_programmatic_lookup(&self) -> bool {
        self.builtin.is_some_and(BuiltinBean::is_programmatic_lookup)
    }

    /// The type matched against beans: the wrapped type for `Instance<T>`.
    pub fn lookup_type(&self) -> Type {
        if self.is_programmatic_lookup() {
            BuiltinBean::lookup_type(&self.required_type)
        } else {
            self.required_type.clone()
        }
    }

    pub fn resolved_bean(&self) -> Option<BeanId> {
        self.resolved.get().copied()
    }

    pub fn resolve(&self, bean: BeanId) -> Result<(), AlreadyResolved> {
        self.resolved.set(bean)
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            format_qualifiers(&self.qualifiers),
            self.required_type,
            self.target
        )
    }
}

/// Outcome of resolving every injection point of a deployment.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub problems: Vec<DeploymentProblem>,
    pub diagnostics: Vec<Diagnostic>,
    /// Beans reachable through programmatic lookup.
    pub looked_up: BTreeSet<BeanId>,
}

/// Resolve each injection point exactly once, collecting every problem instead of
/// stopping at the first.
pub fn resolve_injection_points(
    resolver: &BeanResolver<'_>,
    injection_points: &[InjectionPoint],
) -> ResolutionReport {
    let mut report = ResolutionReport::default();
    for ip in injection_points {
        match ip.builtin {
            Some(builtin) if builtin.is_programmatic_lookup() => resolve_lookup(resolver, ip, &mut report),
            Some(_) => {}
            None => resolve_eager(resolver, ip, &mut report),
        }
    }
    tracing::debug!(
        target: "nova.cdi",
        injection_points = injection_points.len(),
        problems = report.problems.len(),
        "resolved injection points"
    );
    report
}

fn resolve_eager(resolver: &BeanResolver<'_>, ip: &InjectionPoint, report: &mut ResolutionReport) {
    let qualifiers = ip.required_qualifiers();
    let matching = resolver.resolve(&ip.required_type, &qualifiers);
    let chosen = match &*matching {
        [] => {
            report.problems.push(DeploymentProblem::Unsatisfied {
                required_type: ip.required_type.clone(),
                qualifiers: format_qualifiers(&qualifiers),
                target: ip.target.to_string(),
            });
            return;
        }
        [single] => *single,
        many => match resolver.resolve_ambiguity(many) {
            Ok(bean) => bean,
            Err(tied) => {
                report.problems.push(DeploymentProblem::Ambiguous {
                    required_type: ip.required_type.clone(),
                    qualifiers: format_qualifiers(&qualifiers),
                    target: ip.target.to_string(),
                    candidates: tied.iter().map(|id| resolver.bean(*id).to_string()).collect(),
                });
                return;
            }
        },
    };
    if ip.resolve(chosen).is_err() {
        tracing::debug!(target: "nova.cdi", injection_point = %ip, "already resolved");
    }
}

// Lookups are validated but never bound. A failed lookup is a warning diagnostic, not a
// deployment error, since the bean may still be added at runtime.
fn resolve_lookup(resolver: &BeanResolver<'_>, ip: &InjectionPoint, report: &mut ResolutionReport) {
    let lookup_type = ip.lookup_type();
    let qualifiers = ip.required_qualifiers();
    let matching = resolver.resolve(&lookup_type, &qualifiers);
    report.looked_up.extend(matching.iter().copied());

    let message = match &*matching {
        [] => format!(
            "No bean matches programmatic lookup of {lookup_type} with qualifiers {} at {}",
            format_qualifiers(&qualifiers),
            ip.target
        ),
        [_] => return,
        many => match resolver.resolve_ambiguity(many) {
            Ok(_) => return,
            Err(tied) => format!(
                "Programmatic lookup of {lookup_type} at {} is ambiguous between {} beans",
                ip.target,
                tied.len()
            ),
        },
    };
    tracing::warn!(target: "nova.cdi", "{message}");
    report.diagnostics.push(Diagnostic::warning(CDI_LOOKUP_CODE, message));
}
