use std::fmt;

use serde::Serialize;
use thiserror::Error;

use nova_core::DotName;
use nova_types::Type;

pub const CDI_UNSATISFIED_CODE: &str = "CDI_UNSATISFIED_DEPENDENCY";
pub const CDI_AMBIGUOUS_CODE: &str = "CDI_AMBIGUOUS_DEPENDENCY";
pub const CDI_CIRCULAR_CODE: &str = "CDI_CIRCULAR_DEPENDENCY";
pub const CDI_INVALID_MEMBER_TYPE_CODE: &str = "CDI_INVALID_MEMBER_TYPE";
pub const CDI_DEFINITION_CODE: &str = "CDI_DEFINITION_ERROR";
pub const CDI_AMBIGUOUS_NAME_CODE: &str = "CDI_AMBIGUOUS_BEAN_NAME";
pub const CDI_INTERCEPTED_PRIVATE_METHOD_CODE: &str = "CDI_INTERCEPTED_PRIVATE_METHOD";
pub const CDI_VALIDATOR_CODE: &str = "CDI_VALIDATOR_PROBLEM";
pub const CDI_FINAL_METHOD_CODE: &str = "CDI_FINAL_METHOD_NOT_INTERCEPTED";
pub const CDI_INTERCEPTOR_PRIORITY_CODE: &str = "CDI_INTERCEPTOR_WITHOUT_PRIORITY";
pub const CDI_LOOKUP_CODE: &str = "CDI_UNSATISFIED_PROGRAMMATIC_LOOKUP";
pub const CDI_DISABLED_ALTERNATIVE_CODE: &str = "CDI_DISABLED_ALTERNATIVE";
pub const CDI_UNUSED_BEAN_CODE: &str = "CDI_UNUSED_BEAN_REMOVED";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A structured message surfaced to the invoking build tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
        }
    }
}

/// One problem found while building a deployment.
///
/// Problems of one phase are collected into a [`DeploymentError`] instead of aborting on the
/// first one, so a single build reports every dependency problem at once.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeploymentProblem {
    #[error(
        "Unsatisfied dependency for type {required_type} and qualifiers {qualifiers}\n\t- injection target: {target}"
    )]
    Unsatisfied {
        required_type: Type,
        qualifiers: String,
        target: String,
    },
    #[error(
        "Ambiguous dependencies for type {required_type} and qualifiers {qualifiers}\n\t- injection target: {target}\n\t- available beans:\n\t\t- {}",
        .candidates.join("\n\t\t- ")
    )]
    Ambiguous {
        required_type: Type,
        qualifiers: String,
        target: String,
        candidates: Vec<String>,
    },
    #[error("Circular dependencies not supported:\n{}", format_cycle(.remaining))]
    CircularDependency {
        /// Each bean that could not be ordered, with the beans it is injected into.
        remaining: Vec<(String, Vec<String>)>,
    },
    #[error("Invalid type of annotation member {annotation}#{member}(): {member_type}")]
    InvalidMemberType {
        annotation: DotName,
        member: String,
        member_type: Type,
    },
    #[error("{message}: {target}")]
    Definition { target: String, message: String },
    #[error("Ambiguous beans for name `{name}`:\n\t- {}", .candidates.join("\n\t- "))]
    AmbiguousName {
        name: String,
        candidates: Vec<String>,
    },
    #[error("{bindings} will have no effect on method {method} because the method is private")]
    InterceptedPrivateMethod { method: String, bindings: String },
    #[error("{message}")]
    Validator { message: String },
}

fn format_cycle(remaining: &[(String, Vec<String>)]) -> String {
    remaining
        .iter()
        .map(|(bean, dependents)| format!("\t- {bean} injected into: {}", dependents.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

impl DeploymentProblem {
    pub fn definition(target: impl fmt::Display, message: impl Into<String>) -> Self {
        DeploymentProblem::Definition {
            target: target.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DeploymentProblem::Unsatisfied { .. } => CDI_UNSATISFIED_CODE,
            DeploymentProblem::Ambiguous { .. } => CDI_AMBIGUOUS_CODE,
            DeploymentProblem::CircularDependency { .. } => CDI_CIRCULAR_CODE,
            DeploymentProblem::InvalidMemberType { .. } => CDI_INVALID_MEMBER_TYPE_CODE,
            DeploymentProblem::Definition { .. } => CDI_DEFINITION_CODE,
            DeploymentProblem::AmbiguousName { .. } => CDI_AMBIGUOUS_NAME_CODE,
            DeploymentProblem::InterceptedPrivateMethod { .. } => {
                CDI_INTERCEPTED_PRIVATE_METHOD_CODE
            }
            DeploymentProblem::Validator { .. } => CDI_VALIDATOR_CODE,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), self.to_string())
    }
}

/// All problems of one processing phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentError {
    pub problems: Vec<DeploymentProblem>,
}

impl DeploymentError {
    pub fn new(problems: Vec<DeploymentProblem>) -> Self {
        Self { problems }
    }

    /// `Err` when `problems` is non-empty.
    pub fn check(problems: Vec<DeploymentProblem>) -> Result<(), DeploymentError> {
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DeploymentError::new(problems))
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.problems.iter().map(DeploymentProblem::to_diagnostic).collect()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.problems.iter().any(|p| p.code() == code)
    }
}

impl From<DeploymentProblem> for DeploymentError {
    fn from(problem: DeploymentProblem) -> Self {
        DeploymentError::new(vec![problem])
    }
}

impl fmt::Display for DeploymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problems.as_slice() {
            [] => f.write_str("no deployment problems"),
            [single] => write!(f, "{single}"),
            problems => {
                write!(f, "Found {} deployment problems: ", problems.len())?;
                for (idx, problem) in problems.iter().enumerate() {
                    write!(f, "\n[{}] {problem}", idx + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for DeploymentError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_problem_displays_as_itself() {
        let err = DeploymentError::from(DeploymentProblem::Validator {
            message: "nope".into(),
        });
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn multiple_problems_are_numbered() {
        let err = DeploymentError::new(vec![
            DeploymentProblem::Validator {
                message: "first".into(),
            },
            DeploymentProblem::definition("com.acme.Foo", "Normal scoped beans must not be final"),
        ]);
        assert_eq!(
            err.to_string(),
            "Found 2 deployment problems: \n[1] first\n[2] Normal scoped beans must not be final: com.acme.Foo"
        );
        assert!(err.has_code(CDI_DEFINITION_CODE));
    }

    #[test]
    fn circular_report_lists_dependents() {
        let problem = DeploymentProblem::CircularDependency {
            remaining: vec![
                ("A".into(), vec!["C".into()]),
                ("B".into(), vec!["A".into()]),
            ],
        };
        assert_eq!(
            problem.to_string(),
            "Circular dependencies not supported:\n\t- A injected into: C\n\t- B injected into: A"
        );
    }
}
