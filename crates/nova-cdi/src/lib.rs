//! Build-time processing of a CDI bean deployment.
//!
//! [`BeanProcessor`] discovers beans in a [`nova_index::ClassIndex`], resolves every
//! injection point with the CDI type-safe resolution rules, validates the deployment and
//! orders the generated components so that each one is emitted after the components it
//! references directly.
//!
//! ```no_run
//! use nova_cdi::BeanProcessor;
//! use nova_index::MemoryIndex;
//!
//! let processor = BeanProcessor::builder(MemoryIndex::new()).build()?;
//! let output = processor.process()?;
//! for component in &output.components {
//!     println!("{}", component.generated_name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bean;
mod builtin;
mod components;
mod deployment;
mod discovery;
mod error;
mod injection;
mod interception;
mod interceptors;
mod processor;
mod qualifiers;
mod removal;
mod resolver;
mod scope;
mod types;
mod validation;

pub mod graph;

pub use bean::{BeanId, BeanInfo, BeanKind, ObserverId, ObserverInfo, SyntheticBean};
pub use builtin::BuiltinBean;
pub use components::{
    CodeGenerator, ComponentDescription, ComponentKind, GeneratedClass, GenerationError,
};
pub use deployment::BeanDeployment;
pub use discovery::{decapitalize, property_name};
pub use error::*;
pub use injection::{
    AlreadyResolved, InjectionOwner, InjectionPoint, InjectionPointId, InjectionTarget,
    ResolvedOnce,
};
pub use interception::{
    intercepted_method_candidates, InterceptedMethod, InterceptionOptions, MethodCandidates,
    MethodKey, Transformation,
};
pub use interceptors::{InterceptorBindings, InterceptorResolver};
pub use processor::{BeanProcessor, BeanProcessorBuilder, ProcessorOutput};
pub use qualifiers::{any_qualifier, default_qualifier, named, AnnotationMeta, QualifierRegistry};
pub use resolver::BeanResolver;
pub use scope::{ScopeInfo, Scopes};
pub use validation::BeanDeploymentValidator;
