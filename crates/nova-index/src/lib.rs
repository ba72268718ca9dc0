//! The read-only class index consulted by the CDI processor.
//!
//! The processor never parses class files itself. It queries a [`ClassIndex`] for class
//! metadata and hierarchy relations; [`MemoryIndex`] serves tests and small deployments,
//! [`JdkIndex`] supplies platform classes and [`CompositeIndex`] layers the two.

pub mod access;
mod annotation;
mod index;
mod jdk;
mod model;

pub use annotation::{AnnotationInstance, AnnotationValue};
pub use index::{ClassIndex, CompositeIndex, MemoryIndex};
pub use jdk::JdkIndex;
pub use model::{ClassInfo, ClassKind, FieldInfo, MethodInfo};
