use std::fmt;
use std::sync::OnceLock;

use nova_core::DotName;
use nova_index::{AnnotationInstance, FieldInfo, MethodInfo};
use nova_types::Type;

use crate::injection::InjectionPointId;
use crate::scope::ScopeInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanId(pub(crate) u32);

impl BeanId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u32);

impl ObserverId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BeanKind {
    Class,
    ProducerMethod(MethodInfo),
    ProducerField(FieldInfo),
    Synthetic,
    Interceptor,
}

impl BeanKind {
    pub fn is_producer(&self) -> bool {
        matches!(self, BeanKind::ProducerMethod(_) | BeanKind::ProducerField(_))
    }
}

/// One discovered bean, interceptor or synthetic bean.
///
/// Created once by discovery and never modified afterwards; only the identifier is
/// computed lazily.
#[derive(Debug)]
pub struct BeanInfo {
    pub id: BeanId,
    pub kind: BeanKind,
    /// The bean class, or the declaring class for producers.
    pub bean_class: DotName,
    /// The implementation type (class beans) or the producer's declared type.
    pub provider_type: Type,
    /// Bean types, always including `java.lang.Object`.
    pub types: Vec<Type>,
    /// Qualifiers including the implicit `@Any` and, where applicable, `@Default`.
    pub qualifiers: Vec<AnnotationInstance>,
    pub scope: ScopeInfo,
    pub name: Option<String>,
    pub alternative: bool,
    /// Alternative priority, or interceptor priority.
    pub priority: Option<i32>,
    pub declaring_bean: Option<BeanId>,
    pub injection_points: Vec<InjectionPointId>,
    /// Class-level interceptor bindings (after inheritance and transitive expansion).
    pub interceptor_bindings: Vec<AnnotationInstance>,
    /// Registered programmatically rather than discovered in the index.
    pub synthetic: bool,
    identifier: OnceLock<String>,
}

impl BeanInfo {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: BeanId,
        kind: BeanKind,
        bean_class: DotName,
        provider_type: Type,
        types: Vec<Type>,
        qualifiers: Vec<AnnotationInstance>,
        scope: ScopeInfo,
    ) -> Self {
        let synthetic = matches!(kind, BeanKind::Synthetic);
        Self {
            id,
            kind,
            bean_class,
            provider_type,
            types,
            qualifiers,
            scope,
            name: None,
            alternative: false,
            priority: None,
            declaring_bean: None,
            injection_points: Vec::new(),
            interceptor_bindings: Vec::new(),
            synthetic,
            identifier: OnceLock::new(),
        }
    }

    /// A stable identifier derived from the bean's declaration.
    pub fn identifier(&self) -> &str {
        self.identifier.get_or_init(|| {
            let mut hasher = blake3::Hasher::new();
            hasher.update(self.kind_label().as_bytes());
            hasher.update(self.bean_class.as_str().as_bytes());
            if let Some(member) = self.member_name() {
                hasher.update(b"#");
                hasher.update(member.as_bytes());
            }
            if let BeanKind::ProducerMethod(method) = &self.kind {
                for param in &method.params {
                    hasher.update(param.to_string().as_bytes());
                }
            }
            for ty in &self.types {
                hasher.update(ty.to_string().as_bytes());
            }
            for qualifier in &self.qualifiers {
                hasher.update(qualifier.to_string().as_bytes());
            }
            let hash = hasher.finalize().to_hex();
            hash.as_str()[..40].to_string()
        })
    }

    fn kind_label(&self) -> &'static str {
        match self.kind {
            BeanKind::Class => "CLASS",
            BeanKind::ProducerMethod(_) => "PRODUCER_METHOD",
            BeanKind::ProducerField(_) => "PRODUCER_FIELD",
            BeanKind::Synthetic => "SYNTHETIC",
            BeanKind::Interceptor => "INTERCEPTOR",
        }
    }

    /// Producer method or field name.
    pub fn member_name(&self) -> Option<&str> {
        match &self.kind {
            BeanKind::ProducerMethod(method) => Some(method.name.as_str()),
            BeanKind::ProducerField(field) => Some(field.name.as_str()),
            _ => None,
        }
    }

    pub fn is_class_bean(&self) -> bool {
        matches!(self.kind, BeanKind::Class)
    }

    pub fn is_producer(&self) -> bool {
        self.kind.is_producer()
    }

    pub fn is_interceptor(&self) -> bool {
        matches!(self.kind, BeanKind::Interceptor)
    }

    pub fn is_normal_scoped(&self) -> bool {
        self.scope.normal
    }
}

/// `CLASS bean [types=[...], qualifiers=[...], target=com.acme.Foo]`
impl fmt::Display for BeanInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<String> = self.types.iter().map(ToString::to_string).collect();
        let qualifiers: Vec<String> = self.qualifiers.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} bean [types=[{}], qualifiers=[{}], target={}",
            self.kind_label(),
            types.join(", "),
            qualifiers.join(", "),
            self.bean_class
        )?;
        if let Some(member) = self.member_name() {
            write!(f, "#{member}")?;
        }
        f.write_str("]")
    }
}

/// An observer method.
#[derive(Debug, Clone)]
pub struct ObserverInfo {
    pub id: ObserverId,
    pub declaring_bean: BeanId,
    pub method: MethodInfo,
    pub observed_type: Type,
    pub qualifiers: Vec<AnnotationInstance>,
    pub is_async: bool,
    pub injection_points: Vec<InjectionPointId>,
}

/// A bean registered programmatically.
#[derive(Debug, Clone)]
pub struct SyntheticBean {
    pub implementation_class: DotName,
    pub types: Vec<Type>,
    pub qualifiers: Vec<AnnotationInstance>,
    pub scope: Option<DotName>,
    pub name: Option<String>,
    /// Registers the bean as an alternative with this priority.
    pub alternative_priority: Option<i32>,
}

impl SyntheticBean {
    /// A `@Dependent` synthetic bean whose only bean type is `implementation_class`.
    pub fn new(implementation_class: impl Into<DotName>) -> Self {
        let implementation_class = implementation_class.into();
        Self {
            implementation_class,
            types: vec![Type::Class(implementation_class)],
            qualifiers: Vec::new(),
            scope: None,
            name: None,
            alternative_priority: None,
        }
    }

    pub fn types(mut self, types: Vec<Type>) -> Self {
        self.types = types;
        self
    }

    pub fn qualifier(mut self, qualifier: AnnotationInstance) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn scope(mut self, scope: impl Into<DotName>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    pub fn alternative_priority(mut self, priority: i32) -> Self {
        self.alternative_priority = Some(priority);
        self
    }
}
