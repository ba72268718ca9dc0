//! Semantic type references for Nova's CDI processor.
//!
//! A [`Type`] is an immutable value describing a Java type as it appears in a class
//! signature: a primitive, a raw class, a parameterized class, an array, a type variable
//! or a wildcard. Types carry names ([`DotName`]) rather than class ids: the class index
//! is consulted separately when hierarchy information is needed.

mod format;
mod subst;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use nova_core::{names, DotName};

pub use subst::{substitute, type_arguments_map, TypeArguments};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Char => "char",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => PrimitiveType::Boolean,
            "byte" => PrimitiveType::Byte,
            "short" => PrimitiveType::Short,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "char" => PrimitiveType::Char,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            _ => return None,
        })
    }

    /// JVM descriptor character (`I` for `int`).
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveType::Boolean => 'Z',
            PrimitiveType::Byte => 'B',
            PrimitiveType::Short => 'S',
            PrimitiveType::Int => 'I',
            PrimitiveType::Long => 'J',
            PrimitiveType::Char => 'C',
            PrimitiveType::Float => 'F',
            PrimitiveType::Double => 'D',
        }
    }

    pub fn wrapper(self) -> DotName {
        let wrapper = match self {
            PrimitiveType::Boolean => &names::BOOLEAN,
            PrimitiveType::Byte => &names::BYTE,
            PrimitiveType::Short => &names::SHORT,
            PrimitiveType::Int => &names::INTEGER,
            PrimitiveType::Long => &names::LONG,
            PrimitiveType::Char => &names::CHARACTER,
            PrimitiveType::Float => &names::FLOAT,
            PrimitiveType::Double => &names::DOUBLE,
        };
        **wrapper
    }
}

/// A generic class applied to type arguments (`List<String>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterizedType {
    pub name: DotName,
    pub args: Vec<Type>,
}

/// A type variable reference together with its declared bounds.
///
/// An empty bound list means the implicit `java.lang.Object` bound.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeVariable {
    pub identifier: SmolStr,
    pub bounds: Vec<Type>,
}

impl TypeVariable {
    pub fn new(identifier: impl Into<SmolStr>, bounds: Vec<Type>) -> Self {
        Self {
            identifier: identifier.into(),
            bounds,
        }
    }

    /// Declared bounds, or `[Object]` when none were declared.
    pub fn bounds_or_object(&self) -> Vec<Type> {
        if self.bounds.is_empty() {
            vec![Type::object()]
        } else {
            self.bounds.clone()
        }
    }

    /// Returns `true` when the variable declares no bound other than `Object`.
    pub fn is_unbounded(&self) -> bool {
        self.bounds.iter().all(Type::is_object)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

impl WildcardBound {
    /// The upper bound of the wildcard (`Object` for `?` and `? super X`).
    pub fn extends_bound(&self) -> Type {
        match self {
            WildcardBound::Extends(upper) => (**upper).clone(),
            WildcardBound::Unbounded | WildcardBound::Super(_) => Type::object(),
        }
    }

    pub fn super_bound(&self) -> Option<&Type> {
        match self {
            WildcardBound::Super(lower) => Some(lower),
            WildcardBound::Unbounded | WildcardBound::Extends(_) => None,
        }
    }

    /// `?` and `? extends Object` impose no constraint.
    pub fn is_unbounded(&self) -> bool {
        match self {
            WildcardBound::Unbounded => true,
            WildcardBound::Extends(upper) => upper.is_object(),
            WildcardBound::Super(_) => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Class(DotName),
    Parameterized(ParameterizedType),
    Array(Box<Type>),
    TypeVar(TypeVariable),
    Wildcard(WildcardBound),
}

impl Type {
    pub fn class(name: impl Into<DotName>) -> Type {
        Type::Class(name.into())
    }

    pub fn object() -> Type {
        Type::Class(*names::OBJECT)
    }

    pub fn parameterized(name: impl Into<DotName>, args: Vec<Type>) -> Type {
        Type::Parameterized(ParameterizedType {
            name: name.into(),
            args,
        })
    }

    pub fn array(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    pub fn type_var(identifier: &str, bounds: Vec<Type>) -> Type {
        Type::TypeVar(TypeVariable::new(identifier, bounds))
    }

    pub fn wildcard() -> Type {
        Type::Wildcard(WildcardBound::Unbounded)
    }

    pub fn wildcard_extends(upper: Type) -> Type {
        Type::Wildcard(WildcardBound::Extends(Box::new(upper)))
    }

    pub fn wildcard_super(lower: Type) -> Type {
        Type::Wildcard(WildcardBound::Super(Box::new(lower)))
    }

    pub fn primitive(keyword: &str) -> Option<Type> {
        PrimitiveType::from_keyword(keyword).map(Type::Primitive)
    }

    /// The erasure name of this type.
    ///
    /// Arrays use the JVM descriptor form (`[Ljava.lang.String;`), type variables and
    /// wildcards use the name of their (first) upper bound.
    pub fn name(&self) -> DotName {
        match self {
            Type::Void => DotName::new("void"),
            Type::Primitive(p) => DotName::new(p.keyword()),
            Type::Class(name) => *name,
            Type::Parameterized(p) => p.name,
            Type::Array(_) => DotName::new(&self.descriptor()),
            Type::TypeVar(tv) => tv.bounds.first().map(Type::name).unwrap_or(*names::OBJECT),
            Type::Wildcard(bound) => bound.extends_bound().name(),
        }
    }

    /// JVM-style descriptor with dots (`Ljava.lang.String;`, `[I`).
    pub fn descriptor(&self) -> String {
        match self {
            Type::Void => "V".to_string(),
            Type::Primitive(p) => p.descriptor().to_string(),
            Type::Array(component) => format!("[{}", component.descriptor()),
            other => format!("L{};", other.name()),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Class(name) if *name == *names::OBJECT)
    }

    /// "Actual types" in the CDI sense: anything that is neither a type variable nor a wildcard.
    pub fn is_actual_type(&self) -> bool {
        matches!(
            self,
            Type::Class(_) | Type::Parameterized(_) | Type::Array(_) | Type::Primitive(_)
        )
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Promote primitives to their wrapper class; every other type is returned unchanged.
    pub fn boxed(&self) -> Type {
        match self {
            Type::Primitive(p) => Type::Class(p.wrapper()),
            other => other.clone(),
        }
    }

    pub fn erasure(&self) -> Type {
        match self {
            Type::Parameterized(p) => Type::Class(p.name),
            Type::Array(component) => Type::array(component.erasure()),
            Type::TypeVar(_) | Type::Wildcard(_) => Type::Class(self.name()),
            other => other.clone(),
        }
    }

    /// Type arguments of a parameterized type, empty for anything else.
    pub fn arguments(&self) -> &[Type] {
        match self {
            Type::Parameterized(p) => &p.args,
            _ => &[],
        }
    }

    pub fn as_type_var(&self) -> Option<&TypeVariable> {
        match self {
            Type::TypeVar(tv) => Some(tv),
            _ => None,
        }
    }

    pub fn as_wildcard(&self) -> Option<&WildcardBound> {
        match self {
            Type::Wildcard(bound) => Some(bound),
            _ => None,
        }
    }

    /// Array nesting depth (`int[][]` → 2).
    pub fn dimensions(&self) -> usize {
        match self {
            Type::Array(component) => 1 + component.dimensions(),
            _ => 0,
        }
    }

    /// Returns `true` when this type mentions a type variable anywhere.
    pub fn contains_type_variable(&self) -> bool {
        match self {
            Type::TypeVar(_) => true,
            Type::Parameterized(p) => p.args.iter().any(Type::contains_type_variable),
            Type::Array(component) => component.contains_type_variable(),
            Type::Wildcard(WildcardBound::Extends(t)) | Type::Wildcard(WildcardBound::Super(t)) => {
                t.contains_type_variable()
            }
            _ => false,
        }
    }
}

impl From<DotName> for Type {
    fn from(name: DotName) -> Self {
        Type::Class(name)
    }
}
