use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use smol_str::SmolStr;

use nova_core::DotName;
use nova_types::Type;

/// A constant value of an annotation member.
#[derive(Clone, Debug)]
pub enum AnnotationValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Char(char),
    Float(f32),
    Double(f64),
    String(SmolStr),
    Class(Type),
    Enum { type_name: DotName, constant: SmolStr },
    Nested(Box<AnnotationInstance>),
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            AnnotationValue::Int(value) => Some(*value),
            AnnotationValue::Short(value) => Some(i32::from(*value)),
            AnnotationValue::Byte(value) => Some(i32::from(*value)),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Type> {
        match self {
            AnnotationValue::Class(ty) => Some(ty),
            _ => None,
        }
    }

    /// Elements of an array value; a single value is treated as a one-element array,
    /// the way `@Typed(Foo.class)` and `@Typed({Foo.class})` are equivalent in source.
    pub fn as_slice(&self) -> &[AnnotationValue] {
        match self {
            AnnotationValue::Array(values) => values,
            single => std::slice::from_ref(single),
        }
    }
}

// Floats compare by bit pattern so values can be used as map keys.
impl PartialEq for AnnotationValue {
    fn eq(&self, other: &Self) -> bool {
        use AnnotationValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (Class(a), Class(b)) => a == b,
            (
                Enum {
                    type_name: ta,
                    constant: ca,
                },
                Enum {
                    type_name: tb,
                    constant: cb,
                },
            ) => ta == tb && ca == cb,
            (Nested(a), Nested(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AnnotationValue {}

impl Hash for AnnotationValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AnnotationValue::Boolean(v) => v.hash(state),
            AnnotationValue::Byte(v) => v.hash(state),
            AnnotationValue::Short(v) => v.hash(state),
            AnnotationValue::Int(v) => v.hash(state),
            AnnotationValue::Long(v) => v.hash(state),
            AnnotationValue::Char(v) => v.hash(state),
            AnnotationValue::Float(v) => v.to_bits().hash(state),
            AnnotationValue::Double(v) => v.to_bits().hash(state),
            AnnotationValue::String(v) => v.hash(state),
            AnnotationValue::Class(v) => v.hash(state),
            AnnotationValue::Enum {
                type_name,
                constant,
            } => {
                type_name.hash(state);
                constant.hash(state);
            }
            AnnotationValue::Nested(v) => v.hash(state),
            AnnotationValue::Array(v) => v.hash(state),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.into())
    }
}

impl From<i32> for AnnotationValue {
    fn from(value: i32) -> Self {
        AnnotationValue::Int(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Long(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Boolean(value)
    }
}

impl From<Type> for AnnotationValue {
    fn from(value: Type) -> Self {
        AnnotationValue::Class(value)
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Boolean(v) => write!(f, "{v}"),
            AnnotationValue::Byte(v) => write!(f, "{v}"),
            AnnotationValue::Short(v) => write!(f, "{v}"),
            AnnotationValue::Int(v) => write!(f, "{v}"),
            AnnotationValue::Long(v) => write!(f, "{v}L"),
            AnnotationValue::Char(v) => write!(f, "'{v}'"),
            AnnotationValue::Float(v) => write!(f, "{v}f"),
            AnnotationValue::Double(v) => write!(f, "{v}"),
            AnnotationValue::String(v) => write!(f, "\"{v}\""),
            AnnotationValue::Class(ty) => write!(f, "{ty}.class"),
            AnnotationValue::Enum {
                type_name,
                constant,
            } => write!(f, "{}.{constant}", type_name.simple_name()),
            AnnotationValue::Nested(nested) => write!(f, "{nested}"),
            AnnotationValue::Array(values) => {
                f.write_str("{")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// An annotation usage (`@Named("foo")`).
///
/// Members are kept in a sorted map, so two instances written with members in a
/// different order compare equal. Only explicitly written members are stored; default
/// values live on the annotation class (see [`crate::MethodInfo::default_value`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnnotationInstance {
    pub name: DotName,
    pub values: BTreeMap<SmolStr, AnnotationValue>,
}

impl AnnotationInstance {
    pub fn new(name: impl Into<DotName>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, member: &str, value: impl Into<AnnotationValue>) -> Self {
        self.values.insert(member.into(), value.into());
        self
    }

    pub fn value(&self, member: &str) -> Option<&AnnotationValue> {
        self.values.get(member)
    }
}

impl fmt::Display for AnnotationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if self.values.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (idx, (member, value)) in self.values.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{member}={value}")?;
        }
        f.write_str(")")
    }
}
