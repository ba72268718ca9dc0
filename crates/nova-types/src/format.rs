use std::fmt;

use crate::{PrimitiveType, Type, TypeVariable, WildcardBound};

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl fmt::Display for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

impl fmt::Display for WildcardBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WildcardBound::Unbounded => f.write_str("?"),
            WildcardBound::Extends(upper) => write!(f, "? extends {upper}"),
            WildcardBound::Super(lower) => write!(f, "? super {lower}"),
        }
    }
}

/// Java source-like rendering (`java.util.Map<java.lang.String, ? extends T>`).
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Primitive(p) => write!(f, "{p}"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Parameterized(p) => {
                write!(f, "{}<", p.name)?;
                for (idx, arg) in p.args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Type::Array(component) => write!(f, "{component}[]"),
            Type::TypeVar(tv) => write!(f, "{tv}"),
            Type::Wildcard(bound) => write!(f, "{bound}"),
        }
    }
}
