//! Beans supplied by the container itself.

use std::fmt;

use nova_core::names;
use nova_types::Type;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinBean {
    /// `Instance<T>`, `Provider<T>` and `InjectableInstance<T>`: programmatic lookup.
    Instance,
    /// Metadata about the injection point of a `@Dependent` bean.
    InjectionPoint,
    Event,
    BeanManager,
}

impl BuiltinBean {
    /// The built-in bean serving `required`, decided on the raw type name.
    pub fn for_type(required: &Type) -> Option<Self> {
        if !matches!(required, Type::Class(_) | Type::Parameterized(_)) {
            return None;
        }
        let name = required.name();
        if name == *names::INSTANCE || name == *names::PROVIDER || name == *names::INJECTABLE_INSTANCE
        {
            Some(BuiltinBean::Instance)
        } else if name == *names::INJECTION_POINT {
            Some(BuiltinBean::InjectionPoint)
        } else if name == *names::EVENT {
            Some(BuiltinBean::Event)
        } else if name == *names::BEAN_MANAGER {
            Some(BuiltinBean::BeanManager)
        } else {
            None
        }
    }

    pub fn is_programmatic_lookup(self) -> bool {
        self == BuiltinBean::Instance
    }

    /// The type looked up through `Instance<T>`: its first type argument, or `Object` for a
    /// raw `Instance`.
    pub fn lookup_type(required: &Type) -> Type {
        required
            .arguments()
            .first()
            .cloned()
            .unwrap_or_else(Type::object)
    }
}

impl fmt::Display for BuiltinBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuiltinBean::Instance => "Instance",
            BuiltinBean::InjectionPoint => "InjectionPoint",
            BuiltinBean::Event => "Event",
            BuiltinBean::BeanManager => "BeanManager",
        };
        write!(f, "built-in {name} bean")
    }
}
