//! Well-known qualified names used by the CDI processor.
//!
//! Each entry is a lazily interned [`DotName`]; dereference to use it (`*names::OBJECT`).

use std::sync::LazyLock;

use crate::DotName;

macro_rules! well_known {
    ($($(#[$meta:meta])* $ident:ident = $name:literal;)*) => {
        $(
            $(#[$meta])*
            pub static $ident: LazyLock<DotName> = LazyLock::new(|| DotName::new($name));
        )*
    };
}

well_known! {
    OBJECT = "java.lang.Object";
    STRING = "java.lang.String";
    NUMBER = "java.lang.Number";
    ENUM = "java.lang.Enum";
    CLASS = "java.lang.Class";
    ANNOTATION = "java.lang.annotation.Annotation";
    INHERITED = "java.lang.annotation.Inherited";

    BOOLEAN = "java.lang.Boolean";
    BYTE = "java.lang.Byte";
    SHORT = "java.lang.Short";
    INTEGER = "java.lang.Integer";
    LONG = "java.lang.Long";
    CHARACTER = "java.lang.Character";
    FLOAT = "java.lang.Float";
    DOUBLE = "java.lang.Double";

    INJECT = "jakarta.inject.Inject";
    NAMED = "jakarta.inject.Named";
    QUALIFIER = "jakarta.inject.Qualifier";
    SINGLETON = "jakarta.inject.Singleton";
    SCOPE = "jakarta.inject.Scope";
    PROVIDER = "jakarta.inject.Provider";

    DEFAULT = "jakarta.enterprise.inject.Default";
    ANY = "jakarta.enterprise.inject.Any";
    ALTERNATIVE = "jakarta.enterprise.inject.Alternative";
    PRODUCES = "jakarta.enterprise.inject.Produces";
    TYPED = "jakarta.enterprise.inject.Typed";
    INSTANCE = "jakarta.enterprise.inject.Instance";
    NONBINDING = "jakarta.enterprise.util.Nonbinding";
    OBSERVES = "jakarta.enterprise.event.Observes";
    OBSERVES_ASYNC = "jakarta.enterprise.event.ObservesAsync";
    EVENT = "jakarta.enterprise.event.Event";
    INJECTION_POINT = "jakarta.enterprise.inject.spi.InjectionPoint";
    BEAN_MANAGER = "jakarta.enterprise.inject.spi.BeanManager";

    APPLICATION_SCOPED = "jakarta.enterprise.context.ApplicationScoped";
    REQUEST_SCOPED = "jakarta.enterprise.context.RequestScoped";
    SESSION_SCOPED = "jakarta.enterprise.context.SessionScoped";
    DEPENDENT = "jakarta.enterprise.context.Dependent";
    NORMAL_SCOPE = "jakarta.enterprise.context.NormalScope";

    PRIORITY = "jakarta.annotation.Priority";

    INTERCEPTOR = "jakarta.interceptor.Interceptor";
    INTERCEPTOR_BINDING = "jakarta.interceptor.InterceptorBinding";
    DECORATOR = "jakarta.decorator.Decorator";
    DELEGATE = "jakarta.decorator.Delegate";

    /// Suppresses class-level interceptor bindings for a single method.
    NO_CLASS_INTERCEPTORS = "io.quarkus.arc.NoClassInterceptors";
    INJECTABLE_INSTANCE = "io.quarkus.arc.InjectableInstance";
}
