use smol_str::SmolStr;

use nova_core::{names, DotName};
use nova_types::{Type, TypeVariable};

use crate::access;
use crate::annotation::{AnnotationInstance, AnnotationValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Annotation,
    Enum,
    Record,
}

/// Class metadata as recorded by the indexer.
///
/// `super_type` and `interfaces` keep their generic form (`AbstractList<E>`), which the
/// bean type closure substitutes level by level.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassInfo {
    pub name: DotName,
    pub kind: ClassKind,
    pub flags: u16,
    pub type_params: Vec<TypeVariable>,
    pub super_type: Option<Type>,
    pub interfaces: Vec<Type>,
    pub annotations: Vec<AnnotationInstance>,
    pub methods: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
}

impl ClassInfo {
    /// A public class extending `java.lang.Object`.
    pub fn class(name: impl Into<DotName>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            flags: access::PUBLIC,
            type_params: Vec::new(),
            super_type: Some(Type::object()),
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<DotName>) -> Self {
        Self {
            kind: ClassKind::Interface,
            flags: access::PUBLIC | access::INTERFACE | access::ABSTRACT,
            super_type: None,
            ..Self::class(name)
        }
    }

    pub fn annotation(name: impl Into<DotName>) -> Self {
        Self {
            kind: ClassKind::Annotation,
            flags: access::PUBLIC | access::INTERFACE | access::ABSTRACT | access::ANNOTATION,
            super_type: None,
            interfaces: vec![Type::class(*names::ANNOTATION)],
            ..Self::class(name)
        }
    }

    pub fn extends(mut self, super_type: Type) -> Self {
        self.super_type = Some(super_type);
        self
    }

    pub fn implements(mut self, interface: Type) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn type_param(mut self, param: TypeVariable) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags |= flags;
        self
    }

    pub fn method(mut self, mut method: MethodInfo) -> Self {
        method.declaring_class = self.name;
        self.methods.push(method);
        self
    }

    pub fn field(mut self, mut field: FieldInfo) -> Self {
        field.declaring_class = self.name;
        self.fields.push(field);
        self
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == ClassKind::Annotation
    }

    pub fn is_final(&self) -> bool {
        access::has(self.flags, access::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        access::has(self.flags, access::ABSTRACT)
    }

    pub fn super_name(&self) -> Option<DotName> {
        self.super_type.as_ref().map(Type::name)
    }

    pub fn interface_names(&self) -> impl Iterator<Item = DotName> + '_ {
        self.interfaces.iter().map(Type::name)
    }

    /// This class as a type: parameterized by its own type variables when generic.
    pub fn as_type(&self) -> Type {
        if self.type_params.is_empty() {
            Type::Class(self.name)
        } else {
            Type::parameterized(
                self.name,
                self.type_params.iter().cloned().map(Type::TypeVar).collect(),
            )
        }
    }

    pub fn annotation_named(&self, name: DotName) -> Option<&AnnotationInstance> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn has_annotation(&self, name: DotName) -> bool {
        self.annotation_named(name).is_some()
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// The declared no-args constructor. A class without any declared constructor has an
    /// implicit public one, reported as `Some` with a synthesized entry.
    pub fn no_args_constructor(&self) -> Option<MethodInfo> {
        let mut constructors = self.constructors().peekable();
        if constructors.peek().is_none() && !self.is_interface() {
            let mut implicit = MethodInfo::constructor(Vec::new());
            implicit.declaring_class = self.name;
            return Some(implicit);
        }
        constructors.find(|c| c.params.is_empty()).cloned()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodInfo {
    pub name: SmolStr,
    pub flags: u16,
    pub type_params: Vec<TypeVariable>,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub annotations: Vec<AnnotationInstance>,
    /// One list per parameter; shorter than `params` when trailing parameters carry none.
    pub param_annotations: Vec<Vec<AnnotationInstance>>,
    /// Default value of an annotation member.
    pub default_value: Option<AnnotationValue>,
    pub declaring_class: DotName,
}

impl MethodInfo {
    /// A public method. The declaring class is filled in by [`ClassInfo::method`].
    pub fn new(name: &str, params: Vec<Type>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            flags: access::PUBLIC,
            type_params: Vec::new(),
            params,
            return_type,
            annotations: Vec::new(),
            param_annotations: Vec::new(),
            default_value: None,
            declaring_class: *names::OBJECT,
        }
    }

    pub fn constructor(params: Vec<Type>) -> Self {
        Self::new("<init>", params, Type::Void)
    }

    /// An annotation member (`String value() default ""`).
    pub fn member(name: &str, return_type: Type, default: Option<AnnotationValue>) -> Self {
        Self {
            flags: access::PUBLIC | access::ABSTRACT,
            default_value: default,
            ..Self::new(name, Vec::new(), return_type)
        }
    }

    /// Replaces the default `PUBLIC` visibility bits when `flags` carries any.
    pub fn with_flags(mut self, flags: u16) -> Self {
        const VISIBILITY: u16 = access::PUBLIC | access::PRIVATE | access::PROTECTED;
        if flags & VISIBILITY != 0 {
            self.flags &= !VISIBILITY;
        }
        self.flags |= flags;
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn param_annotated(mut self, position: usize, annotation: AnnotationInstance) -> Self {
        if self.param_annotations.len() <= position {
            self.param_annotations.resize_with(position + 1, Vec::new);
        }
        self.param_annotations[position].push(annotation);
        self
    }

    pub fn parameter_annotations(&self, position: usize) -> &[AnnotationInstance] {
        self.param_annotations
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_annotation(&self, name: DotName) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn annotation_named(&self, name: DotName) -> Option<&AnnotationInstance> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    pub fn is_static(&self) -> bool {
        access::has(self.flags, access::STATIC)
    }

    pub fn is_final(&self) -> bool {
        access::has(self.flags, access::FINAL)
    }

    pub fn is_private(&self) -> bool {
        access::has(self.flags, access::PRIVATE)
    }

    pub fn is_abstract(&self) -> bool {
        access::has(self.flags, access::ABSTRACT)
    }

    pub fn is_synthetic(&self) -> bool {
        access::has(self.flags, access::SYNTHETIC)
    }

    pub fn is_bridge(&self) -> bool {
        access::has(self.flags, access::BRIDGE)
    }

    /// `declaring.name(params)`, used in diagnostics.
    pub fn display_name(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        format!("{}#{}({})", self.declaring_class, self.name, params.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldInfo {
    pub name: SmolStr,
    pub flags: u16,
    pub ty: Type,
    pub annotations: Vec<AnnotationInstance>,
    pub declaring_class: DotName,
}

impl FieldInfo {
    /// A private instance field. The declaring class is filled in by [`ClassInfo::field`].
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.into(),
            flags: access::PRIVATE,
            ty,
            annotations: Vec::new(),
            declaring_class: *names::OBJECT,
        }
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags |= flags;
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn has_annotation(&self, name: DotName) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn is_static(&self) -> bool {
        access::has(self.flags, access::STATIC)
    }

    pub fn is_transient(&self) -> bool {
        access::has(self.flags, access::TRANSIENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_sets_declaring_class() {
        let class = ClassInfo::class("com.acme.Foo")
            .method(MethodInfo::new("bar", vec![], Type::Void))
            .field(FieldInfo::new("baz", Type::class("java.lang.String")));
        assert_eq!(class.methods[0].declaring_class.as_str(), "com.acme.Foo");
        assert_eq!(class.fields[0].declaring_class.as_str(), "com.acme.Foo");
    }

    #[test]
    fn implicit_constructor() {
        let class = ClassInfo::class("com.acme.Foo");
        assert!(class.no_args_constructor().is_some());

        let class = ClassInfo::class("com.acme.Bar")
            .method(MethodInfo::constructor(vec![Type::class("java.lang.String")]));
        assert!(class.no_args_constructor().is_none());
    }

    #[test]
    fn private_flag_replaces_public() {
        let method = MethodInfo::new("m", vec![], Type::Void).with_flags(access::PRIVATE);
        assert!(method.is_private());
        assert!(!access::has(method.flags, access::PUBLIC));
    }

    #[test]
    fn generic_class_as_type() {
        let class = ClassInfo::class("com.acme.Box").type_param(TypeVariable::new("T", vec![]));
        assert_eq!(class.as_type().to_string(), "com.acme.Box<T>");
    }
}
