use std::collections::HashMap;
use std::fmt;

use nova_core::{names, DotName};
use nova_index::{AnnotationInstance, ClassIndex, ClassInfo};

/// A bean scope.
///
/// Normal scopes are accessed through a client proxy, which is what lets the dependency
/// ordering break cycles through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeInfo {
    pub name: DotName,
    pub normal: bool,
    /// Declared `@Inherited`: subclasses without their own scope inherit it.
    pub inherited: bool,
}

impl ScopeInfo {
    pub fn dependent() -> Self {
        Self {
            name: *names::DEPENDENT,
            normal: false,
            inherited: false,
        }
    }

    pub fn singleton() -> Self {
        Self {
            name: *names::SINGLETON,
            normal: false,
            inherited: false,
        }
    }

    pub fn application() -> Self {
        Self {
            name: *names::APPLICATION_SCOPED,
            normal: true,
            inherited: true,
        }
    }

    pub fn request() -> Self {
        Self {
            name: *names::REQUEST_SCOPED,
            normal: true,
            inherited: true,
        }
    }

    pub fn session() -> Self {
        Self {
            name: *names::SESSION_SCOPED,
            normal: true,
            inherited: true,
        }
    }

    pub fn is_dependent(&self) -> bool {
        self.name == *names::DEPENDENT
    }
}

impl fmt::Display for ScopeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name.simple_name())
    }
}

/// Built-in scopes plus custom scope annotations found in the index.
#[derive(Clone, Debug)]
pub struct Scopes {
    scopes: HashMap<DotName, ScopeInfo>,
}

impl Scopes {
    pub fn new(index: &dyn ClassIndex) -> Self {
        let mut scopes: HashMap<DotName, ScopeInfo> = [
            ScopeInfo::dependent(),
            ScopeInfo::singleton(),
            ScopeInfo::application(),
            ScopeInfo::request(),
            ScopeInfo::session(),
        ]
        .into_iter()
        .map(|scope| (scope.name, scope))
        .collect();

        for class in index.known_classes() {
            if !class.is_annotation() {
                continue;
            }
            let normal = class.has_annotation(*names::NORMAL_SCOPE);
            if normal || class.has_annotation(*names::SCOPE) {
                scopes.insert(
                    class.name,
                    ScopeInfo {
                        name: class.name,
                        normal,
                        inherited: class.has_annotation(*names::INHERITED),
                    },
                );
            }
        }
        Self { scopes }
    }

    pub fn get(&self, name: DotName) -> Option<ScopeInfo> {
        self.scopes.get(&name).copied()
    }

    pub fn is_scope(&self, name: DotName) -> bool {
        self.scopes.contains_key(&name)
    }

    /// The scope declared among `annotations`.
    ///
    /// `Err` carries every scope found when more than one is declared.
    pub fn declared(&self, annotations: &[AnnotationInstance]) -> Result<Option<ScopeInfo>, Vec<ScopeInfo>> {
        let found: Vec<ScopeInfo> = annotations.iter().filter_map(|a| self.get(a.name)).collect();
        match found.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(found),
        }
    }

    /// Scope inherited from the superclass chain, if any superclass declares an `@Inherited`
    /// scope.
    pub fn inherited(&self, index: &dyn ClassIndex, class: &ClassInfo) -> Option<ScopeInfo> {
        let mut current = class.super_name();
        let mut depth = 0;
        while let Some(name) = current {
            if name == *names::OBJECT || depth > 64 {
                return None;
            }
            let super_class = index.class_by_name(name)?;
            if let Ok(Some(scope)) = self.declared(&super_class.annotations) {
                return scope.inherited.then_some(scope);
            }
            current = super_class.super_name();
            depth += 1;
        }
        None
    }
}
