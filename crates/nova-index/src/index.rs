use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use nova_core::DotName;

use crate::annotation::AnnotationInstance;
use crate::model::ClassInfo;

/// A read-only reflection database keyed by binary class names.
///
/// Implementations must be cheap to query repeatedly; the processor does not cache
/// lookups itself except for the subtype closures used by assignability checks.
pub trait ClassIndex: Send + Sync {
    fn class_by_name(&self, name: DotName) -> Option<Arc<ClassInfo>>;

    /// Classes whose `super_type` is `name`.
    fn known_direct_subclasses(&self, name: DotName) -> Vec<DotName>;

    /// Classes and interfaces that list `name` among their interfaces.
    fn known_direct_implementors(&self, name: DotName) -> Vec<DotName>;

    /// Every class this index knows about, sorted by name.
    fn known_classes(&self) -> Vec<Arc<ClassInfo>>;

    fn annotations_on(&self, name: DotName) -> Vec<AnnotationInstance> {
        self.class_by_name(name)
            .map(|class| class.annotations.clone())
            .unwrap_or_default()
    }

    /// Transitive subclasses of `name` (not including `name`).
    fn all_known_subclasses(&self, name: DotName) -> Vec<DotName> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for sub in self.known_direct_subclasses(current) {
                if sub != name && seen.insert(sub) {
                    out.push(sub);
                    queue.push_back(sub);
                }
            }
        }
        out
    }

    /// Transitive implementors of interface `name`: sub-interfaces, their implementors,
    /// and subclasses of any implementing class.
    fn all_known_implementors(&self, name: DotName) -> Vec<DotName> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            let next = self
                .known_direct_implementors(current)
                .into_iter()
                .chain(if current == name {
                    Vec::new()
                } else {
                    self.known_direct_subclasses(current)
                });
            for sub in next {
                if sub != name && seen.insert(sub) {
                    out.push(sub);
                    queue.push_back(sub);
                }
            }
        }
        out
    }
}

impl<T: ClassIndex + ?Sized> ClassIndex for Arc<T> {
    fn class_by_name(&self, name: DotName) -> Option<Arc<ClassInfo>> {
        (**self).class_by_name(name)
    }

    fn known_direct_subclasses(&self, name: DotName) -> Vec<DotName> {
        (**self).known_direct_subclasses(name)
    }

    fn known_direct_implementors(&self, name: DotName) -> Vec<DotName> {
        (**self).known_direct_implementors(name)
    }

    fn known_classes(&self) -> Vec<Arc<ClassInfo>> {
        (**self).known_classes()
    }
}

/// Hash-map backed index; subclass and implementor maps are maintained on insertion.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    classes: BTreeMap<DotName, Arc<ClassInfo>>,
    subclasses: HashMap<DotName, Vec<DotName>>,
    implementors: HashMap<DotName, Vec<DotName>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_classes(classes: impl IntoIterator<Item = ClassInfo>) -> Self {
        let mut index = Self::new();
        for class in classes {
            index.insert(class);
        }
        index
    }

    /// Adds (or replaces) a class.
    pub fn insert(&mut self, class: ClassInfo) {
        if let Some(previous) = self.classes.remove(&class.name) {
            self.unlink(&previous);
        }
        if let Some(super_name) = class.super_name() {
            self.subclasses.entry(super_name).or_default().push(class.name);
        }
        for interface in class.interface_names() {
            self.implementors.entry(interface).or_default().push(class.name);
        }
        self.classes.insert(class.name, Arc::new(class));
    }

    pub fn with(mut self, class: ClassInfo) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn unlink(&mut self, class: &ClassInfo) {
        if let Some(super_name) = class.super_name() {
            if let Some(subs) = self.subclasses.get_mut(&super_name) {
                subs.retain(|n| *n != class.name);
            }
        }
        for interface in class.interface_names() {
            if let Some(impls) = self.implementors.get_mut(&interface) {
                impls.retain(|n| *n != class.name);
            }
        }
    }
}

impl ClassIndex for MemoryIndex {
    fn class_by_name(&self, name: DotName) -> Option<Arc<ClassInfo>> {
        self.classes.get(&name).cloned()
    }

    fn known_direct_subclasses(&self, name: DotName) -> Vec<DotName> {
        self.subclasses.get(&name).cloned().unwrap_or_default()
    }

    fn known_direct_implementors(&self, name: DotName) -> Vec<DotName> {
        self.implementors.get(&name).cloned().unwrap_or_default()
    }

    fn known_classes(&self) -> Vec<Arc<ClassInfo>> {
        self.classes.values().cloned().collect()
    }
}

/// The application index backed by a fallback for classes outside the deployment.
///
/// Lookups that miss the primary index consult the fallback once and memoize the answer
/// (hit or miss). `known_classes` reports only the primary index: fallback classes are
/// never scanned for beans.
pub struct CompositeIndex {
    primary: Arc<dyn ClassIndex>,
    fallback: Arc<dyn ClassIndex>,
    loaded: RwLock<HashMap<DotName, Option<Arc<ClassInfo>>>>,
}

impl CompositeIndex {
    pub fn new(primary: Arc<dyn ClassIndex>, fallback: Arc<dyn ClassIndex>) -> Self {
        Self {
            primary,
            fallback,
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Number of fallback lookups performed so far.
    pub fn loaded_len(&self) -> usize {
        self.loaded.read().len()
    }

    fn load(&self, name: DotName) -> Option<Arc<ClassInfo>> {
        if let Some(cached) = self.loaded.read().get(&name) {
            return cached.clone();
        }
        let mut loaded = self.loaded.write();
        loaded
            .entry(name)
            .or_insert_with(|| {
                let class = self.fallback.class_by_name(name);
                tracing::trace!(target: "nova.index", class = %name, found = class.is_some(), "loaded class on demand");
                class
            })
            .clone()
    }
}

impl ClassIndex for CompositeIndex {
    fn class_by_name(&self, name: DotName) -> Option<Arc<ClassInfo>> {
        self.primary.class_by_name(name).or_else(|| self.load(name))
    }

    fn known_direct_subclasses(&self, name: DotName) -> Vec<DotName> {
        merge(
            self.primary.known_direct_subclasses(name),
            self.fallback.known_direct_subclasses(name),
        )
    }

    fn known_direct_implementors(&self, name: DotName) -> Vec<DotName> {
        merge(
            self.primary.known_direct_implementors(name),
            self.fallback.known_direct_implementors(name),
        )
    }

    fn known_classes(&self) -> Vec<Arc<ClassInfo>> {
        self.primary.known_classes()
    }
}

fn merge(mut first: Vec<DotName>, second: Vec<DotName>) -> Vec<DotName> {
    for name in second {
        if !first.contains(&name) {
            first.push(name);
        }
    }
    first
}
