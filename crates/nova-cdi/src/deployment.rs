use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;

use nova_index::ClassIndex;

use crate::bean::{BeanId, BeanInfo, ObserverInfo};
use crate::injection::{InjectionPoint, InjectionPointId};
use crate::interception::{InterceptedMethod, MethodKey};
use crate::interceptors::InterceptorBindings;
use crate::qualifiers::QualifierRegistry;
use crate::resolver::BeanResolver;
use crate::scope::Scopes;

/// The processed deployment: discovered metadata plus the results of interception,
/// resolution and removal.
pub struct BeanDeployment {
    pub(crate) index: Arc<dyn ClassIndex>,
    pub(crate) beans: Vec<BeanInfo>,
    pub(crate) observers: Vec<ObserverInfo>,
    pub(crate) injection_points: Vec<InjectionPoint>,
    pub(crate) qualifiers: QualifierRegistry,
    pub(crate) scopes: Scopes,
    pub(crate) interceptor_bindings: InterceptorBindings,
    pub(crate) intercepted: HashMap<BeanId, IndexMap<MethodKey, InterceptedMethod>>,
    pub(crate) bound_interceptors: HashMap<BeanId, Vec<BeanId>>,
    pub(crate) removed: BTreeSet<BeanId>,
}

impl BeanDeployment {
    pub fn index(&self) -> &dyn ClassIndex {
        &*self.index
    }

    /// Beans, producers and synthetic beans still part of the deployment (not removed),
    /// excluding interceptors.
    pub fn beans(&self) -> impl Iterator<Item = &BeanInfo> {
        self.beans
            .iter()
            .filter(|bean| !bean.is_interceptor() && !self.removed.contains(&bean.id))
    }

    pub fn interceptors(&self) -> impl Iterator<Item = &BeanInfo> {
        self.beans.iter().filter(|bean| bean.is_interceptor())
    }

    /// Every discovered bean, removed ones included.
    pub fn all_beans(&self) -> &[BeanInfo] {
        &self.beans
    }

    pub fn bean(&self, id: BeanId) -> &BeanInfo {
        &self.beans[id.index()]
    }

    pub fn is_removed(&self, id: BeanId) -> bool {
        self.removed.contains(&id)
    }

    pub fn removed_beans(&self) -> impl Iterator<Item = &BeanInfo> {
        self.removed.iter().map(|id| self.bean(*id))
    }

    /// Observers whose declaring bean was kept.
    pub fn observers(&self) -> impl Iterator<Item = &ObserverInfo> {
        self.observers
            .iter()
            .filter(|observer| !self.removed.contains(&observer.declaring_bean))
    }

    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    pub fn injection_point(&self, id: InjectionPointId) -> &InjectionPoint {
        &self.injection_points[id.index()]
    }

    pub fn bean_injection_points<'a>(
        &'a self,
        bean: &'a BeanInfo,
    ) -> impl Iterator<Item = &'a InjectionPoint> + 'a {
        bean.injection_points.iter().map(|id| self.injection_point(*id))
    }

    pub fn qualifiers(&self) -> &QualifierRegistry {
        &self.qualifiers
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    pub fn interceptor_bindings(&self) -> &InterceptorBindings {
        &self.interceptor_bindings
    }

    pub fn intercepted_methods(&self, bean: BeanId) -> Option<&IndexMap<MethodKey, InterceptedMethod>> {
        self.intercepted.get(&bean)
    }

    /// Interceptors bound to any method of `bean`, by priority.
    pub fn bound_interceptors(&self, bean: BeanId) -> &[BeanId] {
        self.bound_interceptors.get(&bean).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A resolver over the beans currently in the deployment. Each call starts with empty
    /// caches.
    pub fn resolver(&self) -> BeanResolver<'_> {
        BeanResolver::new(
            &*self.index,
            &self.qualifiers,
            &self.beans,
            self.beans().map(|bean| bean.id),
        )
    }
}

impl std::fmt::Debug for BeanDeployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanDeployment")
            .field("beans", &self.beans.len())
            .field("observers", &self.observers.len())
            .field("injection_points", &self.injection_points.len())
            .field("removed", &self.removed)
            .finish_non_exhaustive()
    }
}
