//! Removal of beans nothing uses.

use std::collections::{BTreeSet, HashMap, HashSet};

use globset::GlobSet;

use crate::bean::{BeanId, BeanInfo};
use crate::deployment::BeanDeployment;
use crate::error::{Diagnostic, CDI_UNUSED_BEAN_CODE};

/// Beans that can be dropped from `deployment`.
///
/// A bean is kept when it is an interceptor or synthetic bean, has a name, matches
/// `unremovable`, is injected somewhere, is reachable through programmatic lookup
/// (`looked_up`) or declares an observer. A bean declaring producers is only removed when
/// all of its producers are.
pub fn find_unused_beans(
    deployment: &BeanDeployment,
    unremovable: &GlobSet,
    looked_up: &BTreeSet<BeanId>,
) -> (BTreeSet<BeanId>, Vec<Diagnostic>) {
    let injected: HashSet<BeanId> = deployment
        .injection_points()
        .iter()
        .filter_map(|ip| ip.resolved_bean())
        .collect();
    let declares_observers: HashSet<BeanId> =
        deployment.observers.iter().map(|o| o.declaring_bean).collect();
    let mut producers: HashMap<BeanId, Vec<BeanId>> = HashMap::new();
    for bean in deployment.beans() {
        if let Some(declaring) = bean.declaring_bean {
            producers.entry(declaring).or_default().push(bean.id);
        }
    }

    let used = |bean: &BeanInfo| {
        bean.is_interceptor()
            || bean.synthetic
            || bean.name.is_some()
            || unremovable.is_match(bean.bean_class.as_str())
            || unremovable.is_match(bean.provider_type.name().as_str())
            || injected.contains(&bean.id)
            || looked_up.contains(&bean.id)
            || declares_observers.contains(&bean.id)
    };

    let mut removed = BTreeSet::new();
    for bean in deployment.beans() {
        if used(bean) || producers.contains_key(&bean.id) {
            continue;
        }
        removed.insert(bean.id);
    }
    for (declaring, produced) in &producers {
        let bean = deployment.bean(*declaring);
        if !used(bean) && produced.iter().all(|p| removed.contains(p)) {
            removed.insert(*declaring);
        }
    }

    let diagnostics = removed
        .iter()
        .map(|id| {
            let bean = deployment.bean(*id);
            tracing::debug!(target: "nova.cdi", %bean, "removing unused bean");
            Diagnostic::info(CDI_UNUSED_BEAN_CODE, format!("Removed unused {bean}"))
        })
        .collect();
    (removed, diagnostics)
}
