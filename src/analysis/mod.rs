//! Structural properties of split systems: compatibility, circularity, weak
//! compatibility and the fit to a distance matrix.

pub mod circular;
pub mod compatibility;
pub mod fit;

pub use circular::{compute_circular_ordering, is_circular_under, is_cyclic};
pub use compatibility::{
    CompatibilityGraph, are_pair_compatible, build_compatibility_graph, is_fully_compatible,
    is_weakly_compatible,
};
pub use fit::{compute_fit, split_distances, update_fit};

use crate::data::split_system::{Compatibility, SplitSystem};

/// Classify in priority order compatible → cyclic → weakly compatible →
/// incompatible, stopping at the first class that holds.
///
/// The class is cached on the system (and the circular ordering with it, when
/// one was found); a cached class is returned without recomputation until the
/// split list changes.
pub fn classify(system: &mut SplitSystem) -> Compatibility {
    if system.compatibility() != Compatibility::Unknown {
        return system.compatibility();
    }
    let class = if is_fully_compatible(system) {
        if let Some(cycle) = compute_circular_ordering(system) {
            store_cycle(system, cycle);
        }
        Compatibility::Compatible
    } else if let Some(cycle) = compute_circular_ordering(system) {
        store_cycle(system, cycle);
        Compatibility::Cyclic
    } else if is_weakly_compatible(system) {
        Compatibility::WeaklyCompatible
    } else {
        Compatibility::Incompatible
    };
    debug!("Classified {} splits as {}", system.nsplits(), class.as_str());
    system.set_compatibility(class);
    class
}

fn store_cycle(system: &mut SplitSystem, cycle: Vec<usize>) {
    if let Err(e) = system.set_cycle(cycle) {
        warn!("Discarding circular ordering: {:#}", e);
    }
}
