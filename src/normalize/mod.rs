//! Per-target metadata normalization
//!
//! Pure transforms from the shared [`crate::core::descriptor::ReleaseDescriptor`]
//! into each target's vocabulary. Nothing in this module performs IO.

pub mod curseforge;
pub mod modrinth;

use crate::core::descriptor::{DependencyKind, DependencySet};

/// Flatten a dependency set into (identifier, relation kind) records,
/// required first, in declared order
pub fn dependency_records(depends: &DependencySet) -> Vec<(String, DependencyKind)> {
    let mut records = Vec::new();

    let kinds = [
        (&depends.required, DependencyKind::Required),
        (&depends.optional, DependencyKind::Optional),
        (&depends.incompatible, DependencyKind::Incompatible),
        (&depends.embedded, DependencyKind::Embedded),
    ];

    for (ids, kind) in kinds {
        for id in ids {
            records.push((id.clone(), kind));
        }
    }

    records
}
