//! Constraint emission.

use log::debug;
use metarig_spec::ConstraintSpec;

use crate::error::SkeletonResult;
use crate::skeleton::{require_phase, ConstraintHandle, Phase, Skeleton};

/// Creates one constraint on the spec's owner.
///
/// Parameters the host does not support for the kind are dropped by the
/// host. Requires the binding phase.
pub fn apply_constraint(
    skeleton: &mut dyn Skeleton,
    spec: &ConstraintSpec,
) -> SkeletonResult<ConstraintHandle> {
    require_phase(skeleton.phase(), Phase::Binding, "apply_constraint", &spec.owner)?;
    let handle = skeleton.create_constraint(spec)?;
    debug!(
        "constraint {} on '{}' -> {:?} (#{})",
        spec.kind.name(),
        spec.owner,
        spec.kind.targets(),
        handle.index
    );
    Ok(handle)
}

/// Emits `specs` in order after mapping planned bone names to actual ones.
pub fn emit_constraints<'s>(
    skeleton: &mut dyn Skeleton,
    specs: impl IntoIterator<Item = &'s ConstraintSpec>,
    rename: impl Fn(&str) -> String,
) -> SkeletonResult<Vec<ConstraintHandle>> {
    let mut handles = Vec::new();
    for spec in specs {
        let mut spec = spec.clone();
        spec.owner = rename(&spec.owner);
        spec.kind.map_targets(&rename);
        handles.push(apply_constraint(skeleton, &spec)?);
    }
    Ok(handles)
}
