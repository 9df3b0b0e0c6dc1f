//! Offset-bone tool.
//!
//! Inserts a slightly larger parent above an existing bone so animators get
//! an extra transform layer without touching the bone's own channels.

use log::info;
use metarig_spec::WidgetKind;

use crate::error::SkeletonResult;
use crate::skeleton::{Phase, Skeleton};

/// Length factor of the offset bone relative to the bone it wraps.
pub const OFFSET_SCALE: f32 = 1.25;

/// Name of the offset bone for `bone`.
pub fn offset_name(bone: &str) -> String {
    format!("{}_offset", bone)
}

/// Creates `<bone>_offset` between `bone` and its parent.
///
/// The offset bone copies the bone's geometry scaled by [`OFFSET_SCALE`],
/// takes over its parent and layers and gets a circle widget. Returns the
/// name the host gave the new bone. Leaves the skeleton in the topology
/// phase.
pub fn make_offset_bone(skeleton: &mut dyn Skeleton, bone: &str) -> SkeletonResult<String> {
    let mut transform = skeleton.transform(bone)?;
    let parent = skeleton.parent(bone)?;
    let connected = skeleton.is_connected(bone)?;
    let layers = skeleton.layers(bone)?;
    transform.scale_length(OFFSET_SCALE);

    skeleton.switch_phase(Phase::Topology);
    let offset = skeleton.create_bone(&offset_name(bone), transform)?;
    skeleton.set_parent(&offset, parent.as_deref(), connected)?;
    skeleton.set_parent(bone, Some(&offset), false)?;

    skeleton.switch_phase(Phase::Binding);
    skeleton.set_layers(&offset, layers)?;
    skeleton.set_widget(&offset, WidgetKind::circle(1.0, 0.0))?;
    skeleton.switch_phase(Phase::Topology);

    info!("added offset bone '{}' above '{}'", offset, bone);
    Ok(offset)
}
