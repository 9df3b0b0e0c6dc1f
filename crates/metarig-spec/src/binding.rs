//! Pose-phase bone settings: transform locks, widget shapes and layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-channel transform locks. `true` means locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locks {
    pub location: [bool; 3],
    pub rotation: [bool; 3],
    #[serde(default)]
    pub rotation_w: bool,
    pub scale: [bool; 3],
}

impl Locks {
    /// Nothing locked.
    pub fn free() -> Self {
        Self::default()
    }

    pub fn location(mut self, x: bool, y: bool, z: bool) -> Self {
        self.location = [x, y, z];
        self
    }

    pub fn rotation(mut self, x: bool, y: bool, z: bool) -> Self {
        self.rotation = [x, y, z];
        self
    }

    pub fn rotation_w(mut self, locked: bool) -> Self {
        self.rotation_w = locked;
        self
    }

    pub fn scale(mut self, x: bool, y: bool, z: bool) -> Self {
        self.scale = [x, y, z];
        self
    }
}

/// Custom display shape for a control bone. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum WidgetKind {
    /// Circle around the bone at `head_tail` (0 = head, 1 = tail).
    Circle { radius: f32, head_tail: f32 },
    Sphere { radius: f32 },
    Dome { size: f32 },
    /// Plain bone-shaped widget.
    Bone,
    Cube { radius: f32 },
    /// Chevron for chain ends; `invert` flips it toward the head.
    Chain { radius: f32, invert: bool },
}

impl WidgetKind {
    pub fn circle(radius: f32, head_tail: f32) -> Self {
        WidgetKind::Circle { radius, head_tail }
    }

    pub fn cube(radius: f32) -> Self {
        WidgetKind::Cube { radius }
    }
}

/// 32-bit bone layer membership mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::layer(0)
    }
}

impl LayerMask {
    /// Mask with no layers.
    pub const NONE: LayerMask = LayerMask(0);
    /// Mask with every layer.
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Mask containing only `index` (0..32). Out-of-range indices yield an empty mask.
    pub fn layer(index: u32) -> Self {
        LayerMask(1u32.checked_shl(index).unwrap_or(0))
    }

    /// Builds a mask from layer flags, lowest layer first.
    pub fn from_flags(flags: &[bool]) -> Self {
        LayerMask(
            flags
                .iter()
                .take(32)
                .enumerate()
                .filter(|(_, on)| **on)
                .fold(0u32, |acc, (i, _)| acc | (1 << i)),
        )
    }

    pub fn contains(&self, index: u32) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    /// True if any layer is shared with `other`.
    pub fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Indices of set layers, ascending.
    pub fn indices(&self) -> Vec<u32> {
        (0..32).filter(|i| self.contains(*i)).collect()
    }
}

impl fmt::Display for LayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: Vec<String> = self.indices().iter().map(|i| i.to_string()).collect();
        write!(f, "[{}]", indices.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_mask_bits() {
        let mask = LayerMask::layer(20);
        assert!(mask.contains(20));
        assert!(!mask.contains(1));
        assert_eq!(mask.indices(), vec![20]);
        assert!(LayerMask::layer(40).is_empty());
    }

    #[test]
    fn test_layer_mask_from_flags() {
        let mask = LayerMask::from_flags(&[false, true, false, true]);
        assert_eq!(mask, LayerMask(0b1010));
        assert_eq!(mask.to_string(), "[1,3]");
        assert!(mask.intersects(LayerMask::layer(3)));
        assert!(!mask.intersects(LayerMask::layer(0)));
    }

    #[test]
    fn test_locks_builder() {
        let locks = Locks::free().rotation(true, false, true).scale(false, true, false);
        assert_eq!(locks.rotation, [true, false, true]);
        assert_eq!(locks.scale, [false, true, false]);
        assert_eq!(locks.location, [false; 3]);
        assert!(!locks.rotation_w);
    }

    #[test]
    fn test_widget_json_shape() {
        let json = serde_json::to_value(WidgetKind::circle(0.5, 0.5)).unwrap();
        assert_eq!(json["shape"], "circle");
        assert_eq!(json["radius"], 0.5);
    }
}
