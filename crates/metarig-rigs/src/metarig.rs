//! Metarig documents: guide bones plus rig assignments.

use metarig_spec::{RigParams, RigType};
use serde::{Deserialize, Serialize};

use crate::armature::Armature;
use crate::error::LoadError;

/// A rig variant assigned to one guide bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigAssignment {
    /// Guide bone the rig is assigned to.
    pub bone: String,
    /// Variant and its parameters.
    pub rig: RigParams,
}

impl RigAssignment {
    pub fn new(bone: impl Into<String>, rig: RigParams) -> Self {
        Self {
            bone: bone.into(),
            rig,
        }
    }

    /// Assignment with default parameters.
    pub fn with_defaults(bone: impl Into<String>, rig_type: RigType) -> Self {
        Self::new(bone, RigParams::defaults(rig_type))
    }

    pub fn rig_type(&self) -> RigType {
        self.rig.rig_type()
    }
}

/// A guide skeleton and the rigs assigned to its bones, in generation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metarig {
    pub armature: Armature,
    #[serde(default)]
    pub rigs: Vec<RigAssignment>,
}

impl Metarig {
    pub fn new(armature: Armature) -> Self {
        Self {
            armature,
            rigs: Vec::new(),
        }
    }

    /// Appends a rig assignment.
    pub fn assign(mut self, bone: impl Into<String>, rig: RigParams) -> Self {
        self.rigs.push(RigAssignment::new(bone, rig));
        self
    }

    /// Parses a metarig document and checks the guide hierarchy.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let metarig: Metarig = serde_json::from_str(json)?;
        metarig.armature.check_integrity()?;
        Ok(metarig)
    }

    /// Serialises the metarig as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
