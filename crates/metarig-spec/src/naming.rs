//! Bone role tags, side suffixes and structured bone names.
//!
//! Guide names are parsed once into a [`BoneName`]; generated bones are named
//! by rendering a modified copy, never by string surgery.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Prefix marking an organizational copy of a guide bone.
pub const ORG_PREFIX: &str = "ORG-";
/// Prefix marking a mechanism bone.
pub const MCH_PREFIX: &str = "MCH-";
/// Prefix marking a deform bone.
pub const DEF_PREFIX: &str = "DEF-";

/// Role tier of a bone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTag {
    /// Organizational copy of a guide bone.
    Organizational,
    Mechanism,
    Control,
    Tweak,
    Deform,
}

impl RoleTag {
    /// Name prefix for this role. Controls and tweaks are unprefixed.
    pub fn prefix(&self) -> &'static str {
        match self {
            RoleTag::Organizational => ORG_PREFIX,
            RoleTag::Mechanism => MCH_PREFIX,
            RoleTag::Deform => DEF_PREFIX,
            RoleTag::Control | RoleTag::Tweak => "",
        }
    }

    /// Returns the tier name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTag::Organizational => "org",
            RoleTag::Mechanism => "mch",
            RoleTag::Control => "ctrl",
            RoleTag::Tweak => "tweak",
            RoleTag::Deform => "def",
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Side of the body a bone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    None,
    Left,
    Right,
    Front,
    Back,
    Up,
    Down,
}

impl Side {
    /// Parses a side letter, case-insensitively.
    pub fn from_letter(c: char) -> Option<Side> {
        match c.to_ascii_uppercase() {
            'L' => Some(Side::Left),
            'R' => Some(Side::Right),
            'F' => Some(Side::Front),
            'B' => Some(Side::Back),
            'U' => Some(Side::Up),
            'D' => Some(Side::Down),
            _ => None,
        }
    }

    /// The upper-case side letter, or `None` for unsided bones.
    pub fn letter(&self) -> Option<char> {
        match self {
            Side::None => None,
            Side::Left => Some('L'),
            Side::Right => Some('R'),
            Side::Front => Some('F'),
            Side::Back => Some('B'),
            Side::Up => Some('U'),
            Side::Down => Some('D'),
        }
    }
}

/// Removes an `ORG-`, `MCH-` or `DEF-` prefix.
pub fn strip_role_prefix(name: &str) -> &str {
    [ORG_PREFIX, MCH_PREFIX, DEF_PREFIX]
        .iter()
        .find_map(|p| name.strip_prefix(p))
        .unwrap_or(name)
}

/// Side encoded in the last two characters of `name` (`.L`, `.r`, ...).
pub fn side_suffix(name: &str) -> Side {
    let mut tail = name.chars().rev();
    match (tail.next(), tail.next()) {
        (Some(letter), Some('.')) => Side::from_letter(letter).unwrap_or_default(),
        _ => Side::None,
    }
}

/// `ORG-` name of a guide bone.
pub fn org_name(guide: &str) -> String {
    format!("{}{}", ORG_PREFIX, guide)
}

/// Name of the `role` copy of `base`, optionally numbered.
///
/// Any role prefix on `base` is replaced; its side suffix is kept.
pub fn derive_name(role: RoleTag, base: &str, ordinal: Option<u32>) -> String {
    let name = BoneName::parse(base).with_role(role);
    match ordinal {
        Some(n) => name.with_ordinal(n).render(),
        None => name.render(),
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(ORG|MCH|DEF)-)?(.+?)(?:\.(\d{3}))?(?:\.([LRFBUDlrfbud]))?$")
            .expect("bone name pattern is valid")
    })
}

/// A structured bone name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneName {
    pub role: RoleTag,
    pub stem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    #[serde(default)]
    pub side: Side,
}

impl BoneName {
    /// Creates an unsided, unqualified name.
    pub fn new(role: RoleTag, stem: impl Into<String>) -> Self {
        Self {
            role,
            stem: stem.into(),
            qualifier: None,
            ordinal: None,
            side: Side::None,
        }
    }

    /// Parses a host bone name. Unprefixed names parse as controls.
    pub fn parse(name: &str) -> Self {
        let Some(caps) = name_pattern().captures(name) else {
            return Self::new(RoleTag::Control, name);
        };
        let role = match caps.get(1).map(|m| m.as_str()) {
            Some("ORG") => RoleTag::Organizational,
            Some("MCH") => RoleTag::Mechanism,
            Some("DEF") => RoleTag::Deform,
            _ => RoleTag::Control,
        };
        Self {
            role,
            stem: caps.get(2).map_or(name, |m| m.as_str()).to_string(),
            qualifier: None,
            ordinal: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            side: caps
                .get(4)
                .and_then(|m| m.as_str().chars().next())
                .and_then(Side::from_letter)
                .unwrap_or_default(),
        }
    }

    /// Same name with another role.
    pub fn with_role(&self, role: RoleTag) -> Self {
        Self {
            role,
            ..self.clone()
        }
    }

    /// Same name with a qualifier appended to the stem.
    pub fn qualified(&self, qualifier: impl Into<String>) -> Self {
        let qualifier = qualifier.into();
        let qualifier = match &self.qualifier {
            Some(existing) => format!("{}_{}", existing, qualifier),
            None => qualifier,
        };
        Self {
            qualifier: Some(qualifier),
            ..self.clone()
        }
    }

    /// Same name with an ordinal.
    pub fn with_ordinal(&self, ordinal: u32) -> Self {
        Self {
            ordinal: Some(ordinal),
            ..self.clone()
        }
    }

    /// Same name without an ordinal.
    pub fn without_ordinal(&self) -> Self {
        Self {
            ordinal: None,
            ..self.clone()
        }
    }

    /// Next free variant of this name: bumps the ordinal, starting at `.001`.
    pub fn bumped(&self) -> Self {
        self.with_ordinal(self.ordinal.map_or(1, |n| n + 1))
    }

    /// Renders the host bone name.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for BoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.role.prefix(), self.stem)?;
        if let Some(q) = &self.qualifier {
            write!(f, "_{}", q)?;
        }
        if let Some(n) = self.ordinal {
            write!(f, ".{:03}", n)?;
        }
        if let Some(letter) = self.side.letter() {
            write!(f, ".{}", letter)?;
        }
        Ok(())
    }
}
