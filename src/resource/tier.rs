// Priority Tiers
// Ordered layers that decide which source wins for a logical path

use std::fmt;

/// Logical layer a handle belongs to, lowest precedence first.
///
/// The derived ordering is the ranking: a `Normal` handle always beats a
/// `Game` handle for the same name, regardless of registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityTier {
    Core,
    Game,
    Module,
    Normal,
    Streaming,
    Addon,
    Explicit,
}

impl PriorityTier {
    /// All tiers in ascending precedence
    pub const ALL: [PriorityTier; 7] = [
        PriorityTier::Core,
        PriorityTier::Game,
        PriorityTier::Module,
        PriorityTier::Normal,
        PriorityTier::Streaming,
        PriorityTier::Addon,
        PriorityTier::Explicit,
    ];

    /// Parse a tier name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "core" => Some(PriorityTier::Core),
            "game" => Some(PriorityTier::Game),
            "module" => Some(PriorityTier::Module),
            "normal" => Some(PriorityTier::Normal),
            "streaming" => Some(PriorityTier::Streaming),
            "addon" => Some(PriorityTier::Addon),
            "explicit" => Some(PriorityTier::Explicit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Core => "Core",
            PriorityTier::Game => "Game",
            PriorityTier::Module => "Module",
            PriorityTier::Normal => "Normal",
            PriorityTier::Streaming => "Streaming",
            PriorityTier::Addon => "Addon",
            PriorityTier::Explicit => "Explicit",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical probe prefixes used by discovery, in probe order.
///
/// The order matches ascending tier, so appending hits in probe order keeps
/// a handle list sorted.
pub const DISCOVERY_PREFIXES: [(&str, PriorityTier); 3] = [
    ("Core/", PriorityTier::Core),
    ("Game/", PriorityTier::Game),
    ("", PriorityTier::Normal),
];
