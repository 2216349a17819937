//! Interaction modes chosen by the UI layer

use std::fmt;
use std::str::FromStr;

/// What a primary pointer action does
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EditMode {
    #[default]
    Build,
    Erase,
    Orbit,
    ScalePrompt,
    LoadPrompt,
    ViewActualToggle,
    Undo,
}

impl EditMode {
    pub const ALL: [EditMode; 7] = [
        EditMode::Build,
        EditMode::Erase,
        EditMode::Orbit,
        EditMode::ScalePrompt,
        EditMode::LoadPrompt,
        EditMode::ViewActualToggle,
        EditMode::Undo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditMode::Build => "build",
            EditMode::Erase => "erase",
            EditMode::Orbit => "orbit",
            EditMode::ScalePrompt => "scale",
            EditMode::LoadPrompt => "load",
            EditMode::ViewActualToggle => "view",
            EditMode::Undo => "undo",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mode {:?}", s))
    }
}
