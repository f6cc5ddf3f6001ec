use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Anatomical plane used to cut a volume. Each plane fixes one axis of the
/// (depth, height, width) grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Fixes the depth axis.
    Axial,
    /// Fixes the height axis.
    Coronal,
    /// Fixes the width axis.
    Sagittal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Axial,
        Orientation::Coronal,
        Orientation::Sagittal,
    ];

    /// Index of the volume axis held constant by this plane.
    pub fn axis(self) -> usize {
        match self {
            Orientation::Axial => 0,
            Orientation::Coronal => 1,
            Orientation::Sagittal => 2,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Axial => "axial",
            Orientation::Coronal => "coronal",
            Orientation::Sagittal => "sagittal",
        };
        f.write_str(name)
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axial" | "depth" => Ok(Orientation::Axial),
            "coronal" | "height" => Ok(Orientation::Coronal),
            "sagittal" | "width" => Ok(Orientation::Sagittal),
            other => Err(format!(
                "unknown orientation `{other}`, expected axial, coronal or sagittal"
            )),
        }
    }
}

/// Lifecycle of one exploration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadFailed,
    Exploring,
    Exporting,
}

impl SessionState {
    /// Whether a volume is held and may be rendered, sliced or exported.
    pub fn has_volume(self) -> bool {
        matches!(
            self,
            SessionState::Loaded | SessionState::Exploring | SessionState::Exporting
        )
    }
}
