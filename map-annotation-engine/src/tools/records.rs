//! Records produced when a tool commits an edit.
//!
//! These are the payloads handed to external persistence (via RPC
//! notifications); points are plain `[x, y]` arrays in map-frame metres.

use crate::engine::errors::MapError;
use bevy::prelude::*;
use constants::occupancy::Rgba;
use constants::zone::{
    CRITICAL_ZONE_COLOUR, DEFAULT_ZONE_LINE_WIDTH, FORBIDDEN_ZONE_COLOUR, PREFERRED_ZONE_COLOUR,
};
use serde::{Deserialize, Serialize};

/// Semantic category of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    #[default]
    Preferred,
    Forbidden,
    Critical,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 3] = [Self::Preferred, Self::Forbidden, Self::Critical];

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "preferred" => Some(Self::Preferred),
            "forbidden" => Some(Self::Forbidden),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Preferred => "preferred",
            Self::Forbidden => "forbidden",
            Self::Critical => "critical",
        }
    }

    pub fn default_style(&self) -> ZoneStyle {
        let colour = match self {
            Self::Preferred => PREFERRED_ZONE_COLOUR,
            Self::Forbidden => FORBIDDEN_ZONE_COLOUR,
            Self::Critical => CRITICAL_ZONE_COLOUR,
        };
        ZoneStyle {
            colour,
            line_width: DEFAULT_ZONE_LINE_WIDTH,
        }
    }
}

/// Fill colour and outline width of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneStyle {
    pub colour: Rgba,
    pub line_width: f32,
}

impl ZoneStyle {
    pub fn validate(&self) -> Result<(), MapError> {
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(MapError::InvalidParams(format!(
                "zone line_width must be positive and finite, got {}",
                self.line_width
            )));
        }
        Ok(())
    }

    /// Fill colour at full opacity, used for the zone's outline.
    pub fn outline_colour(&self) -> Rgba {
        let [r, g, b, _] = self.colour;
        [r, g, b, u8::MAX]
    }

    pub fn bevy_colour(&self) -> Color {
        let [r, g, b, a] = self.colour;
        Color::srgba_u8(r, g, b, a)
    }
}

impl Default for ZoneStyle {
    fn default() -> Self {
        ZoneKind::default().default_style()
    }
}

/// A committed zone polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub id: u32,
    pub name: String,
    pub kind: ZoneKind,
    pub points: Vec<[f32; 2]>,
    pub style: ZoneStyle,
    #[serde(default)]
    pub map_id: String,
    #[serde(default)]
    pub site_id: String,
}

impl ZoneRecord {
    pub fn polygon(&self) -> Vec<Vec2> {
        self.points.iter().map(|p| Vec2::from_array(*p)).collect()
    }
}

/// Notice that a committed zone was removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDeletion {
    pub id: u32,
    pub map_id: String,
    pub site_id: String,
}

/// A wall polyline rasterised into the map, or a wall-eraser session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallRecord {
    pub map_id: String,
    pub mode: &'static str,
    pub polyline: Vec<[f32; 2]>,
    pub width_px: u32,
    pub pixels_changed: usize,
}

/// A floor edit: an erased region or a polygon cleared to free space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorRecord {
    pub map_id: String,
    pub mode: &'static str,
    pub polygon: Vec<[f32; 2]>,
    pub pixels_changed: usize,
}

/// A committed pose estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseRecord {
    pub map_id: String,
    pub site_id: String,
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub orientation: [f32; 4],
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

/// Output of a successful apply (or zone deletion).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "commit", rename_all = "snake_case")]
pub enum ToolCommit {
    Wall(WallRecord),
    Floor(FloorRecord),
    Zone(ZoneRecord),
    ZoneDeleted(ZoneDeletion),
    PoseEstimate(PoseRecord),
}

pub fn to_point_array(points: &[Vec2]) -> Vec<[f32; 2]> {
    points.iter().map(|p| p.to_array()).collect()
}
