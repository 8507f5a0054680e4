use std::collections::HashMap;
use serde::{Deserialize, Serialize};

use crate::components::material::BlendMode;

/// Asset manifest describing the textures, pipelines, materials, clips and
/// named sprites of a game. Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Texture atlases, in handle order.
    pub textures: Vec<TextureDescriptor>,
    /// Render pipelines, in handle order.
    #[serde(default)]
    pub pipelines: Vec<PipelineDescriptor>,
    /// Material instances, in handle order.
    #[serde(default)]
    pub materials: Vec<MaterialDescriptor>,
    /// Animation clips by name.
    #[serde(default)]
    pub clips: HashMap<String, ClipDescriptor>,
    /// Named sprite lookup: name → texture + material + cell.
    #[serde(default)]
    pub sprites: HashMap<String, SpriteDescriptor>,
}

/// Describes a single texture atlas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureDescriptor {
    /// Human-readable name (e.g., "hero").
    pub name: String,
    /// Number of columns in the atlas grid.
    pub cols: u32,
    /// Number of rows in the atlas grid.
    pub rows: u32,
    /// Relative path to the image file (e.g., "hero.png").
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDescriptor {
    pub name: String,
    #[serde(default)]
    pub blend: BlendMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    pub name: String,
    /// Name of a pipeline in this manifest.
    pub pipeline: String,
    /// Overrides the default order derived from the pipeline's blend mode.
    #[serde(default)]
    pub render_order: Option<i32>,
    /// Extra resource sets bound at slots 1, 2, ...
    #[serde(default)]
    pub resource_sets: Vec<u32>,
}

/// Frame layout of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ClipLayout {
    /// Consecutive columns in one row.
    Horizontal { row: u32, start_col: u32, count: u32 },
    /// Consecutive rows in one column.
    Vertical { col: u32, start_row: u32, count: u32 },
    /// Explicit (col, row) cells.
    Frames { frames: Vec<[u32; 2]> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipDescriptor {
    #[serde(flatten)]
    pub layout: ClipLayout,
    /// Frames per second.
    pub fps: f32,
}

/// Describes a named sprite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteDescriptor {
    /// Name of a texture in this manifest.
    pub texture: String,
    /// Name of a material in this manifest.
    pub material: String,
    /// Column in the atlas grid.
    #[serde(default)]
    pub col: u32,
    /// Row in the atlas grid.
    #[serde(default)]
    pub row: u32,
    /// Number of cells this sprite spans (default: 1).
    #[serde(default = "default_span")]
    pub span: u32,
    #[serde(default)]
    pub layer: u8,
}

fn default_span() -> u32 {
    1
}

impl AssetManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
