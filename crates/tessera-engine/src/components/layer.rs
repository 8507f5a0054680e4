/// Render layer: controls draw order for sprites.
///
/// Layers are drawn back-to-front in ascending index order. Within a layer,
/// the material's render order decides the sequence (see `RenderOrder`).
/// The named constants cover the common cases; any index is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderLayer(pub u8);

impl RenderLayer {
    pub const BACKGROUND: RenderLayer = RenderLayer(0);
    pub const TERRAIN: RenderLayer = RenderLayer(1);
    pub const OBJECTS: RenderLayer = RenderLayer(2);
    pub const FOREGROUND: RenderLayer = RenderLayer(3);
    pub const VFX: RenderLayer = RenderLayer(4);
    pub const UI: RenderLayer = RenderLayer(5);

    /// Number of layer indices addressable by a `RenderLayer`.
    pub const COUNT: usize = u8::MAX as usize + 1;

    pub fn from_u8(value: u8) -> Self {
        Self(value)
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }
}
