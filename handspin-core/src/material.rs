//! Surface materials and the display-safety rules applied to imported ones.

/// Which faces of a surface are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// How a surface's color combines with what is already drawn behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blending {
    None,
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Linear RGBA
    pub base_color: [f32; 4],
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
    pub blending: Blending,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, base_color: [f32; 4]) -> Self {
        self.base_color = base_color;
        self
    }

    /// A copy that is fully opaque, double-sided and normally blended.
    ///
    /// Imported assets can carry any transparency or culling setting; under
    /// free rotation those show through or drop faces.
    pub fn sanitized(&self) -> Self {
        Self {
            opacity: 1.0,
            transparent: false,
            side: Side::Double,
            blending: Blending::Normal,
            ..self.clone()
        }
    }

    pub fn is_display_ready(&self) -> bool {
        self.opacity == 1.0
            && !self.transparent
            && self.side == Side::Double
            && self.blending == Blending::Normal
    }

    /// Rec. 709 luma of the base color.
    pub fn luminance(&self) -> f32 {
        let [r, g, b, _] = self.base_color;
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            blending: Blending::Normal,
        }
    }
}
