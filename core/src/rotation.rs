use image::DynamicImage;
use std::fmt::{Display, Formatter};

/// Clockwise angle by which an image's content is misoriented relative to upright.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Upright,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Class index order produced by the orientation model.
    pub const CLASSES: [Rotation; 4] = [
        Rotation::Upright,
        Rotation::Clockwise90,
        Rotation::Clockwise180,
        Rotation::Clockwise270,
    ];

    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::CLASSES.get(index).copied()
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Upright => 0,
            Self::Clockwise90 => 90,
            Self::Clockwise180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    pub fn is_upright(self) -> bool {
        self == Self::Upright
    }

    /// Counter-clockwise angle that undoes this rotation: `(360 - degrees) mod 360`.
    pub fn correction_degrees(self) -> u16 {
        (360 - self.degrees()) % 360
    }

    /// Applies the correction, expanding the canvas to fit.
    ///
    /// Turning counter-clockwise by `(360 - r) mod 360` is a clockwise turn by `r`.
    pub fn correct(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::Upright => image.clone(),
            Self::Clockwise90 => image.rotate90(),
            Self::Clockwise180 => image.rotate180(),
            Self::Clockwise270 => image.rotate270(),
        }
    }
}

impl Display for Rotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
