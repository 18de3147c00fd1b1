use bitflags::bitflags;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// One of the six degrees of freedom of a [`SixDofConstraint`](super::SixDofConstraint).
///
/// The discriminant is the index into the per axis arrays and the bit position in [`SixDofAxes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum SixDofAxis {
    TranslationX = 0,
    TranslationY = 1,
    TranslationZ = 2,
    RotationX = 3,
    RotationY = 4,
    RotationZ = 5,
}

impl SixDofAxis {
    /// Number of axes
    pub const NUM_AXES: usize = 6;
    /// Number of translation axes, which come first
    pub const NUM_TRANSLATION: usize = 3;

    /// Every axis in index order
    pub const ALL: [SixDofAxis; 6] = [
        SixDofAxis::TranslationX,
        SixDofAxis::TranslationY,
        SixDofAxis::TranslationZ,
        SixDofAxis::RotationX,
        SixDofAxis::RotationY,
        SixDofAxis::RotationZ,
    ];

    /// Translation axes in index order
    pub const TRANSLATION: [SixDofAxis; 3] =
        [SixDofAxis::TranslationX, SixDofAxis::TranslationY, SixDofAxis::TranslationZ];

    /// Rotation axes in index order
    pub const ROTATION: [SixDofAxis; 3] = [SixDofAxis::RotationX, SixDofAxis::RotationY, SixDofAxis::RotationZ];

    /// Index into per-axis arrays
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Single bit mask for this axis
    #[inline]
    pub fn bit(self) -> SixDofAxes {
        SixDofAxes::from_bits_truncate(1 << self as u8)
    }

    /// True for TranslationX, Y and Z
    #[inline]
    pub fn is_translation(self) -> bool {
        self.index() < Self::NUM_TRANSLATION
    }

    /// True for RotationX, Y and Z
    #[inline]
    pub fn is_rotation(self) -> bool {
        !self.is_translation()
    }
}

bitflags! {
    /// Set of axes, bit 0 = translation X ... bit 5 = rotation Z
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct SixDofAxes: u8 {
        const TRANSLATION_X = 1 << 0;
        const TRANSLATION_Y = 1 << 1;
        const TRANSLATION_Z = 1 << 2;
        const ROTATION_X = 1 << 3;
        const ROTATION_Y = 1 << 4;
        const ROTATION_Z = 1 << 5;
        const TRANSLATION = Self::TRANSLATION_X.bits() | Self::TRANSLATION_Y.bits() | Self::TRANSLATION_Z.bits();
        const ROTATION = Self::ROTATION_X.bits() | Self::ROTATION_Y.bits() | Self::ROTATION_Z.bits();
    }
}

impl SixDofAxes {
    /// True when the bit of `axis` is set
    #[inline]
    pub fn has(self, axis: SixDofAxis) -> bool {
        self.contains(axis.bit())
    }
}
