//! GE register-level enums and the vertex type word.
//!
//! Every enum here mirrors a 2-bit (or 3-bit) register field. Decoding from raw register values
//! masks to the field width, so every raw value maps to a variant and decoding never fails.

use std::fmt;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// GE primitive kinds, in register encoding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum PrimitiveKind {
    Points = 0,
    Lines = 1,
    LineStrip = 2,
    Triangles = 3,
    TriangleStrip = 4,
    TriangleFan = 5,
    /// Screen-aligned rectangles. Always expanded in software.
    Rectangles = 6,
}

impl PrimitiveKind {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineStrip,
            3 => Self::Triangles,
            4 => Self::TriangleStrip,
            5 => Self::TriangleFan,
            6 => Self::Rectangles,
            _ => return None,
        })
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveKind::Points => "points",
            PrimitiveKind::Lines => "lines",
            PrimitiveKind::LineStrip => "line_strip",
            PrimitiveKind::Triangles => "triangles",
            PrimitiveKind::TriangleStrip => "triangle_strip",
            PrimitiveKind::TriangleFan => "triangle_fan",
            PrimitiveKind::Rectangles => "rectangles",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum ShadeMode {
    Flat = 0,
    #[default]
    Gouraud = 1,
}

/// Texture coordinate generation mode (`TEXMAPMODE` bits 0-1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum TexMapMode {
    #[default]
    TextureCoords = 0,
    TextureMatrix = 1,
    EnvironmentMap = 2,
    /// Undocumented. Games that use it expect texture-coordinate behavior.
    Unknown = 3,
}

impl TexMapMode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::TextureCoords,
            1 => Self::TextureMatrix,
            2 => Self::EnvironmentMap,
            _ => Self::Unknown,
        }
    }
}

/// Source vector for texture-matrix projection (`TEXMAPMODE` bits 8-9).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum TexProjMapMode {
    /// Model space position.
    #[default]
    Position = 0,
    /// Raw, unscaled texture coordinates.
    Uv = 1,
    NormalizedNormal = 2,
    Normal = 3,
}

impl TexProjMapMode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Position,
            1 => Self::Uv,
            2 => Self::NormalizedNormal,
            _ => Self::Normal,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum LightType {
    #[default]
    Directional = 0,
    Point = 1,
    Spot = 2,
    /// Undocumented. Lit like a spot light.
    Unknown = 3,
}

impl LightType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Directional,
            1 => Self::Point,
            2 => Self::Spot,
            _ => Self::Unknown,
        }
    }

    /// Whether the light has a position (and therefore distance attenuation).
    pub fn is_positional(self) -> bool {
        self != LightType::Directional
    }

    /// Whether the light has a cone.
    pub fn is_spot(self) -> bool {
        matches!(self, LightType::Spot | LightType::Unknown)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum LightComputation {
    #[default]
    OnlyDiffuse = 0,
    Both = 1,
    /// Diffuse and specular, with the diffuse term raised to the specular exponent.
    BothWithPoweredDiffuse = 2,
    /// Undocumented. Lit like [`LightComputation::Both`].
    Unknown = 3,
}

impl LightComputation {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::OnlyDiffuse,
            1 => Self::Both,
            2 => Self::BothWithPoweredDiffuse,
            _ => Self::Unknown,
        }
    }

    pub fn has_specular(self) -> bool {
        self != LightComputation::OnlyDiffuse
    }

    pub fn has_powered_diffuse(self) -> bool {
        self == LightComputation::BothWithPoweredDiffuse
    }
}

/// Storage format of a vertex element. Used for texcoords and bone weights, where the fixed-point
/// formats need a rescale in the shader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum NumericFormat {
    #[default]
    None = 0,
    Fixed8 = 1,
    Fixed16 = 2,
    Float = 3,
}

/// Shader-side rescale for each [`NumericFormat`]: `2 * 127.5 / 128` and `2 * 32767.5 / 32768`.
const RESCALE_SUFFIX: [&str; 4] = ["", " * 1.9921875", " * 1.999969482421875", ""];

impl NumericFormat {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::None,
            1 => Self::Fixed8,
            2 => Self::Fixed16,
            _ => Self::Float,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }

    pub fn is_present(self) -> bool {
        self != NumericFormat::None
    }

    /// GLSL suffix that rescales a value decoded from this format, e.g. `" * 1.9921875"`.
    pub fn rescale_suffix(self) -> &'static str {
        RESCALE_SUFFIX[self as usize]
    }
}

/// The GE vertex type word (`VTYPE`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VertexType(pub u32);

impl VertexType {
    pub const TC_SHIFT: u32 = 0;
    pub const TC_MASK: u32 = 3 << Self::TC_SHIFT;
    pub const COL_SHIFT: u32 = 2;
    pub const COL_MASK: u32 = 7 << Self::COL_SHIFT;
    pub const NRM_SHIFT: u32 = 5;
    pub const NRM_MASK: u32 = 3 << Self::NRM_SHIFT;
    pub const POS_SHIFT: u32 = 7;
    pub const POS_MASK: u32 = 3 << Self::POS_SHIFT;
    pub const WEIGHT_SHIFT: u32 = 9;
    pub const WEIGHT_MASK: u32 = 3 << Self::WEIGHT_SHIFT;
    pub const IDX_SHIFT: u32 = 11;
    pub const IDX_MASK: u32 = 3 << Self::IDX_SHIFT;
    pub const WEIGHTCOUNT_SHIFT: u32 = 14;
    pub const WEIGHTCOUNT_MASK: u32 = 7 << Self::WEIGHTCOUNT_SHIFT;
    pub const MORPHCOUNT_SHIFT: u32 = 18;
    pub const MORPHCOUNT_MASK: u32 = 7 << Self::MORPHCOUNT_SHIFT;
    pub const THROUGH_MASK: u32 = 1 << 23;

    /// Vertices are already in device coordinates.
    pub fn is_through(self) -> bool {
        self.0 & Self::THROUGH_MASK != 0
    }

    pub fn has_color(self) -> bool {
        self.0 & Self::COL_MASK != 0
    }

    pub fn has_normal(self) -> bool {
        self.0 & Self::NRM_MASK != 0
    }

    pub fn has_texcoord(self) -> bool {
        self.0 & Self::TC_MASK != 0
    }

    pub fn texcoord_format(self) -> NumericFormat {
        NumericFormat::from_bits((self.0 & Self::TC_MASK) >> Self::TC_SHIFT)
    }

    pub fn weight_format(self) -> NumericFormat {
        NumericFormat::from_bits((self.0 & Self::WEIGHT_MASK) >> Self::WEIGHT_SHIFT)
    }

    pub fn is_skinning_enabled(self) -> bool {
        self.weight_format().is_present()
    }

    /// Number of bone weights per vertex, 1..=8.
    pub fn bone_weight_count(self) -> u8 {
        1 + ((self.0 & Self::WEIGHTCOUNT_MASK) >> Self::WEIGHTCOUNT_SHIFT) as u8
    }
}

bitflags! {
    /// Feature enables for the current draw, as resolved by the command processor.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct EnabledFeatures: u32 {
        const TEXTURE = 1 << 0;
        const FOG = 1 << 1;
        const LIGHTS = 1 << 2;
        const LIGHT0 = 1 << 3;
        const LIGHT1 = 1 << 4;
        const LIGHT2 = 1 << 5;
        const LIGHT3 = 1 << 6;
        const BONES = 1 << 7;
    }
}

impl EnabledFeatures {
    /// The per-light enable for light `index` (0..4).
    pub fn light(index: usize) -> Self {
        debug_assert!(index < crate::MAX_LIGHTS, "light index {index} out of range");
        Self::from_bits_truncate(Self::LIGHT0.bits() << index)
    }
}

bitflags! {
    /// Material terms sourced from the vertex color instead of a uniform.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct MaterialUpdate: u8 {
        const AMBIENT = 1 << 0;
        const DIFFUSE = 1 << 1;
        const SPECULAR = 1 << 2;
    }
}
