//! Explicit generator configuration.
//!
//! Nothing in this crate reads process-wide settings. Callers resolve their configuration and GPU
//! capabilities once and pass them in.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The graphics API the generated source targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GlTarget {
    /// OpenGL ES. `es3` selects GLSL ES 3.00 over GLSL ES 1.00.
    Gles { es3: bool },
    /// Desktop OpenGL with the given context version.
    Desktop { major: u8, minor: u8 },
}

impl GlTarget {
    pub fn version_at_least(self, major: u8, minor: u8) -> bool {
        match self {
            GlTarget::Gles { .. } => false,
            GlTarget::Desktop {
                major: have_major,
                minor: have_minor,
            } => (have_major, have_minor) >= (major, minor),
        }
    }
}

impl Default for GlTarget {
    fn default() -> Self {
        GlTarget::Desktop { major: 3, minor: 3 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GpuCaps {
    pub target: GlTarget,
    /// The driver computes mediump varyings too imprecisely for fog and texcoords (seen on some
    /// PowerVR parts). Only honored on GLES.
    pub shader_precision_bug: bool,
    /// Emit unversioned legacy GLSL regardless of `target`, for platforms whose contexts lack the
    /// modern profiles.
    pub force_legacy_profile: bool,
}

/// Generator configuration.
///
/// Generated text depends on this value as well as on the variant key. Callers that cache compiled
/// programs by key must drop the cache when the configuration changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShaderGenConfig {
    /// Allow the hardware transform path at all.
    pub hardware_transform: bool,
    /// Texture coordinates are pre-scaled during vertex decoding, so the shader can skip the
    /// UV scale/offset.
    pub prescale_uv: bool,
    pub caps: GpuCaps,
}

impl Default for ShaderGenConfig {
    fn default() -> Self {
        Self {
            hardware_transform: true,
            prescale_uv: false,
            caps: GpuCaps::default(),
        }
    }
}
