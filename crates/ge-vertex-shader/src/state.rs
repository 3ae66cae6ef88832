//! Render state consumed by the variant key encoder.
//!
//! These are snapshots of state owned by the command processor. The encoder only reads them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ge::{
    EnabledFeatures, LightComputation, LightType, MaterialUpdate, ShadeMode, TexMapMode,
    TexProjMapMode, VertexType,
};
use crate::MAX_LIGHTS;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RasterState {
    /// Clear mode draws. Texturing, fog and flat shading have no effect.
    pub clear_mode: bool,
    pub shade_mode: ShadeMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TexScaleState {
    pub uv_gen_mode: TexMapMode,
    /// Only meaningful under [`TexMapMode::TextureMatrix`].
    pub uv_proj_mode: TexProjMapMode,
    /// Lights feeding the two environment map coordinates. Only meaningful under
    /// [`TexMapMode::EnvironmentMap`].
    pub uv_light_sources: [u8; 2],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LightGlobalState {
    /// Separate specular color: specular goes to the secondary color output.
    pub separate_specular: bool,
    pub material_update: MaterialUpdate,
    pub reverse_normals: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LightState {
    pub computation: LightComputation,
    pub light_type: LightType,
}

/// Everything the encoder reads for one draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VertexShaderInputs {
    pub vertex_type: VertexType,
    pub enabled: EnabledFeatures,
    pub raster: RasterState,
    pub tex_scale: TexScaleState,
    pub light_global: LightGlobalState,
    pub lights: [LightState; MAX_LIGHTS],
    /// The bound texture is a render target and must be sampled upside down.
    pub flip_texture: bool,
    /// Result of [`crate::can_use_hardware_transform`] for this draw.
    pub use_hardware_transform: bool,
}
