//! Vertex shader variant keys and GLSL source generation for the emulated GE transform and
//! lighting pipeline.
//!
//! The GE exposes its per-vertex pipeline through fixed-function registers. The host renderer only
//! runs programmable shaders, so every distinct combination of enabled features maps to one
//! generated program:
//!
//! 1. [`can_use_hardware_transform`] decides whether the draw may use the hardware transform path.
//! 2. [`build_variant_key`] packs the relevant render state into a [`VariantKey`].
//! 3. On a cache miss, [`VertexShaderGenerator::generate`] turns the same key into GLSL source.
//!
//! Key encoding and source generation are pure functions of their inputs and may be called from
//! any thread. Caching compiled programs is the caller's job.

pub mod config;
pub mod dialect;
mod emit;
pub mod features;
pub mod gate;
pub mod ge;
pub mod key;
pub mod state;
pub mod vertex_gen;

pub use config::{GlTarget, GpuCaps, ShaderGenConfig};
pub use dialect::{ShaderDialect, ShaderProfile};
pub use features::{
    HardwareTransform, LightMode, LightSlot, Lighting, Skinning, TextureFeatures, UvGen,
    UvProjection, VertexShaderFeatures,
};
pub use gate::can_use_hardware_transform;
pub use ge::{
    EnabledFeatures, LightComputation, LightType, MaterialUpdate, NumericFormat, PrimitiveKind,
    ShadeMode, TexMapMode, TexProjMapMode, VertexType,
};
pub use key::{ParseVariantKeyError, VariantKey, VariantKeyError};
pub use state::{LightGlobalState, LightState, RasterState, TexScaleState, VertexShaderInputs};
pub use vertex_gen::{generate_vertex_source, VertexShaderGenerator};

/// Number of hardware lights.
pub const MAX_LIGHTS: usize = 4;

/// Maximum number of bone weights per vertex.
pub const MAX_BONE_WEIGHTS: u8 = 8;

/// Builds the variant key for a draw. See [`VertexShaderFeatures::from_inputs`].
pub fn build_variant_key(inputs: &VertexShaderInputs) -> VariantKey {
    let key = VertexShaderFeatures::from_inputs(inputs).to_key();
    tracing::trace!(%key, "built vertex shader variant key");
    key
}
