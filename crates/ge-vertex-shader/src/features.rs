//! Decoded form of a [`VariantKey`].
//!
//! [`VertexShaderFeatures`] holds exactly the information the generator reads. The key's
//! overlapping bit ranges become tagged unions here: bits 18-21 belong to [`UvGen`], and bits
//! 60-61 carry either the "has texcoord" flag or the raw texcoord format of
//! [`UvProjection::Uv`]. Encoding writes each range according to its discriminant, so the two
//! meanings can never collide.

use crate::ge::{
    EnabledFeatures, LightComputation, LightType, MaterialUpdate, NumericFormat, ShadeMode,
    TexMapMode, TexProjMapMode,
};
use crate::key::{
    light_comp_bit, light_enable_bit, light_type_bit, VariantKey, VariantKeyError, BIT_BONES,
    BIT_DO_TEXTURE, BIT_DO_TEXTURE_PROJ, BIT_ENABLE_BONES, BIT_ENABLE_FOG, BIT_FLATSHADE,
    BIT_FLIP_TEXTURE, BIT_HAS_COLOR, BIT_HAS_NORMAL, BIT_HAS_TEXCOORD, BIT_IS_THROUGH,
    BIT_LIGHTING_ENABLE, BIT_LMODE, BIT_LS0, BIT_LS1, BIT_MATERIAL_UPDATE, BIT_NORM_REVERSE,
    BIT_TEXCOORD_FMTSCALE, BIT_USE_HW_TRANSFORM, BIT_UVGEN_MODE, BIT_UVPROJ_MODE,
    BIT_WEIGHT_FMTSCALE,
};
use crate::state::VertexShaderInputs;
use crate::{MAX_BONE_WEIGHTS, MAX_LIGHTS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexShaderFeatures {
    /// Separate specular: lighting writes specular to a secondary color varying.
    pub separate_specular: bool,
    pub through: bool,
    pub fog: bool,
    pub has_color: bool,
    /// `None` when texturing is off.
    pub texture: Option<TextureFeatures>,
    pub flat_shading: bool,
    /// `None` selects the software transform path.
    pub hardware: Option<HardwareTransform>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureFeatures {
    /// Sampling a render target; flip V.
    pub flip: bool,
    /// Texture-matrix projection with a 3-component texcoord varying.
    pub projection: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HardwareTransform {
    pub has_normal: bool,
    /// Whether the vertex has texcoords. Ignored under [`UvProjection::Uv`], where the texcoord
    /// format carries presence; use [`HardwareTransform::has_texcoord`].
    pub texcoord: bool,
    pub skinning: Option<Skinning>,
    pub uv_gen: UvGen,
    pub lighting: Option<Lighting>,
    pub reverse_normals: bool,
}

impl HardwareTransform {
    pub fn has_texcoord(&self) -> bool {
        match self.uv_gen {
            UvGen::TextureMatrix(UvProjection::Uv(format)) => format.is_present(),
            _ => self.texcoord,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Skinning {
    /// 1..=8.
    pub weights: u8,
    pub weight_format: NumericFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UvGen {
    #[default]
    TextureCoords,
    TextureMatrix(UvProjection),
    /// Shade mapping from the dot products of two lights with the normal.
    EnvironmentMap { light0: u8, light1: u8 },
    /// Treated like [`UvGen::TextureCoords`].
    Unknown,
}

impl UvGen {
    pub fn mode(self) -> TexMapMode {
        match self {
            UvGen::TextureCoords => TexMapMode::TextureCoords,
            UvGen::TextureMatrix(_) => TexMapMode::TextureMatrix,
            UvGen::EnvironmentMap { .. } => TexMapMode::EnvironmentMap,
            UvGen::Unknown => TexMapMode::Unknown,
        }
    }

    /// Light indices feeding shade mapping, wrapped to the four hardware lights the same way the
    /// key stores them.
    pub fn shade_lights(self) -> Option<[u8; 2]> {
        match self {
            UvGen::EnvironmentMap { light0, light1 } => Some([light0 & 3, light1 & 3]),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UvProjection {
    Position,
    /// Raw texcoords in the given vertex format; [`NumericFormat::None`] when absent.
    Uv(NumericFormat),
    NormalizedNormal,
    Normal,
}

impl UvProjection {
    pub fn mode(self) -> TexProjMapMode {
        match self {
            UvProjection::Position => TexProjMapMode::Position,
            UvProjection::Uv(_) => TexProjMapMode::Uv,
            UvProjection::NormalizedNormal => TexProjMapMode::NormalizedNormal,
            UvProjection::Normal => TexProjMapMode::Normal,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Lighting {
    pub material_update: MaterialUpdate,
    /// `Some` for each enabled light.
    pub lights: [Option<LightSlot>; MAX_LIGHTS],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LightSlot {
    pub computation: LightComputation,
    pub light_type: LightType,
}

/// How much of a light the generated shader evaluates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightMode {
    Off,
    /// Only the position, for shade mapping.
    Shade,
    Full(LightSlot),
}

impl VertexShaderFeatures {
    /// Derives the features a draw needs from its render state.
    pub fn from_inputs(inputs: &VertexShaderInputs) -> Self {
        let vt = inputs.vertex_type;
        let enabled = inputs.enabled;
        let ts = &inputs.tex_scale;
        let lgs = &inputs.light_global;

        let through = vt.is_through();
        let clear_mode = inputs.raster.clear_mode;
        let do_texture = enabled.contains(EnabledFeatures::TEXTURE) && !clear_mode;
        let do_texture_projection = ts.uv_gen_mode == TexMapMode::TextureMatrix;
        let do_shade_mapping = ts.uv_gen_mode == TexMapMode::EnvironmentMap;

        let texture = do_texture.then_some(TextureFeatures {
            flip: inputs.flip_texture,
            projection: do_texture_projection,
        });

        let hardware = inputs.use_hardware_transform.then(|| {
            // Without texturing only shade mapping has an effect, through its light uniforms.
            let uv_gen = match ts.uv_gen_mode {
                TexMapMode::TextureCoords => UvGen::TextureCoords,
                TexMapMode::TextureMatrix | TexMapMode::Unknown if !do_texture => {
                    UvGen::TextureCoords
                }
                TexMapMode::TextureMatrix => UvGen::TextureMatrix(match ts.uv_proj_mode {
                    TexProjMapMode::Position => UvProjection::Position,
                    TexProjMapMode::Uv => UvProjection::Uv(vt.texcoord_format()),
                    TexProjMapMode::NormalizedNormal => UvProjection::NormalizedNormal,
                    TexProjMapMode::Normal => UvProjection::Normal,
                }),
                TexMapMode::EnvironmentMap => UvGen::EnvironmentMap {
                    light0: ts.uv_light_sources[0] & 3,
                    light1: ts.uv_light_sources[1] & 3,
                },
                TexMapMode::Unknown => UvGen::Unknown,
            };

            // The bone count is only read from a skinned vertex format; otherwise it stays at
            // one weight.
            let skinning = enabled.contains(EnabledFeatures::BONES).then(|| Skinning {
                weights: if vt.is_skinning_enabled() {
                    vt.bone_weight_count()
                } else {
                    1
                },
                weight_format: vt.weight_format(),
            });

            let lighting = (enabled.contains(EnabledFeatures::LIGHTS) || do_shade_mapping).then(
                || {
                    let mut lights = [None; MAX_LIGHTS];
                    for (i, slot) in lights.iter_mut().enumerate() {
                        if enabled.contains(EnabledFeatures::light(i)) {
                            *slot = Some(LightSlot {
                                computation: inputs.lights[i].computation,
                                light_type: inputs.lights[i].light_type,
                            });
                        }
                    }
                    Lighting {
                        material_update: lgs.material_update,
                        lights,
                    }
                },
            );

            HardwareTransform {
                has_normal: vt.has_normal(),
                texcoord: do_texture && vt.has_texcoord(),
                skinning,
                uv_gen,
                lighting,
                reverse_normals: lgs.reverse_normals,
            }
        });

        Self {
            separate_specular: lgs.separate_specular
                && enabled.contains(EnabledFeatures::LIGHTS),
            through,
            fog: enabled.contains(EnabledFeatures::FOG) && !through && !clear_mode,
            has_color: vt.has_color(),
            texture,
            flat_shading: inputs.raster.shade_mode == ShadeMode::Flat && !clear_mode,
            hardware,
        }
    }

    /// Packs these features into a key.
    pub fn to_key(&self) -> VariantKey {
        let mut key = VariantKey::default();

        key.set_bit(BIT_LMODE, self.separate_specular);
        key.set_bit(BIT_IS_THROUGH, self.through);
        key.set_bit(BIT_ENABLE_FOG, self.fog);
        key.set_bit(BIT_HAS_COLOR, self.has_color);
        if let Some(texture) = self.texture {
            key.set_bit(BIT_DO_TEXTURE, true);
            key.set_bit(BIT_FLIP_TEXTURE, texture.flip);
            key.set_bit(BIT_DO_TEXTURE_PROJ, texture.projection);
        }

        if let Some(hw) = &self.hardware {
            key.set_bit(BIT_USE_HW_TRANSFORM, true);
            key.set_bit(BIT_HAS_NORMAL, hw.has_normal);

            key.set_bits(BIT_UVGEN_MODE, 2, hw.uv_gen.mode() as u32);
            match hw.uv_gen {
                UvGen::TextureMatrix(projection) => {
                    key.set_bits(BIT_UVPROJ_MODE, 2, projection.mode() as u32);
                }
                UvGen::EnvironmentMap { light0, light1 } => {
                    key.set_bits(BIT_LS0, 2, u32::from(light0 & 3));
                    key.set_bits(BIT_LS1, 2, u32::from(light1 & 3));
                }
                UvGen::TextureCoords | UvGen::Unknown => {}
            }

            if let Some(skinning) = hw.skinning {
                debug_assert!((1..=MAX_BONE_WEIGHTS).contains(&skinning.weights));
                key.set_bit(BIT_ENABLE_BONES, true);
                key.set_bits(BIT_BONES, 3, u32::from(skinning.weights.clamp(1, 8) - 1));
                key.set_bits(BIT_WEIGHT_FMTSCALE, 2, skinning.weight_format.bits());
            }

            if let Some(lighting) = &hw.lighting {
                for (i, slot) in lighting.lights.iter().enumerate() {
                    if let Some(slot) = slot {
                        key.set_bits(light_comp_bit(i), 2, slot.computation as u32);
                        key.set_bits(light_type_bit(i), 2, slot.light_type as u32);
                        key.set_bit(light_enable_bit(i), true);
                    }
                }
                key.set_bits(
                    BIT_MATERIAL_UPDATE,
                    3,
                    u32::from(lighting.material_update.bits()),
                );
                key.set_bit(BIT_LIGHTING_ENABLE, true);
            }

            key.set_bit(BIT_NORM_REVERSE, hw.reverse_normals);
            match hw.uv_gen {
                UvGen::TextureMatrix(UvProjection::Uv(format)) => {
                    key.set_bits(BIT_TEXCOORD_FMTSCALE, 2, format.bits());
                }
                _ => key.set_bit(BIT_HAS_TEXCOORD, hw.texcoord),
            }
        }

        key.set_bit(BIT_FLATSHADE, self.flat_shading);
        key
    }

    /// Decodes a key. Fails unless `key` is exactly what [`Self::to_key`] produces for the decoded
    /// features, so accepted keys and features correspond one to one.
    pub fn decode(key: VariantKey) -> Result<Self, VariantKeyError> {
        if let Some((word, bits)) = key.reserved_bits() {
            return Err(VariantKeyError::ReservedBits { key, word, bits });
        }

        let texture = key.bit(BIT_DO_TEXTURE).then(|| TextureFeatures {
            flip: key.bit(BIT_FLIP_TEXTURE),
            projection: key.bit(BIT_DO_TEXTURE_PROJ),
        });

        let hardware = key.bit(BIT_USE_HW_TRANSFORM).then(|| {
            let uv_gen = match TexMapMode::from_bits(key.bits(BIT_UVGEN_MODE, 2)) {
                TexMapMode::TextureCoords => UvGen::TextureCoords,
                TexMapMode::TextureMatrix => UvGen::TextureMatrix(
                    match TexProjMapMode::from_bits(key.bits(BIT_UVPROJ_MODE, 2)) {
                        TexProjMapMode::Position => UvProjection::Position,
                        TexProjMapMode::Uv => UvProjection::Uv(NumericFormat::from_bits(
                            key.bits(BIT_TEXCOORD_FMTSCALE, 2),
                        )),
                        TexProjMapMode::NormalizedNormal => UvProjection::NormalizedNormal,
                        TexProjMapMode::Normal => UvProjection::Normal,
                    },
                ),
                TexMapMode::EnvironmentMap => UvGen::EnvironmentMap {
                    light0: key.bits(BIT_LS0, 2) as u8,
                    light1: key.bits(BIT_LS1, 2) as u8,
                },
                TexMapMode::Unknown => UvGen::Unknown,
            };

            let skinning = key.bit(BIT_ENABLE_BONES).then(|| Skinning {
                weights: key.bits(BIT_BONES, 3) as u8 + 1,
                weight_format: NumericFormat::from_bits(key.bits(BIT_WEIGHT_FMTSCALE, 2)),
            });

            let lighting = key.bit(BIT_LIGHTING_ENABLE).then(|| {
                let mut lights = [None; MAX_LIGHTS];
                for (i, slot) in lights.iter_mut().enumerate() {
                    if key.bit(light_enable_bit(i)) {
                        *slot = Some(LightSlot {
                            computation: LightComputation::from_bits(
                                key.bits(light_comp_bit(i), 2),
                            ),
                            light_type: LightType::from_bits(key.bits(light_type_bit(i), 2)),
                        });
                    }
                }
                Lighting {
                    material_update: MaterialUpdate::from_bits_truncate(
                        key.bits(BIT_MATERIAL_UPDATE, 3) as u8,
                    ),
                    lights,
                }
            });

            let texcoord = match uv_gen {
                UvGen::TextureMatrix(UvProjection::Uv(format)) => format.is_present(),
                _ => key.bit(BIT_HAS_TEXCOORD),
            };

            HardwareTransform {
                has_normal: key.bit(BIT_HAS_NORMAL),
                texcoord,
                skinning,
                uv_gen,
                lighting,
                reverse_normals: key.bit(BIT_NORM_REVERSE),
            }
        });

        let features = Self {
            separate_specular: key.bit(BIT_LMODE),
            through: key.bit(BIT_IS_THROUGH),
            fog: key.bit(BIT_ENABLE_FOG),
            has_color: key.bit(BIT_HAS_COLOR),
            texture,
            flat_shading: key.bit(BIT_FLATSHADE),
            hardware,
        };

        let canonical = features.to_key();
        if canonical != key {
            return Err(VariantKeyError::NonCanonical { key, canonical });
        }
        if let Some(reason) = features.inconsistency() {
            return Err(VariantKeyError::Inconsistent { key, reason });
        }
        Ok(features)
    }

    /// Combinations the encoder never produces from real render state.
    fn inconsistency(&self) -> Option<&'static str> {
        let hw = self.hardware.as_ref()?;
        match self.texture {
            Some(texture) => {
                let is_matrix = matches!(hw.uv_gen, UvGen::TextureMatrix(_));
                if texture.projection != is_matrix {
                    return Some("texture projection flag disagrees with UV generation mode");
                }
            }
            None => {
                if matches!(hw.uv_gen, UvGen::TextureMatrix(_) | UvGen::Unknown) {
                    return Some("UV generation mode set without texturing");
                }
                if hw.texcoord {
                    return Some("texcoord presence set without texturing");
                }
            }
        }
        None
    }

    /// Whether the texcoord attribute exists. The software path always supplies one.
    pub fn has_texcoord(&self) -> bool {
        self.hardware.as_ref().map_or(true, HardwareTransform::has_texcoord)
    }

    pub fn has_normal(&self) -> bool {
        self.hardware.as_ref().is_some_and(|hw| hw.has_normal)
    }

    pub fn lighting(&self) -> Option<&Lighting> {
        self.hardware.as_ref().and_then(|hw| hw.lighting.as_ref())
    }

    pub fn uv_gen(&self) -> UvGen {
        self.hardware.as_ref().map_or(UvGen::TextureCoords, |hw| hw.uv_gen)
    }

    /// Per-light evaluation mode. Lights feeding shade mapping need at least their position; a
    /// light enabled under lighting is evaluated in full.
    pub fn light_modes(&self) -> [LightMode; MAX_LIGHTS] {
        let mut modes = [LightMode::Off; MAX_LIGHTS];
        let Some(hw) = &self.hardware else {
            return modes;
        };

        let shade_lights = hw.uv_gen.shade_lights();
        for (i, mode) in modes.iter_mut().enumerate() {
            if shade_lights.is_some_and(|lights| lights.contains(&(i as u8))) {
                *mode = LightMode::Shade;
            }
            if let Some(slot) = hw.lighting.as_ref().and_then(|l| l.lights[i]) {
                *mode = LightMode::Full(slot);
            }
        }
        modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ge::VertexType;
    use crate::state::{LightGlobalState, LightState, RasterState, TexScaleState};

    fn hw_inputs() -> VertexShaderInputs {
        VertexShaderInputs {
            vertex_type: VertexType(
                3 << VertexType::TC_SHIFT | 7 << VertexType::COL_SHIFT | 3 << VertexType::NRM_SHIFT,
            ),
            enabled: EnabledFeatures::TEXTURE,
            use_hardware_transform: true,
            ..VertexShaderInputs::default()
        }
    }

    #[test]
    fn clear_mode_suppresses_texture_fog_and_flat_shading() {
        let inputs = VertexShaderInputs {
            enabled: EnabledFeatures::TEXTURE | EnabledFeatures::FOG,
            raster: RasterState {
                clear_mode: true,
                shade_mode: ShadeMode::Flat,
            },
            ..VertexShaderInputs::default()
        };
        let features = VertexShaderFeatures::from_inputs(&inputs);
        assert_eq!(features.texture, None);
        assert!(!features.fog);
        assert!(!features.flat_shading);
    }

    #[test]
    fn through_mode_disables_fog() {
        let inputs = VertexShaderInputs {
            vertex_type: VertexType(VertexType::THROUGH_MASK),
            enabled: EnabledFeatures::FOG,
            ..VertexShaderInputs::default()
        };
        let features = VertexShaderFeatures::from_inputs(&inputs);
        assert!(features.through);
        assert!(!features.fog);
    }

    #[test]
    fn software_path_always_has_texcoord() {
        let features = VertexShaderFeatures::from_inputs(&VertexShaderInputs::default());
        assert!(features.hardware.is_none());
        assert!(features.has_texcoord());
        assert!(!features.has_normal());
    }

    #[test]
    fn separate_specular_requires_lights() {
        let mut inputs = VertexShaderInputs {
            light_global: LightGlobalState {
                separate_specular: true,
                ..LightGlobalState::default()
            },
            ..VertexShaderInputs::default()
        };
        assert!(!VertexShaderFeatures::from_inputs(&inputs).separate_specular);
        inputs.enabled = EnabledFeatures::LIGHTS;
        assert!(VertexShaderFeatures::from_inputs(&inputs).separate_specular);
    }

    #[test]
    fn uv_projection_and_shade_lights_share_bits() {
        let mut inputs = hw_inputs();
        inputs.tex_scale = TexScaleState {
            uv_gen_mode: TexMapMode::TextureMatrix,
            uv_proj_mode: TexProjMapMode::Normal,
            uv_light_sources: [1, 2],
        };
        let matrix_key = crate::build_variant_key(&inputs);
        assert_eq!(matrix_key.bits(BIT_UVPROJ_MODE, 2), 3);
        assert_eq!(matrix_key.bits(BIT_LS1, 2), 0);

        inputs.tex_scale.uv_gen_mode = TexMapMode::EnvironmentMap;
        let env_key = crate::build_variant_key(&inputs);
        assert_eq!(env_key.bits(BIT_LS0, 2), 1);
        assert_eq!(env_key.bits(BIT_LS1, 2), 2);

        inputs.tex_scale.uv_gen_mode = TexMapMode::TextureCoords;
        let coords_key = crate::build_variant_key(&inputs);
        assert_eq!(coords_key.bits(BIT_UVPROJ_MODE, 4), 0);
    }

    #[test]
    fn uv_projection_stores_texcoord_format_instead_of_presence() {
        let mut inputs = hw_inputs();
        inputs.vertex_type = VertexType(1 << VertexType::TC_SHIFT);
        inputs.tex_scale.uv_gen_mode = TexMapMode::TextureMatrix;
        inputs.tex_scale.uv_proj_mode = TexProjMapMode::Uv;
        let key = crate::build_variant_key(&inputs);
        assert_eq!(key.bits(BIT_TEXCOORD_FMTSCALE, 2), 1);

        inputs.vertex_type = VertexType(2 << VertexType::TC_SHIFT);
        let key16 = crate::build_variant_key(&inputs);
        assert_eq!(key16.bits(BIT_TEXCOORD_FMTSCALE, 2), 2);
        assert_ne!(key, key16);

        let features = VertexShaderFeatures::decode(key16).unwrap();
        assert!(features.has_texcoord());

        inputs.tex_scale.uv_proj_mode = TexProjMapMode::Position;
        let position_key = crate::build_variant_key(&inputs);
        assert_eq!(position_key.bits(BIT_TEXCOORD_FMTSCALE, 2), 1);
        assert!(VertexShaderFeatures::decode(position_key)
            .unwrap()
            .has_texcoord());
    }

    #[test]
    fn skinning_follows_bones_enable() {
        let mut inputs = hw_inputs();
        inputs.vertex_type = VertexType(
            2 << VertexType::WEIGHT_SHIFT | 3 << VertexType::WEIGHTCOUNT_SHIFT,
        );
        let hw = VertexShaderFeatures::from_inputs(&inputs).hardware.unwrap();
        assert_eq!(hw.skinning, None);

        inputs.enabled |= EnabledFeatures::BONES;
        let hw = VertexShaderFeatures::from_inputs(&inputs).hardware.unwrap();
        assert_eq!(
            hw.skinning,
            Some(Skinning {
                weights: 4,
                weight_format: NumericFormat::Fixed16,
            })
        );
    }

    #[test]
    fn bones_enable_without_vertex_weights_skins_one_weight() {
        let mut inputs = hw_inputs();
        inputs.vertex_type = VertexType(3 << VertexType::WEIGHTCOUNT_SHIFT);
        inputs.enabled |= EnabledFeatures::BONES;

        let key = crate::build_variant_key(&inputs);
        assert!(key.bit(BIT_ENABLE_BONES));
        assert_eq!(key.bits(BIT_BONES, 3), 0);
        assert_eq!(key.bits(BIT_WEIGHT_FMTSCALE, 2), 0);

        let features = VertexShaderFeatures::decode(key).unwrap();
        assert_eq!(
            features.hardware.unwrap().skinning,
            Some(Skinning {
                weights: 1,
                weight_format: NumericFormat::None,
            })
        );
    }

    #[test]
    fn uv_mode_is_normalized_without_texturing() {
        let mut inputs = hw_inputs();
        inputs.enabled = EnabledFeatures::empty();
        let coords_key = crate::build_variant_key(&inputs);

        inputs.tex_scale.uv_gen_mode = TexMapMode::TextureMatrix;
        inputs.tex_scale.uv_proj_mode = TexProjMapMode::Normal;
        assert_eq!(crate::build_variant_key(&inputs), coords_key);
        inputs.tex_scale.uv_gen_mode = TexMapMode::Unknown;
        assert_eq!(crate::build_variant_key(&inputs), coords_key);
        assert!(!coords_key.bit(BIT_HAS_TEXCOORD));

        // Shade mapping still declares its light positions.
        inputs.tex_scale.uv_gen_mode = TexMapMode::EnvironmentMap;
        assert_ne!(crate::build_variant_key(&inputs), coords_key);
    }

    #[test]
    fn decode_rejects_uv_mode_without_texturing() {
        let mut key = crate::build_variant_key(&VertexShaderInputs {
            use_hardware_transform: true,
            ..VertexShaderInputs::default()
        });
        key.set_bits(BIT_UVGEN_MODE, 2, TexMapMode::TextureMatrix as u32);
        assert!(matches!(
            VertexShaderFeatures::decode(key),
            Err(VariantKeyError::Inconsistent { .. })
        ));
    }

    #[test]
    fn shade_lights_wrap_to_hardware_lights() {
        let uv_gen = UvGen::EnvironmentMap {
            light0: 5,
            light1: 1,
        };
        assert_eq!(uv_gen.shade_lights(), Some([1, 1]));
        let features = VertexShaderFeatures {
            hardware: Some(HardwareTransform {
                uv_gen,
                ..HardwareTransform::default()
            }),
            ..VertexShaderFeatures::default()
        };
        assert_eq!(features.light_modes()[1], LightMode::Shade);
    }

    #[test]
    fn light_modes_prefer_full_over_shade() {
        let mut inputs = hw_inputs();
        inputs.enabled |= EnabledFeatures::LIGHTS | EnabledFeatures::LIGHT1;
        inputs.lights[1] = LightState {
            computation: LightComputation::Both,
            light_type: LightType::Point,
        };
        inputs.tex_scale = TexScaleState {
            uv_gen_mode: TexMapMode::EnvironmentMap,
            uv_proj_mode: TexProjMapMode::Position,
            uv_light_sources: [1, 3],
        };
        let features = VertexShaderFeatures::from_inputs(&inputs);
        let modes = features.light_modes();
        assert_eq!(modes[0], LightMode::Off);
        assert_eq!(
            modes[1],
            LightMode::Full(LightSlot {
                computation: LightComputation::Both,
                light_type: LightType::Point,
            })
        );
        assert_eq!(modes[2], LightMode::Off);
        assert_eq!(modes[3], LightMode::Shade);
    }

    #[test]
    fn decode_rejects_hardware_fields_without_hardware_flag() {
        let mut key = VariantKey::default();
        key.set_bit(BIT_HAS_NORMAL, true);
        assert!(matches!(
            VertexShaderFeatures::decode(key),
            Err(VariantKeyError::NonCanonical { .. })
        ));
    }

    #[test]
    fn decode_rejects_disabled_light_with_parameters() {
        let mut inputs = hw_inputs();
        inputs.enabled |= EnabledFeatures::LIGHTS;
        let key = crate::build_variant_key(&inputs);
        let tampered = VariantKey::from_words([key.words()[0] | (1 << light_type_bit(2)), 0]);
        assert!(matches!(
            VertexShaderFeatures::decode(tampered),
            Err(VariantKeyError::NonCanonical { .. })
        ));
    }

    #[test]
    fn decode_rejects_projection_flag_mismatch() {
        let mut inputs = hw_inputs();
        inputs.tex_scale.uv_gen_mode = TexMapMode::TextureMatrix;
        let key = crate::build_variant_key(&inputs);
        assert!(key.bit(BIT_DO_TEXTURE_PROJ));
        let tampered = VariantKey::from_words([key.words()[0] & !(1 << BIT_DO_TEXTURE_PROJ), 0]);
        assert!(matches!(
            VertexShaderFeatures::decode(tampered),
            Err(VariantKeyError::Inconsistent { .. })
        ));
    }

    #[test]
    fn decode_inverts_encode() {
        let mut inputs = hw_inputs();
        inputs.enabled |= EnabledFeatures::LIGHTS
            | EnabledFeatures::LIGHT0
            | EnabledFeatures::LIGHT3
            | EnabledFeatures::FOG;
        inputs.lights[3] = LightState {
            computation: LightComputation::BothWithPoweredDiffuse,
            light_type: LightType::Spot,
        };
        inputs.light_global.material_update = MaterialUpdate::DIFFUSE | MaterialUpdate::SPECULAR;
        inputs.light_global.reverse_normals = true;
        inputs.flip_texture = true;
        let features = VertexShaderFeatures::from_inputs(&inputs);
        let key = features.to_key();
        assert_eq!(VertexShaderFeatures::decode(key), Ok(features));
    }
}
