//! GLSL vertex shader generation.
//!
//! The generated program reproduces the GE per-vertex pipeline for one variant: skinning, world
//! and view transform, up to four lights, texture coordinate generation and fog depth. On the
//! software transform path the CPU already did all of that, and the shader only forwards the
//! decoded vertex.

use tracing::{debug, trace};

use crate::config::ShaderGenConfig;
use crate::dialect::ShaderDialect;
use crate::emit::{decl, stmt, SourceWriter};
use crate::features::{HardwareTransform, LightMode, LightSlot, UvGen, UvProjection};
use crate::ge::{LightType, MaterialUpdate};
use crate::key::{VariantKey, VariantKeyError};
use crate::{VertexShaderFeatures, MAX_BONE_WEIGHTS};

/// Weight attribute types by weight count: `w1`, then `w2` for counts above four.
const BONE_WEIGHT_DECLS: [(&str, Option<&str>); MAX_BONE_WEIGHTS as usize] = [
    ("float", None),
    ("vec2", None),
    ("vec3", None),
    ("vec4", None),
    ("vec4", Some("float")),
    ("vec4", Some("vec2")),
    ("vec4", Some("vec3")),
    ("vec4", Some("vec4")),
];

const BONE_WEIGHT_ATTRS: [&str; MAX_BONE_WEIGHTS as usize] = [
    "w1.x", "w1.y", "w1.z", "w1.w", "w2.x", "w2.y", "w2.z", "w2.w",
];

/// Generates vertex shader source for variant keys under one configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexShaderGenerator {
    dialect: ShaderDialect,
    prescale_uv: bool,
}

impl VertexShaderGenerator {
    pub fn new(config: &ShaderGenConfig) -> Self {
        Self {
            dialect: ShaderDialect::select(&config.caps),
            prescale_uv: config.prescale_uv,
        }
    }

    pub fn dialect(&self) -> &ShaderDialect {
        &self.dialect
    }

    /// Decodes `key` and generates its source. Keys that [`crate::build_variant_key`] cannot
    /// produce are rejected.
    pub fn generate(&self, key: VariantKey) -> Result<String, VariantKeyError> {
        let features = VertexShaderFeatures::decode(key).inspect_err(|err| {
            debug!(%err, "rejected vertex shader variant key");
        })?;
        let source = self.generate_features(&features);
        trace!(%key, bytes = source.len(), "generated vertex shader");
        Ok(source)
    }

    pub fn generate_features(&self, features: &VertexShaderFeatures) -> String {
        let mut w = SourceWriter::new();
        self.dialect.write_preamble(&mut w);

        let ctx = Context::new(features, self.prescale_uv);
        self.write_inputs(&mut w, &ctx);
        self.write_uniforms(&mut w, &ctx);
        self.write_varyings(&mut w, &ctx);
        match &features.hardware {
            None => write_software_body(&mut w, &ctx),
            Some(hw) => write_hardware_body(&mut w, &ctx, hw),
        }
        w.finish()
    }

    fn write_inputs(&self, w: &mut SourceWriter, ctx: &Context<'_>) {
        let attribute = self.dialect.attribute();
        let f = ctx.features;

        if let Some(skinning) = ctx.hw.and_then(|hw| hw.skinning) {
            let index = usize::from(skinning.weights.clamp(1, MAX_BONE_WEIGHTS) - 1);
            if let Some((w1, w2)) = BONE_WEIGHT_DECLS.get(index) {
                decl!(w, "{attribute} mediump {w1} w1;");
                if let Some(w2) = w2 {
                    decl!(w, "{attribute} mediump {w2} w2;");
                }
            }
        }

        if ctx.hw.is_some() {
            decl!(w, "{attribute} vec3 position;");
        } else {
            // w carries the fog depth.
            decl!(w, "{attribute} vec4 position;");
        }
        if f.has_normal() {
            decl!(w, "{attribute} mediump vec3 normal;");
        }
        if ctx.do_texture && ctx.has_texcoord {
            if ctx.hw.is_none() && ctx.projection && !f.through {
                decl!(w, "{attribute} vec3 texcoord;");
            } else {
                decl!(w, "{attribute} vec2 texcoord;");
            }
        }
        if f.has_color {
            decl!(w, "{attribute} lowp vec4 color0;");
            // Only software transform supplies a secondary color.
            if f.separate_specular && ctx.hw.is_none() {
                decl!(w, "{attribute} lowp vec3 color1;");
            }
        }
    }

    fn write_uniforms(&self, w: &mut SourceWriter, ctx: &Context<'_>) {
        let f = ctx.features;
        decl!(w, "uniform mat4 {};", ctx.projection_uniform);

        if let Some(hw) = ctx.hw {
            decl!(w, "uniform mat4 u_world;");
            decl!(w, "uniform mat4 u_view;");
            if ctx.projection {
                decl!(w, "uniform mediump mat4 u_texmtx;");
            }
            if let Some(skinning) = hw.skinning {
                for i in 0..skinning.weights.clamp(1, MAX_BONE_WEIGHTS) {
                    decl!(w, "uniform mat4 u_bone{i};");
                }
            }
            if ctx.do_texture
                && (ctx.flip
                    || !ctx.prescale
                    || matches!(
                        hw.uv_gen,
                        UvGen::EnvironmentMap { .. } | UvGen::TextureMatrix(_)
                    ))
            {
                decl!(w, "uniform vec4 u_uvscaleoffset;");
            }

            for (i, mode) in ctx.light_modes.iter().enumerate() {
                if *mode != LightMode::Off {
                    decl!(w, "uniform vec3 u_lightpos{i};");
                }
                if let LightMode::Full(slot) = mode {
                    write_light_uniforms(w, i, slot);
                }
            }

            if let Some(lighting) = &hw.lighting {
                decl!(w, "uniform lowp vec4 u_ambient;");
                if !lighting.material_update.contains(MaterialUpdate::DIFFUSE) || !f.has_color {
                    decl!(w, "uniform lowp vec3 u_matdiffuse;");
                }
                // Alpha holds the specular exponent.
                decl!(w, "uniform lowp vec4 u_matspecular;");
                decl!(w, "uniform lowp vec3 u_matemissive;");
            }
        }

        if ctx.hw.is_some() || !f.has_color {
            decl!(w, "uniform lowp vec4 u_matambientalpha;");
        }
        if f.fog {
            decl!(w, "uniform highp vec2 u_fogcoef;");
        }
    }

    fn write_varyings(&self, w: &mut SourceWriter, ctx: &Context<'_>) {
        let f = ctx.features;
        let varying = self.dialect.varying();
        let precision = self.dialect.varying_precision();
        let shading = if f.flat_shading && self.dialect.supports_flat() {
            "flat "
        } else {
            ""
        };

        decl!(w, "{shading}{varying} lowp vec4 v_color0;");
        if f.separate_specular {
            decl!(w, "{shading}{varying} lowp vec3 v_color1;");
        }
        if ctx.do_texture {
            let ty = if ctx.projection { "vec3" } else { "vec2" };
            decl!(w, "{varying} {precision} {ty} v_texcoord;");
        }
        if f.fog {
            decl!(w, "{varying} {precision} float v_fogdepth;");
        }
    }
}

fn write_light_uniforms(w: &mut SourceWriter, i: usize, slot: &LightSlot) {
    if slot.light_type.is_positional() {
        decl!(w, "uniform mediump vec3 u_lightatt{i};");
    }
    if slot.light_type.is_spot() {
        decl!(w, "uniform mediump vec3 u_lightdir{i};");
        decl!(w, "uniform mediump float u_lightangle{i};");
        decl!(w, "uniform mediump float u_lightspotCoef{i};");
    }
    decl!(w, "uniform lowp vec3 u_lightambient{i};");
    decl!(w, "uniform lowp vec3 u_lightdiffuse{i};");
    if slot.computation.has_specular() {
        decl!(w, "uniform lowp vec3 u_lightspecular{i};");
    }
}

/// Values derived once from the features and shared by every emission step.
struct Context<'a> {
    features: &'a VertexShaderFeatures,
    hw: Option<&'a HardwareTransform>,
    do_texture: bool,
    projection: bool,
    flip: bool,
    has_texcoord: bool,
    /// Texcoords arrive already scaled and offset.
    prescale: bool,
    projection_uniform: &'static str,
    light_modes: [LightMode; crate::MAX_LIGHTS],
}

impl<'a> Context<'a> {
    fn new(features: &'a VertexShaderFeatures, prescale_uv: bool) -> Self {
        let texture = features.texture;
        Self {
            features,
            hw: features.hardware.as_ref(),
            do_texture: texture.is_some(),
            projection: texture.is_some_and(|t| t.projection),
            flip: texture.is_some_and(|t| t.flip),
            has_texcoord: features.has_texcoord(),
            prescale: prescale_uv
                && !features.through
                && matches!(features.uv_gen(), UvGen::TextureCoords | UvGen::Unknown),
            projection_uniform: if features.through {
                "u_proj_through"
            } else {
                "u_proj"
            },
            light_modes: features.light_modes(),
        }
    }
}

fn write_software_body(w: &mut SourceWriter, ctx: &Context<'_>) {
    let f = ctx.features;
    if ctx.do_texture {
        if f.through && ctx.projection {
            stmt!(w, "v_texcoord = vec3(texcoord, 1.0);");
        } else {
            stmt!(w, "v_texcoord = texcoord;");
        }
    }
    if f.has_color {
        stmt!(w, "v_color0 = color0;");
        if f.separate_specular {
            stmt!(w, "v_color1 = color1;");
        }
    } else {
        stmt!(w, "v_color0 = u_matambientalpha;");
        if f.separate_specular {
            stmt!(w, "v_color1 = vec3(0.0);");
        }
    }
    if f.fog {
        stmt!(w, "v_fogdepth = position.w;");
    }
    stmt!(
        w,
        "gl_Position = {} * vec4(position.xyz, 1.0);",
        ctx.projection_uniform
    );
}

fn write_hardware_body(w: &mut SourceWriter, ctx: &Context<'_>, hw: &HardwareTransform) {
    let f = ctx.features;
    write_world_transform(w, hw);

    stmt!(w, "vec4 viewPos = u_view * vec4(worldpos, 1.0);");
    stmt!(w, "gl_Position = {} * viewPos;", ctx.projection_uniform);

    match &hw.lighting {
        Some(lighting) => {
            let from_color = |flag: MaterialUpdate| {
                f.has_color && lighting.material_update.contains(flag)
            };
            let materials = Materials {
                ambient: if from_color(MaterialUpdate::AMBIENT) {
                    "color0"
                } else {
                    "u_matambientalpha"
                },
                diffuse: if from_color(MaterialUpdate::DIFFUSE) {
                    "color0.rgb"
                } else {
                    "u_matdiffuse"
                },
                specular: if from_color(MaterialUpdate::SPECULAR) {
                    "color0.rgb"
                } else {
                    "u_matspecular.rgb"
                },
            };
            write_lighting(w, ctx, &materials);
        }
        None => {
            if f.has_color {
                stmt!(w, "v_color0 = color0;");
            } else {
                stmt!(w, "v_color0 = u_matambientalpha;");
            }
            if f.separate_specular {
                stmt!(w, "v_color1 = vec3(0.0);");
            }
        }
    }

    if ctx.do_texture {
        write_uv_generation(w, ctx, hw);
    }

    if f.fog {
        stmt!(w, "v_fogdepth = (viewPos.z + u_fogcoef.x) * u_fogcoef.y;");
    }
}

/// Emits `worldpos` and `worldnormal`, skinning first when enabled.
fn write_world_transform(w: &mut SourceWriter, hw: &HardwareTransform) {
    let neg = if hw.reverse_normals { "-" } else { "" };

    let Some(skinning) = hw.skinning else {
        stmt!(w, "vec3 worldpos = (u_world * vec4(position.xyz, 1.0)).xyz;");
        if hw.has_normal {
            stmt!(
                w,
                "mediump vec3 worldnormal = normalize((u_world * vec4({neg}normal, 0.0)).xyz);"
            );
        } else {
            stmt!(w, "mediump vec3 worldnormal = vec3(0.0, 0.0, {neg}1.0);");
        }
        return;
    };

    let count = usize::from(skinning.weights.clamp(1, MAX_BONE_WEIGHTS));
    let mut sum = String::from("mat4 skinMatrix = ");
    for (i, attr) in BONE_WEIGHT_ATTRS.iter().take(count).enumerate() {
        // Scalar weight attributes have no components.
        let attr = match (count, i) {
            (1, 0) => "w1",
            (5, 4) => "w2",
            _ => attr,
        };
        if i > 0 {
            sum.push_str(" + ");
        }
        sum.push_str(attr);
        sum.push_str(" * u_bone");
        sum.push_str(&i.to_string());
    }
    stmt!(w, "{sum};");

    let factor = skinning.weight_format.rescale_suffix();
    stmt!(
        w,
        "vec3 skinnedpos = (skinMatrix * vec4(position, 1.0)).xyz{factor};"
    );
    stmt!(w, "vec3 worldpos = (u_world * vec4(skinnedpos, 1.0)).xyz;");
    if hw.has_normal {
        stmt!(
            w,
            "mediump vec3 skinnednormal = (skinMatrix * vec4({neg}normal, 0.0)).xyz{factor};"
        );
    } else {
        stmt!(
            w,
            "mediump vec3 skinnednormal = (skinMatrix * vec4(0.0, 0.0, {neg}1.0, 0.0)).xyz{factor};"
        );
    }
    stmt!(
        w,
        "mediump vec3 worldnormal = normalize((u_world * vec4(skinnednormal, 0.0)).xyz);"
    );
}

/// Material color sources, either a vertex color or a uniform.
struct Materials {
    ambient: &'static str,
    diffuse: &'static str,
    specular: &'static str,
}

fn write_lighting(w: &mut SourceWriter, ctx: &Context<'_>, materials: &Materials) {
    let ambient = materials.ambient;
    stmt!(
        w,
        "lowp vec4 lightSum0 = u_ambient * {ambient} + vec4(u_matemissive, 0.0);"
    );

    let full = ctx
        .light_modes
        .iter()
        .enumerate()
        .filter_map(|(i, mode)| match mode {
            LightMode::Full(slot) => Some((i, *slot)),
            _ => None,
        })
        .collect::<Vec<_>>();
    let any_specular = full.iter().any(|(_, s)| s.computation.has_specular());
    let any_positional = full.iter().any(|(_, s)| s.light_type.is_positional());

    if any_specular {
        stmt!(w, "lowp vec3 lightSum1 = vec3(0.0);");
    }
    if !full.is_empty() {
        stmt!(w, "vec3 toLight;");
        stmt!(w, "lowp vec3 diffuse;");
    }
    if any_positional {
        stmt!(w, "float distance;");
        stmt!(w, "lowp float lightScale;");
    }

    for (i, slot) in &full {
        write_light(w, *i, slot, materials);
    }

    if ctx.features.separate_specular {
        stmt!(w, "v_color0 = clamp(lightSum0, 0.0, 1.0);");
        if any_specular {
            stmt!(w, "v_color1 = clamp(lightSum1, 0.0, 1.0);");
        } else {
            stmt!(w, "v_color1 = vec3(0.0);");
        }
    } else if any_specular {
        stmt!(
            w,
            "v_color0 = clamp(clamp(lightSum0, 0.0, 1.0) + vec4(lightSum1, 0.0), 0.0, 1.0);"
        );
    } else {
        stmt!(w, "v_color0 = clamp(lightSum0, 0.0, 1.0);");
    }
}

fn write_light(w: &mut SourceWriter, i: usize, slot: &LightSlot, materials: &Materials) {
    if slot.light_type.is_positional() {
        stmt!(w, "toLight = u_lightpos{i} - worldpos;");
        stmt!(w, "distance = length(toLight);");
        stmt!(w, "toLight /= distance;");
    } else {
        // Directional light positions are uploaded normalized.
        stmt!(w, "toLight = u_lightpos{i};");
    }

    stmt!(w, "mediump float dot{i} = max(dot(toLight, worldnormal), 0.0);");
    if slot.computation.has_powered_diffuse() {
        // The GE yields 1.0 for pow(0.0, 0.0).
        w.open(format_args!(
            "if (dot{i} == 0.0 && u_matspecular.a == 0.0)"
        ));
        stmt!(w, "dot{i} = 1.0;");
        w.open_else();
        stmt!(w, "dot{i} = pow(dot{i}, u_matspecular.a);");
        w.close();
    }

    let times_light_scale = match slot.light_type {
        LightType::Directional => "",
        LightType::Point => {
            stmt!(
                w,
                "lightScale = clamp(1.0 / dot(u_lightatt{i}, vec3(1.0, distance, distance*distance)), 0.0, 1.0);"
            );
            " * lightScale"
        }
        LightType::Spot | LightType::Unknown => {
            stmt!(w, "lowp float angle{i} = dot(normalize(u_lightdir{i}), toLight);");
            w.open(format_args!("if (angle{i} >= u_lightangle{i})"));
            stmt!(
                w,
                "lightScale = clamp(1.0 / dot(u_lightatt{i}, vec3(1.0, distance, distance*distance)), 0.0, 1.0) * pow(angle{i}, u_lightspotCoef{i});"
            );
            w.open_else();
            stmt!(w, "lightScale = 0.0;");
            w.close();
            " * lightScale"
        }
    };

    stmt!(w, "diffuse = (u_lightdiffuse{i} * {}) * dot{i};", materials.diffuse);
    if slot.computation.has_specular() {
        stmt!(
            w,
            "dot{i} = dot(normalize(toLight + vec3(0.0, 0.0, 1.0)), worldnormal);"
        );
        w.open(format_args!("if (dot{i} > 0.0)"));
        stmt!(
            w,
            "lightSum1 += u_lightspecular{i} * {} * (pow(dot{i}, u_matspecular.a){times_light_scale});",
            materials.specular
        );
        w.close();
    }
    stmt!(
        w,
        "lightSum0.rgb += (u_lightambient{i} * {}.rgb + diffuse){times_light_scale};",
        materials.ambient
    );
}

fn write_uv_generation(w: &mut SourceWriter, ctx: &Context<'_>, hw: &HardwareTransform) {
    match hw.uv_gen {
        UvGen::TextureCoords | UvGen::Unknown => {
            match (ctx.prescale && !ctx.flip, ctx.has_texcoord) {
                (true, true) => stmt!(w, "v_texcoord = texcoord;"),
                (true, false) => stmt!(w, "v_texcoord = vec2(0.0);"),
                (false, true) => stmt!(
                    w,
                    "v_texcoord = texcoord * u_uvscaleoffset.xy + u_uvscaleoffset.zw;"
                ),
                (false, false) => stmt!(w, "v_texcoord = u_uvscaleoffset.zw;"),
            }
        }
        UvGen::TextureMatrix(projection) => {
            let source = projection_source(projection, hw);
            stmt!(
                w,
                "v_texcoord = (u_texmtx * {source}).xyz * vec3(u_uvscaleoffset.xy, 1.0);"
            );
        }
        UvGen::EnvironmentMap { .. } => {
            let [light0, light1] = hw.uv_gen.shade_lights().unwrap_or_default();
            stmt!(
                w,
                "v_texcoord = u_uvscaleoffset.xy * vec2(1.0 + dot(normalize(u_lightpos{light0}), worldnormal), 1.0 + dot(normalize(u_lightpos{light1}), worldnormal)) * 0.5;"
            );
        }
    }

    // Texture matrix output is flipped in the fragment stage.
    if ctx.flip && !matches!(hw.uv_gen, UvGen::TextureMatrix(_)) {
        stmt!(w, "v_texcoord.y = 1.0 - v_texcoord.y;");
    }
}

/// Untransformed texture matrix input for a projection mode.
fn projection_source(projection: UvProjection, hw: &HardwareTransform) -> String {
    let neg = if hw.reverse_normals { "-" } else { "" };
    match projection {
        UvProjection::Position => "vec4(position.xyz, 1.0)".to_owned(),
        UvProjection::Uv(format) if format.is_present() => {
            format!("vec4(texcoord.xy{}, 0.0, 1.0)", format.rescale_suffix())
        }
        UvProjection::Uv(_) => "vec4(0.0, 0.0, 0.0, 1.0)".to_owned(),
        UvProjection::NormalizedNormal if hw.has_normal => {
            format!("vec4(normalize({neg}normal), 1.0)")
        }
        UvProjection::Normal if hw.has_normal => format!("vec4({neg}normal, 1.0)"),
        UvProjection::NormalizedNormal | UvProjection::Normal => {
            format!("vec4(0.0, 0.0, {neg}1.0, 1.0)")
        }
    }
}

/// Generates the source for `key` under `config`.
pub fn generate_vertex_source(
    key: VariantKey,
    config: &ShaderGenConfig,
) -> Result<String, VariantKeyError> {
    VertexShaderGenerator::new(config).generate(key)
}
