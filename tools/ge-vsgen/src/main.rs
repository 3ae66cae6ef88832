use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use ge_vertex_shader::{
    build_variant_key, can_use_hardware_transform, GlTarget, GpuCaps, PrimitiveKind,
    ShaderGenConfig, VariantKey, VertexShaderFeatures, VertexShaderGenerator, VertexShaderInputs,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ge-vsgen",
    about = "Build GE vertex shader variant keys and generate their GLSL source."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the variant key for a draw state (JSON)
    Key {
        /// Draw state JSON file
        #[arg(long, value_name = "FILE")]
        state: PathBuf,

        #[command(flatten)]
        gate: GateArgs,

        /// Also print the decoded features
        #[arg(long, action = clap::ArgAction::SetTrue)]
        decode: bool,
    },
    /// Generate vertex shader source for a key or a draw state
    Gen {
        #[command(flatten)]
        source: KeySource,

        #[command(flatten)]
        gate: GateArgs,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Decode a variant key and print its features
    Decode {
        /// Variant key as hex (up to 32 digits, optional 0x prefix)
        #[arg(long, value_name = "HEX")]
        key: VariantKey,
    },
}

#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
struct KeySource {
    /// Variant key as hex
    #[arg(long, value_name = "HEX")]
    key: Option<VariantKey>,

    /// Draw state JSON file
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct GateArgs {
    /// Decide the transform path for this primitive kind (0..=6) instead of trusting the state's
    /// `use_hardware_transform`
    #[arg(long, value_name = "PRIM")]
    primitive: Option<u32>,

    /// Disable the hardware transform path (only with --primitive)
    #[arg(long, action = clap::ArgAction::SetTrue, requires = "primitive")]
    no_hardware_transform: bool,
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Target OpenGL ES 2 (GLSL ES 1.00)
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with_all = ["gles3", "gl_version"])]
    gles: bool,

    /// Target OpenGL ES 3 (GLSL ES 3.00)
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "gl_version")]
    gles3: bool,

    /// Desktop OpenGL context version
    #[arg(long, value_name = "MAJOR.MINOR", value_parser = parse_gl_version)]
    gl_version: Option<(u8, u8)>,

    /// Raise fog and texcoord varyings to highp (GLES only)
    #[arg(long, action = clap::ArgAction::SetTrue)]
    precision_bug: bool,

    /// Emit unversioned legacy GLSL on desktop targets
    #[arg(long, action = clap::ArgAction::SetTrue)]
    force_legacy: bool,

    /// Texcoords are pre-scaled during vertex decoding
    #[arg(long, action = clap::ArgAction::SetTrue)]
    prescale_uv: bool,
}

impl TargetArgs {
    fn config(&self) -> ShaderGenConfig {
        let target = if self.gles || self.gles3 {
            GlTarget::Gles { es3: self.gles3 }
        } else if let Some((major, minor)) = self.gl_version {
            GlTarget::Desktop { major, minor }
        } else {
            GlTarget::default()
        };
        ShaderGenConfig {
            prescale_uv: self.prescale_uv,
            caps: GpuCaps {
                target,
                shader_precision_bug: self.precision_bug,
                force_legacy_profile: self.force_legacy,
            },
            ..ShaderGenConfig::default()
        }
    }
}

fn parse_gl_version(s: &str) -> Result<(u8, u8), String> {
    let (major, minor) = s
        .split_once('.')
        .ok_or_else(|| format!("expected MAJOR.MINOR, got {s:?}"))?;
    let major = major
        .parse()
        .map_err(|err| format!("invalid major version {major:?}: {err}"))?;
    let minor = minor
        .parse()
        .map_err(|err| format!("invalid minor version {minor:?}: {err}"))?;
    Ok((major, minor))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    match args.command {
        Command::Key {
            state,
            gate,
            decode,
        } => {
            let inputs = load_state(&state, &gate)?;
            let key = build_variant_key(&inputs);
            writeln!(stdout, "{key}")?;
            if decode {
                let features = VertexShaderFeatures::decode(key)
                    .context("encoder produced an undecodable key")?;
                writeln!(stdout, "{features:#?}")?;
            }
        }
        Command::Gen {
            source,
            gate,
            target,
        } => {
            let key = match (source.key, source.state) {
                (Some(key), _) => key,
                (None, Some(state)) => build_variant_key(&load_state(&state, &gate)?),
                (None, None) => return Err(anyhow!("either --key or --state is required")),
            };
            let config = target.config();
            let generator = VertexShaderGenerator::new(&config);
            info!(%key, profile = %generator.dialect().profile(), "generating vertex shader");
            let text = generator
                .generate(key)
                .with_context(|| format!("generate vertex shader for key {key}"))?;
            stdout.write_all(text.as_bytes())?;
        }
        Command::Decode { key } => {
            let features = VertexShaderFeatures::decode(key)
                .with_context(|| format!("decode variant key {key}"))?;
            writeln!(stdout, "{features:#?}")?;
        }
    }
    Ok(())
}

fn load_state(path: &Path, gate: &GateArgs) -> anyhow::Result<VertexShaderInputs> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read draw state {}", path.display()))?;
    let mut inputs: VertexShaderInputs = serde_json::from_str(&text)
        .with_context(|| format!("parse draw state {}", path.display()))?;

    if let Some(raw) = gate.primitive {
        let primitive = PrimitiveKind::from_raw(raw)
            .ok_or_else(|| anyhow!("unknown primitive kind {raw} (expected 0..=6)"))?;
        let config = ShaderGenConfig {
            hardware_transform: !gate.no_hardware_transform,
            ..ShaderGenConfig::default()
        };
        inputs.use_hardware_transform =
            can_use_hardware_transform(&config, primitive, inputs.vertex_type.is_through());
        info!(
            %primitive,
            hardware = inputs.use_hardware_transform,
            "resolved transform path"
        );
    }
    Ok(inputs)
}
