//! Shading language dialect selection.

use std::fmt;

use tracing::debug;

use crate::config::{GlTarget, GpuCaps};
use crate::emit::SourceWriter;

/// GLSL version and profile of the generated source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderProfile {
    /// GLSL ES 1.00.
    Es100,
    /// GLSL ES 3.00.
    Es300,
    Glsl110,
    Glsl130,
    Glsl330,
    /// No `#version` directive; legacy syntax. For platforms whose contexts lack the modern
    /// profiles.
    Unversioned,
}

impl ShaderProfile {
    pub fn version_directive(self) -> Option<&'static str> {
        match self {
            ShaderProfile::Es100 => Some("#version 100"),
            ShaderProfile::Es300 => Some("#version 300 es"),
            ShaderProfile::Glsl110 => Some("#version 110"),
            ShaderProfile::Glsl130 => Some("#version 130"),
            ShaderProfile::Glsl330 => Some("#version 330"),
            ShaderProfile::Unversioned => None,
        }
    }

    pub fn is_gles(self) -> bool {
        matches!(self, ShaderProfile::Es100 | ShaderProfile::Es300)
    }

    /// Uses `in`/`out` qualifiers and supports `flat`.
    pub fn is_modern(self) -> bool {
        matches!(self, ShaderProfile::Es300 | ShaderProfile::Glsl330)
    }
}

impl fmt::Display for ShaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderProfile::Es100 => "GLSL ES 1.00",
            ShaderProfile::Es300 => "GLSL ES 3.00",
            ShaderProfile::Glsl110 => "GLSL 1.10",
            ShaderProfile::Glsl130 => "GLSL 1.30",
            ShaderProfile::Glsl330 => "GLSL 3.30",
            ShaderProfile::Unversioned => "unversioned GLSL",
        })
    }
}

/// The syntax choices generation depends on, selected once per configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderDialect {
    profile: ShaderProfile,
    highp_varyings: bool,
}

impl ShaderDialect {
    /// Picks the profile for `caps`.
    ///
    /// GLES targets get GLSL ES 3.00 when ES3 is available, else 1.00. Desktop targets get 3.30,
    /// 1.30 or 1.10 by context version, unless `force_legacy_profile` is set. The precision bug
    /// flag only matters on GLES; desktop profiles define the precision qualifiers away.
    pub fn select(caps: &GpuCaps) -> Self {
        let profile = match caps.target {
            GlTarget::Gles { es3: true } => ShaderProfile::Es300,
            GlTarget::Gles { es3: false } => ShaderProfile::Es100,
            GlTarget::Desktop { .. } if caps.force_legacy_profile => ShaderProfile::Unversioned,
            target if target.version_at_least(3, 3) => ShaderProfile::Glsl330,
            target if target.version_at_least(3, 0) => ShaderProfile::Glsl130,
            GlTarget::Desktop { .. } => ShaderProfile::Glsl110,
        };
        let highp_varyings = profile.is_gles() && caps.shader_precision_bug;
        debug!(%profile, highp_varyings, "selected vertex shader dialect");
        Self {
            profile,
            highp_varyings,
        }
    }

    pub fn profile(&self) -> ShaderProfile {
        self.profile
    }

    pub fn attribute(&self) -> &'static str {
        if self.profile.is_modern() {
            "in"
        } else {
            "attribute"
        }
    }

    pub fn varying(&self) -> &'static str {
        if self.profile.is_modern() {
            "out"
        } else {
            "varying"
        }
    }

    pub fn supports_flat(&self) -> bool {
        self.profile.is_modern()
    }

    /// Precision of the fog depth and texcoord varyings.
    pub fn varying_precision(&self) -> &'static str {
        if self.highp_varyings {
            "highp"
        } else {
            "mediump"
        }
    }

    pub(crate) fn write_preamble(&self, w: &mut SourceWriter) {
        if let Some(version) = self.profile.version_directive() {
            w.preamble(version);
        }
        if self.profile.is_gles() {
            w.preamble("precision highp float;");
        } else {
            w.preamble("#define lowp");
            w.preamble("#define mediump");
            w.preamble("#define highp");
        }
    }
}

impl Default for ShaderDialect {
    fn default() -> Self {
        Self::select(&GpuCaps::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(target: GlTarget) -> ShaderDialect {
        ShaderDialect::select(&GpuCaps {
            target,
            ..GpuCaps::default()
        })
    }

    #[test]
    fn desktop_profile_follows_context_version() {
        let cases = [
            ((2, 1), ShaderProfile::Glsl110),
            ((3, 0), ShaderProfile::Glsl130),
            ((3, 2), ShaderProfile::Glsl130),
            ((3, 3), ShaderProfile::Glsl330),
            ((4, 6), ShaderProfile::Glsl330),
        ];
        for ((major, minor), expected) in cases {
            assert_eq!(
                select(GlTarget::Desktop { major, minor }).profile(),
                expected,
                "GL {major}.{minor}"
            );
        }
    }

    #[test]
    fn gles_profiles() {
        let es2 = select(GlTarget::Gles { es3: false });
        assert_eq!(es2.profile(), ShaderProfile::Es100);
        assert_eq!(es2.attribute(), "attribute");
        assert_eq!(es2.varying(), "varying");
        assert!(!es2.supports_flat());

        let es3 = select(GlTarget::Gles { es3: true });
        assert_eq!(es3.profile(), ShaderProfile::Es300);
        assert_eq!(es3.attribute(), "in");
        assert_eq!(es3.varying(), "out");
        assert!(es3.supports_flat());
    }

    #[test]
    fn force_legacy_only_affects_desktop() {
        let caps = GpuCaps {
            force_legacy_profile: true,
            ..GpuCaps::default()
        };
        let dialect = ShaderDialect::select(&caps);
        assert_eq!(dialect.profile(), ShaderProfile::Unversioned);
        assert_eq!(dialect.attribute(), "attribute");

        let caps = GpuCaps {
            target: GlTarget::Gles { es3: true },
            force_legacy_profile: true,
            ..GpuCaps::default()
        };
        assert_eq!(ShaderDialect::select(&caps).profile(), ShaderProfile::Es300);
    }

    #[test]
    fn precision_bug_only_raises_gles_varyings() {
        let mut caps = GpuCaps {
            target: GlTarget::Gles { es3: false },
            shader_precision_bug: true,
            ..GpuCaps::default()
        };
        assert_eq!(ShaderDialect::select(&caps).varying_precision(), "highp");
        caps.target = GlTarget::default();
        assert_eq!(ShaderDialect::select(&caps).varying_precision(), "mediump");
    }

    #[test]
    fn preambles() {
        let mut w = SourceWriter::new();
        select(GlTarget::Gles { es3: true }).write_preamble(&mut w);
        assert!(w
            .finish()
            .starts_with("#version 300 es\nprecision highp float;\n"));

        let mut w = SourceWriter::new();
        let legacy = ShaderDialect::select(&GpuCaps {
            force_legacy_profile: true,
            ..GpuCaps::default()
        });
        legacy.write_preamble(&mut w);
        assert!(w
            .finish()
            .starts_with("#define lowp\n#define mediump\n#define highp\nvoid main() {"));
    }
}
