use crate::config::ShaderGenConfig;
use crate::ge::PrimitiveKind;

/// Decides whether a draw may run transform and lighting in the generated vertex shader.
///
/// Always false when hardware transform is disabled in `config`. Otherwise true for through-mode
/// vertex streams, except rectangles, which are always expanded in software.
pub fn can_use_hardware_transform(
    config: &ShaderGenConfig,
    primitive: PrimitiveKind,
    is_through: bool,
) -> bool {
    if !config.hardware_transform {
        return false;
    }
    is_through && primitive != PrimitiveKind::Rectangles
}
