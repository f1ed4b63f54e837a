/// Which triangle facing is discarded before shading.
///
/// Front faces are clockwise in normalized device coordinates.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

/// Depth comparison applied before a fragment is written.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum DepthFunc {
    /// Passes when the fragment is strictly closer than the stored depth.
    #[default]
    Less,
    /// Also passes on equality. Needed for geometry pinned to the far plane.
    LessEqual,
}

impl DepthFunc {
    #[inline(always)]
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            DepthFunc::Less => incoming < stored,
            DepthFunc::LessEqual => incoming <= stored,
        }
    }
}

/// How a shaded fragment is combined with the color already in the framebuffer.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// `dst = src * a + dst * (1 - a)`
    Alpha,
}

/// Fixed-function state resolved for a single draw call.
///
/// Every draw carries its own descriptor, so nothing depends on a toggle
/// left behind by an earlier draw.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct RenderState {
    pub cull: CullMode,
    pub depth: DepthFunc,
    pub blend: BlendMode,
}

impl RenderState {
    /// Baseline for closed, convex, opaque geometry.
    pub const fn opaque() -> Self {
        Self {
            cull: CullMode::Back,
            depth: DepthFunc::Less,
            blend: BlendMode::Opaque,
        }
    }

    /// Thin panels and interior walls seen from both sides.
    pub const fn double_sided() -> Self {
        Self {
            cull: CullMode::None,
            depth: DepthFunc::Less,
            blend: BlendMode::Opaque,
        }
    }

    /// A unit cube around the eye: keep the inside faces and let depth 1.0 pass.
    pub const fn skybox() -> Self {
        Self {
            cull: CullMode::Front,
            depth: DepthFunc::LessEqual,
            blend: BlendMode::Opaque,
        }
    }

    /// Semi-transparent panes, drawn after everything opaque.
    pub const fn translucent() -> Self {
        Self {
            cull: CullMode::None,
            depth: DepthFunc::Less,
            blend: BlendMode::Alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_opaque_baseline() {
        assert_eq!(RenderState::default(), RenderState::opaque());
    }

    #[test]
    fn less_equal_accepts_far_plane_depth() {
        assert!(!DepthFunc::Less.passes(1.0, 1.0));
        assert!(DepthFunc::LessEqual.passes(1.0, 1.0));
        assert!(DepthFunc::Less.passes(0.5, 1.0));
    }
}
