//! The post-processing effect catalog.
//!
//! Every effect the pipeline can run is a variant of [`Effect`], and one
//! static table maps each variant to its display name, CLI slug, and the
//! frame buffer kind the scene must be captured into before the effect's
//! passes run. Keeping name, source kind, and pass plan keyed off the same
//! enum means the three can never drift apart.

use crate::framebuffer::FrameBufferKind;

/// A post-processing effect the pipeline can run.
///
/// The set is closed: lookups are exhaustive matches, so every effect has a
/// name, a source buffer kind, and a pass plan by construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Show the captured scene unchanged.
    Passthrough,
    Invert,
    Grayscale,
    Kernel,
    KernelBlur,
    SobelEdge,
    FreiChenEdge,
    ScreenWave,
    Swirl,
    NightVision,
    LensCircle,
    Posterize,
    DreamVision,
    Pixelate,
    FrostedGlass,
    FrostedGlassNoise,
    Crosshatch,
    ThermalVision,
    Toonify,
    Shockwave,
    FishEye,
    Barrel,
    FishEyeGrid,
    FishEyeLens,
    AntiFishEye,
    GaussianBlur,
    BoxBlur,
    RadialBlur,
    MotionBlur,
    DepthView,
    Vignette,
    BrightPass,
    Bloom,
    ToneMapping,
    LensFlare,
    Fxaa,
    Deferred,
    Ssao,
}

/// Static catalog entry for one effect.
pub struct EffectInfo {
    /// Human-readable name shown in the HUD.
    pub name: &'static str,
    /// Stable slug accepted by `--effect` on the command line.
    pub slug: &'static str,
    /// The frame buffer kind the scene render must target for this effect.
    pub source: FrameBufferKind,
}

impl Effect {
    /// Every effect, in HUD cycling order.
    pub const ALL: [Effect; 38] = [
        Effect::Passthrough,
        Effect::Invert,
        Effect::Grayscale,
        Effect::Kernel,
        Effect::KernelBlur,
        Effect::SobelEdge,
        Effect::FreiChenEdge,
        Effect::ScreenWave,
        Effect::Swirl,
        Effect::NightVision,
        Effect::LensCircle,
        Effect::Posterize,
        Effect::DreamVision,
        Effect::Pixelate,
        Effect::FrostedGlass,
        Effect::FrostedGlassNoise,
        Effect::Crosshatch,
        Effect::ThermalVision,
        Effect::Toonify,
        Effect::Shockwave,
        Effect::FishEye,
        Effect::Barrel,
        Effect::FishEyeGrid,
        Effect::FishEyeLens,
        Effect::AntiFishEye,
        Effect::GaussianBlur,
        Effect::BoxBlur,
        Effect::RadialBlur,
        Effect::MotionBlur,
        Effect::DepthView,
        Effect::Vignette,
        Effect::BrightPass,
        Effect::Bloom,
        Effect::ToneMapping,
        Effect::LensFlare,
        Effect::Fxaa,
        Effect::Deferred,
        Effect::Ssao,
    ];

    /// The catalog entry for this effect.
    pub const fn info(self) -> &'static EffectInfo {
        use FrameBufferKind::{Color, Geometry};
        macro_rules! entry {
            ($name:literal, $slug:literal, $source:expr) => {
                &EffectInfo {
                    name: $name,
                    slug: $slug,
                    source: $source,
                }
            };
        }
        match self {
            Effect::Passthrough => entry!("Passthrough", "passthrough", Color),
            Effect::Invert => entry!("Color Inversion", "invert", Color),
            Effect::Grayscale => entry!("Grayscale", "grayscale", Color),
            Effect::Kernel => entry!("Kernel", "kernel", Color),
            Effect::KernelBlur => entry!("Kernel Blur", "kernel-blur", Color),
            Effect::SobelEdge => entry!("Sobel Edge Detection", "sobel", Color),
            Effect::FreiChenEdge => entry!("Frei-Chen Edge Detection", "frei-chen", Color),
            Effect::ScreenWave => entry!("Screen Wave", "screen-wave", Color),
            Effect::Swirl => entry!("Swirl", "swirl", Color),
            Effect::NightVision => entry!("Night Vision", "night-vision", Color),
            Effect::LensCircle => entry!("Lens Circle", "lens-circle", Color),
            Effect::Posterize => entry!("Posterization", "posterize", Color),
            Effect::DreamVision => entry!("Dream Vision", "dream-vision", Color),
            Effect::Pixelate => entry!("Pixelation", "pixelate", Color),
            Effect::FrostedGlass => entry!("Frosted Glass", "frosted-glass", Color),
            Effect::FrostedGlassNoise => {
                entry!("Frosted Glass (Noise)", "frosted-glass-noise", Color)
            }
            Effect::Crosshatch => entry!("Crosshatching", "crosshatch", Color),
            Effect::ThermalVision => entry!("Thermal Vision", "thermal", Color),
            Effect::Toonify => entry!("Toonify", "toonify", Color),
            Effect::Shockwave => entry!("Shockwave", "shockwave", Color),
            Effect::FishEye => entry!("Fish Eye", "fish-eye", Color),
            Effect::Barrel => entry!("Barrel Distortion", "barrel", Color),
            Effect::FishEyeGrid => entry!("Fish Eye Grid", "fish-eye-grid", Color),
            Effect::FishEyeLens => entry!("Fish Eye Lens", "fish-eye-lens", Color),
            Effect::AntiFishEye => entry!("Anti Fish Eye", "anti-fish-eye", Color),
            Effect::GaussianBlur => entry!("Gaussian Blur", "gaussian-blur", Geometry),
            Effect::BoxBlur => entry!("Box Blur", "box-blur", Color),
            Effect::RadialBlur => entry!("Radial Blur", "radial-blur", Color),
            Effect::MotionBlur => entry!("Motion Blur", "motion-blur", Color),
            Effect::DepthView => entry!("Depth View", "depth-view", Color),
            Effect::Vignette => entry!("Vignette", "vignette", Color),
            Effect::BrightPass => entry!("Bright Pass", "bright-pass", Geometry),
            Effect::Bloom => entry!("Bloom", "bloom", Geometry),
            Effect::ToneMapping => entry!("HDR Tone Mapping", "tone-mapping", Geometry),
            Effect::LensFlare => entry!("Lens Flare", "lens-flare", Geometry),
            Effect::Fxaa => entry!("FXAA", "fxaa", Color),
            Effect::Deferred => entry!("Deferred Shading", "deferred", Geometry),
            Effect::Ssao => entry!("Ambient Occlusion", "ssao", Geometry),
        }
    }

    /// Display name for the HUD.
    pub const fn name(self) -> &'static str {
        self.info().name
    }

    /// The frame buffer kind the scene must be rendered into for this effect.
    pub const fn source_kind(self) -> FrameBufferKind {
        self.info().source
    }

    /// The next effect in catalog order, wrapping at the end.
    pub fn next(self) -> Effect {
        let i = Self::ALL.iter().position(|&e| e == self).unwrap();
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// The previous effect in catalog order, wrapping at the start.
    pub fn prev(self) -> Effect {
        let i = Self::ALL.iter().position(|&e| e == self).unwrap();
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Error returned when parsing an unknown effect slug.
#[derive(Debug)]
pub struct UnknownEffect(pub String);

impl std::fmt::Display for UnknownEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown effect '{}' (try --list-effects)", self.0)
    }
}

impl std::error::Error for UnknownEffect {}

impl std::str::FromStr for Effect {
    type Err = UnknownEffect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Effect::ALL
            .iter()
            .copied()
            .find(|e| e.info().slug.eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEffect(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_total() {
        // Every effect resolves to a non-empty name, a unique slug, and a
        // source kind that can actually be a scene target.
        let mut slugs = std::collections::HashSet::new();
        for effect in Effect::ALL {
            let info = effect.info();
            assert!(!info.name.is_empty());
            assert!(slugs.insert(info.slug), "duplicate slug {}", info.slug);
            assert!(matches!(
                info.source,
                FrameBufferKind::Color | FrameBufferKind::Geometry
            ));
        }
        assert_eq!(Effect::ALL.len(), 38);
    }

    #[test]
    fn geometry_sourced_effects() {
        let geometry: Vec<Effect> = Effect::ALL
            .iter()
            .copied()
            .filter(|e| e.source_kind() == FrameBufferKind::Geometry)
            .collect();
        assert_eq!(
            geometry,
            vec![
                Effect::GaussianBlur,
                Effect::BrightPass,
                Effect::Bloom,
                Effect::ToneMapping,
                Effect::LensFlare,
                Effect::Deferred,
                Effect::Ssao,
            ]
        );
    }

    #[test]
    fn cycling_wraps() {
        assert_eq!(Effect::Passthrough.prev(), Effect::Ssao);
        assert_eq!(Effect::Ssao.next(), Effect::Passthrough);
        let mut e = Effect::Passthrough;
        for _ in 0..Effect::ALL.len() {
            e = e.next();
        }
        assert_eq!(e, Effect::Passthrough);
    }

    #[test]
    fn slugs_parse() {
        assert_eq!("bloom".parse::<Effect>().unwrap(), Effect::Bloom);
        assert_eq!("SSAO".parse::<Effect>().unwrap(), Effect::Ssao);
        assert!("not-an-effect".parse::<Effect>().is_err());
    }
}
