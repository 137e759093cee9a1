//! Default resolution: merge a layer's partial settings over the preset's
//! full default table. Field-wise, override wins, no deep merge, no range
//! validation (out-of-range values propagate and produce whatever degenerate
//! geometry they imply). Safe and cheap to run every frame.

use crate::{
    core::Color,
    fonts::FontFace,
    geometry::ShapeKind,
    model::{
        Domain, LightSettings, ShapeSettings, TextSettings, TransformSettings, WaveformSettings,
    },
    scene::LightKind,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTransform {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub max_rotation_x: f32,
    pub max_rotation_y: f32,
    pub max_rotation_z: f32,
}

impl Default for ResolvedTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            // No clamp unless the host configures one.
            max_rotation_x: f32::INFINITY,
            max_rotation_y: f32::INFINITY,
            max_rotation_z: f32::INFINITY,
        }
    }
}

impl TransformSettings {
    pub fn resolve(&self) -> ResolvedTransform {
        let d = ResolvedTransform::default();
        ResolvedTransform {
            x: self.x.unwrap_or(d.x),
            y: self.y.unwrap_or(d.y),
            z: self.z.unwrap_or(d.z),
            rotation_x: self.rotation_x.unwrap_or(d.rotation_x),
            rotation_y: self.rotation_y.unwrap_or(d.rotation_y),
            rotation_z: self.rotation_z.unwrap_or(d.rotation_z),
            max_rotation_x: self.max_rotation_x.unwrap_or(d.max_rotation_x),
            max_rotation_y: self.max_rotation_y.unwrap_or(d.max_rotation_y),
            max_rotation_z: self.max_rotation_z.unwrap_or(d.max_rotation_z),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedShape {
    pub shape: ShapeKind,
    pub color: Color,
    pub opacity: f32,
    pub amplitude: f32,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub size: f32,
    pub rotation_x_amplitude: f32,
    pub rotation_y_amplitude: f32,
    pub rotation_z_amplitude: f32,
    pub domain: Domain,
    pub transform: ResolvedTransform,
}

impl Default for ResolvedShape {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Cube,
            color: Color::WHITE,
            opacity: 1.0,
            amplitude: 1.0,
            cast_shadow: true,
            receive_shadow: true,
            size: 1.0,
            rotation_x_amplitude: 0.0,
            rotation_y_amplitude: 0.0,
            rotation_z_amplitude: 0.0,
            domain: Domain::Time,
            transform: ResolvedTransform::default(),
        }
    }
}

impl ShapeSettings {
    pub fn resolve(&self) -> ResolvedShape {
        let d = ResolvedShape::default();
        ResolvedShape {
            shape: self.shape.unwrap_or(d.shape),
            color: self.color.unwrap_or(d.color),
            opacity: self.opacity.unwrap_or(d.opacity),
            amplitude: self.amplitude.unwrap_or(d.amplitude),
            cast_shadow: self.cast_shadow.unwrap_or(d.cast_shadow),
            receive_shadow: self.receive_shadow.unwrap_or(d.receive_shadow),
            size: self.size.unwrap_or(d.size),
            rotation_x_amplitude: self.rotation_x_amplitude.unwrap_or(d.rotation_x_amplitude),
            rotation_y_amplitude: self.rotation_y_amplitude.unwrap_or(d.rotation_y_amplitude),
            rotation_z_amplitude: self.rotation_z_amplitude.unwrap_or(d.rotation_z_amplitude),
            domain: self.domain_type.unwrap_or(d.domain),
            transform: self.transform.resolve(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedText {
    pub text: String,
    pub font: FontFace,
    pub color: Color,
    pub size: f32,
    pub amplitude: f32,
    pub rotation_x_amplitude: f32,
    pub rotation_y_amplitude: f32,
    pub rotation_z_amplitude: f32,
    pub depth: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: u32,
    pub curve_segments: u32,
    pub steps: u32,
    pub domain: Domain,
    pub transform: ResolvedTransform,
}

impl Default for ResolvedText {
    fn default() -> Self {
        Self {
            text: "Hello, World!".to_string(),
            font: FontFace::Gentilis,
            color: Color::WHITE,
            size: 1.0,
            amplitude: 0.0,
            rotation_x_amplitude: 0.0,
            rotation_y_amplitude: 0.0,
            rotation_z_amplitude: 0.0,
            depth: 0.1,
            bevel_enabled: false,
            bevel_thickness: 0.02,
            bevel_size: 0.01,
            bevel_segments: 3,
            curve_segments: 12,
            steps: 1,
            domain: Domain::Time,
            transform: ResolvedTransform::default(),
        }
    }
}

impl ResolvedText {
    /// The geometry-affecting subset tracked for reload change detection.
    /// Position/rotation overrides deliberately excluded: moving a text
    /// layer must not rebuild its geometry.
    pub fn snapshot(&self) -> TextSnapshot {
        TextSnapshot {
            text: self.text.clone(),
            font: self.font,
            size: self.size,
            depth: self.depth,
            bevel_enabled: self.bevel_enabled,
            bevel_thickness: self.bevel_thickness,
            bevel_size: self.bevel_size,
            bevel_segments: self.bevel_segments,
            curve_segments: self.curve_segments,
            steps: self.steps,
            color: self.color,
        }
    }
}

impl TextSettings {
    pub fn resolve(&self) -> ResolvedText {
        let d = ResolvedText::default();
        ResolvedText {
            text: self.text.clone().unwrap_or(d.text),
            font: self.font.unwrap_or(d.font),
            color: self.color.unwrap_or(d.color),
            size: self.size.unwrap_or(d.size),
            amplitude: self.amplitude.unwrap_or(d.amplitude),
            rotation_x_amplitude: self.rotation_x_amplitude.unwrap_or(d.rotation_x_amplitude),
            rotation_y_amplitude: self.rotation_y_amplitude.unwrap_or(d.rotation_y_amplitude),
            rotation_z_amplitude: self.rotation_z_amplitude.unwrap_or(d.rotation_z_amplitude),
            depth: self.depth.unwrap_or(d.depth),
            bevel_enabled: self.bevel_enabled.unwrap_or(d.bevel_enabled),
            bevel_thickness: self.bevel_thickness.unwrap_or(d.bevel_thickness),
            bevel_size: self.bevel_size.unwrap_or(d.bevel_size),
            bevel_segments: self.bevel_segments.unwrap_or(d.bevel_segments),
            curve_segments: self.curve_segments.unwrap_or(d.curve_segments),
            steps: self.steps.unwrap_or(d.steps),
            domain: self.domain_type.unwrap_or(d.domain),
            transform: self.transform.resolve(),
        }
    }
}

/// Last-applied text parameters, attached to the node on load completion.
#[derive(Clone, Debug, PartialEq)]
pub struct TextSnapshot {
    pub text: String,
    pub font: FontFace,
    pub size: f32,
    pub depth: f32,
    pub bevel_enabled: bool,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: u32,
    pub curve_segments: u32,
    pub steps: u32,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedLight {
    pub color: Color,
    pub kind: LightKind,
    pub intensity: f32,
    pub transform: ResolvedTransform,
}

impl Default for ResolvedLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            kind: LightKind::Directional,
            intensity: 1.0,
            transform: ResolvedTransform::default(),
        }
    }
}

impl LightSettings {
    pub fn resolve(&self) -> ResolvedLight {
        let d = ResolvedLight::default();
        ResolvedLight {
            color: self.color.unwrap_or(d.color),
            kind: self.kind.unwrap_or(d.kind),
            intensity: self.intensity.unwrap_or(d.intensity),
            transform: self.transform.resolve(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedWaveform {
    pub color: Color,
    pub circle_radius_ratio: f32,
    pub opacity: f32,
    pub resolution: f32,
    pub amplitude: f32,
    pub circle: bool,
    pub radius: f32,
    pub line_width: f32,
    pub invert: bool,
    pub domain: Domain,
    pub transform: ResolvedTransform,
}

impl Default for ResolvedWaveform {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            circle_radius_ratio: 1.0,
            opacity: 1.0,
            resolution: 1.0,
            amplitude: 1.0,
            circle: false,
            radius: 3.0,
            line_width: 1.0,
            invert: false,
            domain: Domain::Time,
            transform: ResolvedTransform::default(),
        }
    }
}

impl ResolvedWaveform {
    /// −1 when `invert` is set, else +1; applied only to the signal-driven
    /// displacement, never to the baseline or base circle radius.
    pub fn invert_factor(&self) -> f32 {
        if self.invert { -1.0 } else { 1.0 }
    }
}

impl WaveformSettings {
    pub fn resolve(&self) -> ResolvedWaveform {
        let d = ResolvedWaveform::default();
        ResolvedWaveform {
            color: self.color.unwrap_or(d.color),
            circle_radius_ratio: self.circle_radius_ratio.unwrap_or(d.circle_radius_ratio),
            opacity: self.opacity.unwrap_or(d.opacity),
            resolution: self.resolution.unwrap_or(d.resolution),
            amplitude: self.amplitude.unwrap_or(d.amplitude),
            circle: self.circle.unwrap_or(d.circle),
            radius: self.radius.unwrap_or(d.radius),
            line_width: self.line_width.unwrap_or(d.line_width),
            invert: self.invert.unwrap_or(d.invert),
            domain: self.domain_type.unwrap_or(d.domain),
            transform: self.transform.resolve(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_yield_the_default_table() {
        assert_eq!(ShapeSettings::default().resolve(), ResolvedShape::default());
        assert_eq!(TextSettings::default().resolve(), ResolvedText::default());
        assert_eq!(LightSettings::default().resolve(), ResolvedLight::default());
        assert_eq!(
            WaveformSettings::default().resolve(),
            ResolvedWaveform::default()
        );
    }

    #[test]
    fn override_wins_and_other_keys_keep_defaults() {
        let settings = ShapeSettings {
            color: Some("red".parse().unwrap()),
            ..ShapeSettings::default()
        };
        let resolved = settings.resolve();
        assert_eq!(resolved.color, "red".parse().unwrap());
        assert_eq!(resolved.shape, ResolvedShape::default().shape);
        assert_eq!(resolved.size, ResolvedShape::default().size);
        assert_eq!(resolved.transform, ResolvedTransform::default());
    }

    #[test]
    fn resolution_is_deterministic() {
        let settings = WaveformSettings {
            circle: Some(true),
            amplitude: Some(90.0),
            ..WaveformSettings::default()
        };
        assert_eq!(settings.resolve(), settings.resolve());
    }

    #[test]
    fn snapshot_ignores_placement() {
        let mut settings = TextSettings::default();
        let before = settings.resolve().snapshot();
        settings.transform.x = Some(10.0);
        settings.transform.rotation_y = Some(1.5);
        assert_eq!(settings.resolve().snapshot(), before);
    }

    #[test]
    fn invert_factor_signs() {
        let mut w = ResolvedWaveform::default();
        assert_eq!(w.invert_factor(), 1.0);
        w.invert = true;
        assert_eq!(w.invert_factor(), -1.0);
    }
}
