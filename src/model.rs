use std::collections::HashSet;
use std::fmt;

use crate::{
    core::Color,
    error::{WavesceneError, WavesceneResult},
    fonts::FontFace,
    geometry::ShapeKind,
    scene::LightKind,
};

/// Stable synthetic identity joining a layer to its retained scene node.
/// Assigned lazily on first render and never changed afterwards.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl LayerId {
    /// Scene-node name derived from the identity. The sole join key between
    /// a layer and its node.
    pub fn node_name(self) -> String {
        format!("layer-{}", self.0)
    }
}

/// Which analyser extraction a layer samples each frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    Time,
    Frequency,
}

/// Closed set of layer behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Shape,
    Text,
    Light,
    Waveform,
    #[serde(rename = "line-waveform")]
    LineWaveform,
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shape => "shape",
            Self::Text => "text",
            Self::Light => "light",
            Self::Waveform => "waveform",
            Self::LineWaveform => "line-waveform",
        };
        f.write_str(name)
    }
}

/// Shared positional/rotational overrides, flattened into every preset's
/// settings map.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformSettings {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub rotation_x: Option<f32>,
    pub rotation_y: Option<f32>,
    pub rotation_z: Option<f32>,
    pub max_rotation_x: Option<f32>,
    pub max_rotation_y: Option<f32>,
    pub max_rotation_z: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeSettings {
    pub shape: Option<ShapeKind>,
    pub color: Option<Color>,
    pub opacity: Option<f32>,
    pub amplitude: Option<f32>,
    pub cast_shadow: Option<bool>,
    pub receive_shadow: Option<bool>,
    pub size: Option<f32>,
    pub rotation_x_amplitude: Option<f32>,
    pub rotation_y_amplitude: Option<f32>,
    pub rotation_z_amplitude: Option<f32>,
    pub domain_type: Option<Domain>,
    #[serde(flatten)]
    pub transform: TransformSettings,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextSettings {
    pub text: Option<String>,
    pub font: Option<FontFace>,
    pub color: Option<Color>,
    pub size: Option<f32>,
    pub amplitude: Option<f32>,
    pub rotation_x_amplitude: Option<f32>,
    pub rotation_y_amplitude: Option<f32>,
    pub rotation_z_amplitude: Option<f32>,
    pub depth: Option<f32>,
    pub bevel_enabled: Option<bool>,
    pub bevel_thickness: Option<f32>,
    pub bevel_size: Option<f32>,
    pub bevel_segments: Option<u32>,
    pub curve_segments: Option<u32>,
    pub steps: Option<u32>,
    pub domain_type: Option<Domain>,
    #[serde(flatten)]
    pub transform: TransformSettings,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightSettings {
    pub color: Option<Color>,
    #[serde(rename = "type")]
    pub kind: Option<LightKind>,
    pub intensity: Option<f32>,
    #[serde(flatten)]
    pub transform: TransformSettings,
}

/// Shared by `waveform` (connected line) and `line-waveform` (segments).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveformSettings {
    pub color: Option<Color>,
    pub circle_radius_ratio: Option<f32>,
    pub opacity: Option<f32>,
    pub resolution: Option<f32>,
    pub amplitude: Option<f32>,
    pub circle: Option<bool>,
    pub radius: Option<f32>,
    pub line_width: Option<f32>,
    pub invert: Option<bool>,
    pub domain_type: Option<Domain>,
    #[serde(flatten)]
    pub transform: TransformSettings,
}

/// Tagged union over the closed preset set. Unknown preset names are
/// rejected at deserialization time, which is where the defensive
/// unknown-preset check lives under this representation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "preset", content = "settings")]
pub enum LayerSpec {
    #[serde(rename = "shape")]
    Shape(ShapeSettings),
    #[serde(rename = "text")]
    Text(TextSettings),
    #[serde(rename = "light")]
    Light(LightSettings),
    #[serde(rename = "waveform")]
    Waveform(WaveformSettings),
    #[serde(rename = "line-waveform")]
    LineWaveform(WaveformSettings),
}

impl LayerSpec {
    pub fn preset(&self) -> Preset {
        match self {
            Self::Shape(_) => Preset::Shape,
            Self::Text(_) => Preset::Text,
            Self::Light(_) => Preset::Light,
            Self::Waveform(_) => Preset::Waveform,
            Self::LineWaveform(_) => Preset::LineWaveform,
        }
    }

    /// Declared sampling domain; layers without a domain field (lights)
    /// still receive a time-domain buffer and simply ignore it.
    pub fn domain(&self) -> Domain {
        match self {
            Self::Shape(s) => s.domain_type.unwrap_or_default(),
            Self::Text(s) => s.domain_type.unwrap_or_default(),
            Self::Waveform(s) | Self::LineWaveform(s) => s.domain_type.unwrap_or_default(),
            Self::Light(_) => Domain::Time,
        }
    }
}

/// One declarative visual element. `id` is absent until first render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LayerId>,
    #[serde(flatten)]
    pub spec: LayerSpec,
}

impl Layer {
    pub fn new(spec: LayerSpec) -> Self {
        Self { id: None, spec }
    }
}

fn default_background() -> Color {
    Color::BLACK
}

/// The declarative layer store plus host-level frame options. Layer order
/// is presentation order only.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub layers: Vec<Layer>,
    #[serde(default = "default_background")]
    pub background: Color,
    /// Optional artificial delay per frame in milliseconds (throttled or
    /// deterministic rendering).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_delay: Option<u64>,
}

impl Config {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            background: default_background(),
            frame_delay: None,
        }
    }

    pub fn validate(&self) -> WavesceneResult<()> {
        if self.layers.is_empty() {
            return Err(WavesceneError::validation("config has no layers"));
        }
        let mut seen = HashSet::new();
        for layer in &self.layers {
            if let Some(id) = layer.id {
                if !seen.insert(id) {
                    return Err(WavesceneError::validation(format!(
                        "duplicate layer identity {}",
                        id.0
                    )));
                }
            }
        }
        Ok(())
    }
}
