//! Audio-reactive 3D layer engine: declarative layers evaluated once per
//! frame against live analyser samples, mutating a retained scene graph
//! submitted to a pluggable render backend.

#![forbid(unsafe_code)]

pub mod audio;
pub mod core;
pub mod defaults;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod model;
pub mod render;
pub mod scene;
pub mod sched;
pub mod visualizer;

pub use crate::core::{Color, Vec3};
pub use audio::{Analyser, FrameSamples, PcmAnalyser, SilentAnalyser, Transport};
pub use error::{WavesceneError, WavesceneResult};
pub use fonts::{FontFace, FontFetcher, FontLibrary, PlaceholderFontFetcher, TypefaceFontFetcher};
pub use model::{Config, Domain, Layer, LayerId, LayerSpec, Preset};
pub use scene::{Camera, NullRenderer, Renderer, Scene};
pub use visualizer::Visualizer;
