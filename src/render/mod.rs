//! Preset render functions. Each is invoked once per layer per frame with
//! the resolved settings, the scene handles, the frame's sample buffer, and
//! the layer identity, and is side-effect-isolated to its own node.

mod light;
mod line_waveform;
mod shape;
mod text;
mod waveform;

pub(crate) use text::apply_font_load;

use crate::{
    error::WavesceneResult,
    fonts::FontLibrary,
    model::{LayerId, LayerSpec},
    scene::{Camera, Renderer, Scene},
};

/// Mutable scene handles threaded through every render function.
pub struct RenderCtx<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut Camera,
    pub renderer: &'a mut dyn Renderer,
    pub fonts: &'a mut FontLibrary,
}

/// Exhaustive dispatch over the closed preset set.
pub fn render_layer(
    ctx: &mut RenderCtx<'_>,
    spec: &LayerSpec,
    samples: &[u8],
    id: LayerId,
) -> WavesceneResult<()> {
    match spec {
        LayerSpec::Shape(s) => shape::render(ctx, &s.resolve(), samples, id),
        LayerSpec::Text(s) => text::render(ctx, &s.resolve(), samples, id),
        LayerSpec::Light(s) => light::render(ctx, &s.resolve(), id),
        LayerSpec::Waveform(s) => waveform::render(ctx, &s.resolve(), samples, id),
        LayerSpec::LineWaveform(s) => line_waveform::render(ctx, &s.resolve(), samples, id),
    }
}

/// Numeric mean over the whole sample buffer, still on the 0–255 scale.
pub(crate) fn average(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&b| f32::from(b)).sum::<f32>() / samples.len() as f32
}

/// One axis of audio-driven rotation. With a positive amplitude the angle
/// accumulates by `(amplitude/1000)·(π/180)·average·dir`, ping-ponging at
/// `±max`; otherwise the fixed target angle is applied verbatim. The bound
/// check runs before the increment, so an overshoot is corrected starting
/// the next frame and never exceeds the bound by more than one increment.
pub(crate) fn advance_rotation(
    angle: &mut f32,
    dir: &mut f32,
    fixed: f32,
    amplitude: f32,
    max: f32,
    average: f32,
) {
    if *angle > max {
        *dir = -1.0;
    } else if *angle < -max {
        *dir = 1.0;
    }
    if amplitude > 0.0 {
        *angle += amplitude / 1000.0 * std::f32::consts::PI / 180.0 * average * *dir;
    } else {
        *angle = fixed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_uniform_buffer() {
        assert_eq!(average(&[255; 32]), 255.0);
        assert_eq!(average(&[0; 32]), 0.0);
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn bounded_oscillation_ping_pongs_within_one_increment() {
        let max = 0.05;
        let amplitude = 10.0;
        let average = 200.0;
        let increment = amplitude / 1000.0 * std::f32::consts::PI / 180.0 * average;
        let mut angle = 0.0f32;
        let mut dir = 1.0f32;
        let mut flips = 0;
        let mut last_dir = dir;
        for _ in 0..2000 {
            advance_rotation(&mut angle, &mut dir, 0.0, amplitude, max, average);
            assert!(angle.abs() <= max + increment * 1.001, "angle {angle} escaped");
            if dir != last_dir {
                flips += 1;
                last_dir = dir;
            }
        }
        assert!(flips >= 2, "rotation never reversed");
    }

    #[test]
    fn zero_amplitude_applies_fixed_angle() {
        let mut angle = 0.3f32;
        let mut dir = 1.0f32;
        advance_rotation(&mut angle, &mut dir, 1.25, 0.0, f32::INFINITY, 128.0);
        assert_eq!(angle, 1.25);
    }
}
