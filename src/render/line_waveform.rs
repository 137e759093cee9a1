use std::f32::consts::TAU;

use crate::{
    core::Vec3,
    defaults::ResolvedWaveform,
    error::{WavesceneError, WavesceneResult},
    geometry::Geometry,
    model::LayerId,
    render::{RenderCtx, waveform::LINEAR_WIDTH},
    scene::{Material, NodeKind, SceneNode},
};

pub(super) fn render(
    ctx: &mut RenderCtx<'_>,
    s: &ResolvedWaveform,
    samples: &[u8],
    id: LayerId,
) -> WavesceneResult<()> {
    let name = id.node_name();
    if !ctx.scene.contains(&name) {
        // Two 3D endpoints per sample.
        let node = SceneNode::new(
            name.clone(),
            NodeKind::LineSegments {
                geometry: Geometry::with_vertex_capacity(samples.len() * 2),
                material: Material {
                    color: s.color,
                    opacity: s.opacity,
                    line_width: s.line_width,
                },
            },
        );
        ctx.scene.insert(node);
    }
    let node = ctx
        .scene
        .get_mut(&name)
        .ok_or_else(|| WavesceneError::render(format!("lost scene node {name}")))?;
    let NodeKind::LineSegments { geometry, material } = &mut node.kind else {
        return Err(WavesceneError::render(format!(
            "node {name} is not a segment waveform"
        )));
    };

    material.color = s.color;
    material.opacity = s.opacity;
    material.line_width = s.line_width;

    let t = &s.transform;
    let invert = s.invert_factor();
    let len = samples.len().min(geometry.vertex_count() / 2);

    if s.circle {
        // Optional sampling stride for density control.
        let stride = (1.0 / s.resolution).floor().max(1.0) as usize;
        for i in (0..len).step_by(stride) {
            let angle = TAU * (i as f32 / samples.len() as f32) * s.circle_radius_ratio;
            let magnitude = f32::from(samples[i]) * (s.amplitude / 100.0);
            // Segment from the base circle to the signal-modulated radius at
            // the same angle; invert applies to the displacement only.
            geometry.positions[i * 6] = t.x + angle.cos() * s.radius;
            geometry.positions[i * 6 + 1] = t.y + angle.sin() * s.radius;
            geometry.positions[i * 6 + 2] = t.z;
            geometry.positions[i * 6 + 3] = t.x + angle.cos() * (s.radius + magnitude);
            geometry.positions[i * 6 + 4] = t.y + angle.sin() * (s.radius + magnitude * invert);
            geometry.positions[i * 6 + 5] = t.z;
        }
    } else {
        let step = LINEAR_WIDTH / samples.len() as f32 / s.resolution;
        let start_x = t.x - LINEAR_WIDTH / 2.0;
        for (i, &sample) in samples.iter().take(len).enumerate() {
            let x = start_x + i as f32 * step;
            geometry.positions[i * 6] = x;
            geometry.positions[i * 6 + 1] = t.y;
            geometry.positions[i * 6 + 2] = t.z;
            geometry.positions[i * 6 + 3] = x;
            geometry.positions[i * 6 + 4] = t.y + f32::from(sample) * (s.amplitude / 1000.0) * invert;
            geometry.positions[i * 6 + 5] = t.z;
        }
    }

    node.rotation = Vec3::new(t.rotation_x, t.rotation_y, t.rotation_z);
    geometry.dirty = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fonts::{FontLibrary, PlaceholderFontFetcher},
        model::WaveformSettings,
        scene::{Camera, NullRenderer, Scene},
    };
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn render_once(settings: WaveformSettings, samples: &[u8]) -> Scene {
        let mut scene = Scene::new();
        let mut camera = Camera::new(1.0);
        let mut renderer = NullRenderer::default();
        let mut fonts = FontLibrary::new(Arc::new(PlaceholderFontFetcher));
        let mut ctx = RenderCtx {
            scene: &mut scene,
            camera: &mut camera,
            renderer: &mut renderer,
            fonts: &mut fonts,
        };
        render(&mut ctx, &settings.resolve(), samples, LayerId(0)).unwrap();
        scene
    }

    fn seg_positions(scene: &Scene) -> &[f32] {
        let NodeKind::LineSegments { geometry, .. } = &scene.get("layer-0").unwrap().kind else {
            panic!("expected segment node");
        };
        &geometry.positions
    }

    #[test]
    fn buffer_holds_two_points_per_sample() {
        let scene = render_once(WaveformSettings::default(), &[0u8; 8]);
        assert_eq!(seg_positions(&scene).len(), 8 * 6);
    }

    #[test]
    fn linear_segments_run_from_baseline_to_signal() {
        let samples = [100u8; 4];
        let settings = WaveformSettings {
            amplitude: Some(20.0),
            ..WaveformSettings::default()
        };
        let scene = render_once(settings, &samples);
        let positions = seg_positions(&scene);
        for i in 0..4 {
            assert_eq!(positions[i * 6], positions[i * 6 + 3], "same x at both ends");
            assert_relative_eq!(positions[i * 6 + 1], 0.0);
            assert_relative_eq!(positions[i * 6 + 4], 100.0 * (20.0 / 1000.0), epsilon = 1e-5);
        }
    }

    #[test]
    fn circular_segments_start_on_base_circle() {
        let samples = [255u8; 8];
        let settings = WaveformSettings {
            circle: Some(true),
            radius: Some(2.0),
            amplitude: Some(50.0),
            ..WaveformSettings::default()
        };
        let scene = render_once(settings, &samples);
        let positions = seg_positions(&scene);
        for i in 0..8 {
            let base_r =
                (positions[i * 6].powi(2) + positions[i * 6 + 1].powi(2)).sqrt();
            let tip_r =
                (positions[i * 6 + 3].powi(2) + positions[i * 6 + 4].powi(2)).sqrt();
            assert_relative_eq!(base_r, 2.0, epsilon = 1e-4);
            assert_relative_eq!(tip_r, 2.0 + 255.0 * 0.5, epsilon = 1e-2);
        }
    }

    #[test]
    fn circular_stride_skips_samples() {
        let samples = [255u8; 16];
        let settings = WaveformSettings {
            circle: Some(true),
            resolution: Some(0.25), // stride 4
            ..WaveformSettings::default()
        };
        let scene = render_once(settings, &samples);
        let positions = seg_positions(&scene);
        // Skipped slots keep their zeroed construction values.
        assert_eq!(positions[1 * 6 + 3], 0.0);
        assert_ne!(positions[4 * 6 + 3], 0.0);
    }
}
