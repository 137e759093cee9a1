use std::f32::consts::TAU;

use crate::{
    core::Vec3,
    defaults::ResolvedWaveform,
    error::{WavesceneError, WavesceneResult},
    geometry::Geometry,
    model::LayerId,
    render::RenderCtx,
    scene::{Material, NodeKind, SceneNode},
};

/// Nominal width of the linear layout.
pub(super) const LINEAR_WIDTH: f32 = 50.0;

pub(super) fn render(
    ctx: &mut RenderCtx<'_>,
    s: &ResolvedWaveform,
    samples: &[u8],
    id: LayerId,
) -> WavesceneResult<()> {
    let name = id.node_name();
    if !ctx.scene.contains(&name) {
        // Vertex buffer is sized once from the sample buffer and never
        // resized; the buffer length is constant for the node's lifetime.
        let node = SceneNode::new(
            name.clone(),
            NodeKind::Line {
                geometry: Geometry::with_vertex_capacity(samples.len()),
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
    let NodeKind::Line { geometry, material } = &mut node.kind else {
        return Err(WavesceneError::render(format!(
            "node {name} is not a waveform line"
        )));
    };

    material.color = s.color;
    material.opacity = s.opacity;
    material.line_width = s.line_width;

    let t = &s.transform;
    let invert = s.invert_factor();
    let len = samples.len().min(geometry.vertex_count());

    if s.circle {
        for (i, &sample) in samples.iter().take(len).enumerate() {
            let angle = TAU * (i as f32 / samples.len() as f32) * s.circle_radius_ratio;
            let magnitude = f32::from(sample) * (s.amplitude / 100.0);
            let radius = s.radius + magnitude;
            // Invert flips only the signal-driven displacement, never the
            // base circle radius.
            let y_radius = s.radius + magnitude * invert;
            geometry.positions[i * 3] = t.x + angle.cos() * radius;
            geometry.positions[i * 3 + 1] = t.y + angle.sin() * y_radius;
            geometry.positions[i * 3 + 2] = t.z;
        }
    } else {
        let step = LINEAR_WIDTH / samples.len() as f32 / s.resolution;
        let start_x = t.x - LINEAR_WIDTH / 2.0;
        for (i, &sample) in samples.iter().take(len).enumerate() {
            geometry.positions[i * 3] = start_x + i as f32 * step;
            geometry.positions[i * 3 + 1] = t.y + f32::from(sample) * (s.amplitude / 1000.0) * invert;
            geometry.positions[i * 3 + 2] = t.z;
        }
    }

    node.rotation = Vec3::new(t.rotation_x, t.rotation_y, t.rotation_z);
    geometry.dirty = true;
    Ok(())
}
