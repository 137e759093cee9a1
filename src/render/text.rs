use crate::{
    core::Vec3,
    defaults::ResolvedText,
    error::{WavesceneError, WavesceneResult},
    fonts::{FontLoad, build_text_geometry},
    model::LayerId,
    render::{RenderCtx, advance_rotation, average},
    scene::{Material, NodeKind, Scene, SceneNode},
};

/// Per-frame entry for the text preset. State machine per node:
/// absent → placeholder + `Loading`; `Ready` + changed settings → `Loading`
/// with a fresh load; `Loading` → skipped entirely (the in-flight load
/// wins); `Ready` + unchanged → the shape preset's scale/rotation formulas
/// applied to the text mesh.
pub(super) fn render(
    ctx: &mut RenderCtx<'_>,
    s: &ResolvedText,
    samples: &[u8],
    id: LayerId,
) -> WavesceneResult<()> {
    let name = id.node_name();
    let snap = s.snapshot();
    let t = &s.transform;
    let position = Vec3::new(t.x, t.y, t.z);
    let rotation = Vec3::new(t.rotation_x, t.rotation_y, t.rotation_z);

    if !ctx.scene.contains(&name) {
        let mut node = SceneNode::new(name, NodeKind::TextPlaceholder);
        node.anim.loading = true;
        ctx.scene.insert(node);
        ctx.fonts.request(id, snap, position, rotation);
        return Ok(());
    }
    let node = ctx
        .scene
        .get_mut(&name)
        .ok_or_else(|| WavesceneError::render(format!("lost scene node {name}")))?;

    if node.anim.loading {
        return Ok(());
    }

    if node.anim.text_snapshot.as_ref() != Some(&snap) {
        // The old geometry keeps rendering until the new load settles, so a
        // reload never flickers.
        node.anim.loading = true;
        ctx.fonts.request(id, snap, position, rotation);
        return Ok(());
    }

    let average = average(samples);
    node.position = position;
    let scale = 1.0 + average * (s.amplitude / 100.0);
    node.scale = Vec3::splat(scale);

    let anim = &mut node.anim;
    advance_rotation(
        &mut node.rotation.x,
        &mut anim.dir_x,
        t.rotation_x,
        s.rotation_x_amplitude,
        t.max_rotation_x,
        average,
    );
    advance_rotation(
        &mut node.rotation.y,
        &mut anim.dir_y,
        t.rotation_y,
        s.rotation_y_amplitude,
        t.max_rotation_y,
        average,
    );
    advance_rotation(
        &mut node.rotation.z,
        &mut anim.dir_z,
        t.rotation_z,
        s.rotation_z_amplitude,
        t.max_rotation_z,
        average,
    );
    Ok(())
}

/// Apply one settled font load to the scene. Runs at the top of a tick,
/// never interleaved with per-frame mutation of the same node.
pub(crate) fn apply_font_load(scene: &mut Scene, load: FontLoad) {
    let name = load.layer.node_name();
    let Some(node) = scene.get_mut(&name) else {
        tracing::debug!(layer = load.layer.0, "font load settled for a removed layer");
        return;
    };
    match load.result {
        Err(err) => {
            // Known gap: the node stays Loading and renders nothing further.
            tracing::warn!(layer = load.layer.0, error = %err, "font load failed");
        }
        Ok(font) => {
            let geometry = build_text_geometry(&font, &load.snapshot);
            node.kind = NodeKind::Mesh {
                geometry,
                material: Material::solid(load.snapshot.color, 1.0),
                cast_shadow: true,
                receive_shadow: true,
            };
            // Placement captured at dispatch time applies verbatim.
            node.position = load.position;
            node.rotation = load.rotation;
            node.scale = Vec3::splat(1.0);
            node.anim.loading = false;
            node.anim.text_snapshot = Some(load.snapshot);
        }
    }
}
