use crate::{
    core::Vec3,
    defaults::ResolvedLight,
    error::{WavesceneError, WavesceneResult},
    model::LayerId,
    render::RenderCtx,
    scene::{NodeKind, SceneNode},
};

pub(super) fn render(
    ctx: &mut RenderCtx<'_>,
    s: &ResolvedLight,
    id: LayerId,
) -> WavesceneResult<()> {
    let name = id.node_name();
    if !ctx.scene.contains(&name) {
        let node = SceneNode::new(
            name.clone(),
            NodeKind::Light {
                kind: s.kind,
                color: s.color,
                intensity: s.intensity,
            },
        );
        ctx.scene.insert(node);
        // Constructing any light turns shadow mapping on for the session.
        ctx.renderer.enable_shadow_maps();
    }
    let node = ctx
        .scene
        .get_mut(&name)
        .ok_or_else(|| WavesceneError::render(format!("lost scene node {name}")))?;

    let t = &s.transform;
    node.position = Vec3::new(t.x, t.y, t.z);
    node.rotation = Vec3::new(t.rotation_x, t.rotation_y, t.rotation_z);
    // Kind is fixed for the node's lifetime; intensity and color track the
    // resolved settings every frame.
    if let NodeKind::Light {
        color, intensity, ..
    } = &mut node.kind
    {
        *color = s.color;
        *intensity = s.intensity;
    }
    Ok(())
}
