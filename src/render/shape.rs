use crate::{
    core::Vec3,
    defaults::ResolvedShape,
    error::WavesceneResult,
    model::LayerId,
    render::{RenderCtx, advance_rotation, average},
    scene::{Material, NodeKind, SceneNode},
};

pub(super) fn render(
    ctx: &mut RenderCtx<'_>,
    s: &ResolvedShape,
    samples: &[u8],
    id: LayerId,
) -> WavesceneResult<()> {
    let name = id.node_name();
    if !ctx.scene.contains(&name) {
        let node = SceneNode::new(
            name.clone(),
            NodeKind::Mesh {
                geometry: s.shape.build(s.size),
                material: Material::solid(s.color, s.opacity),
                cast_shadow: s.cast_shadow,
                receive_shadow: s.receive_shadow,
            },
        );
        ctx.scene.insert(node);
    }
    let node = ctx
        .scene
        .get_mut(&name)
        .ok_or_else(|| crate::error::WavesceneError::render(format!("lost scene node {name}")))?;

    let average = average(samples);
    let scale = 1.0 + average * (s.amplitude / 100.0);
    node.scale = Vec3::splat(scale);
    node.position = Vec3::new(s.transform.x, s.transform.y, s.transform.z);

    // Live recoloring; opacity and shadow flags stay as constructed.
    if let NodeKind::Mesh { material, .. } = &mut node.kind {
        material.color = s.color;
    }

    let t = &s.transform;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fonts::{FontLibrary, PlaceholderFontFetcher},
        model::ShapeSettings,
        scene::{Camera, NullRenderer, Scene},
    };
    use std::sync::Arc;

    fn ctx_parts() -> (Scene, Camera, NullRenderer, FontLibrary) {
        (
            Scene::new(),
            Camera::new(1.0),
            NullRenderer::default(),
            FontLibrary::new(Arc::new(PlaceholderFontFetcher)),
        )
    }

    #[test]
    fn repeated_renders_reuse_one_node() {
        let (mut scene, mut camera, mut renderer, mut fonts) = ctx_parts();
        let resolved = ShapeSettings::default().resolve();
        for _ in 0..5 {
            let mut ctx = RenderCtx {
                scene: &mut scene,
                camera: &mut camera,
                renderer: &mut renderer,
                fonts: &mut fonts,
            };
            render(&mut ctx, &resolved, &[0; 16], LayerId(3)).unwrap();
        }
        assert_eq!(scene.len(), 1);
        assert!(scene.get("layer-3").is_some());
    }

    #[test]
    fn scale_follows_buffer_average() {
        let (mut scene, mut camera, mut renderer, mut fonts) = ctx_parts();
        let resolved = ShapeSettings {
            amplitude: Some(2.0),
            ..ShapeSettings::default()
        }
        .resolve();
        let mut ctx = RenderCtx {
            scene: &mut scene,
            camera: &mut camera,
            renderer: &mut renderer,
            fonts: &mut fonts,
        };
        render(&mut ctx, &resolved, &[100; 8], LayerId(0)).unwrap();
        let node = scene.get("layer-0").unwrap();
        assert!((node.scale.x - 3.0).abs() < 1e-5); // 1 + 100*(2/100)
        assert_eq!(node.scale.x, node.scale.y);
    }

    #[test]
    fn fixed_rotation_applied_when_amplitude_is_zero() {
        let (mut scene, mut camera, mut renderer, mut fonts) = ctx_parts();
        let mut settings = ShapeSettings::default();
        settings.transform.rotation_y = Some(0.7);
        let resolved = settings.resolve();
        let mut ctx = RenderCtx {
            scene: &mut scene,
            camera: &mut camera,
            renderer: &mut renderer,
            fonts: &mut fonts,
        };
        render(&mut ctx, &resolved, &[255; 8], LayerId(0)).unwrap();
        assert_eq!(scene.get("layer-0").unwrap().rotation.y, 0.7);
    }

    #[test]
    fn color_is_reapplied_every_frame() {
        let (mut scene, mut camera, mut renderer, mut fonts) = ctx_parts();
        let first = ShapeSettings::default().resolve();
        let mut ctx = RenderCtx {
            scene: &mut scene,
            camera: &mut camera,
            renderer: &mut renderer,
            fonts: &mut fonts,
        };
        render(&mut ctx, &first, &[0; 8], LayerId(0)).unwrap();

        let recolored = ShapeSettings {
            color: Some("red".parse().unwrap()),
            ..ShapeSettings::default()
        }
        .resolve();
        let mut ctx = RenderCtx {
            scene: &mut scene,
            camera: &mut camera,
            renderer: &mut renderer,
            fonts: &mut fonts,
        };
        render(&mut ctx, &recolored, &[0; 8], LayerId(0)).unwrap();
        let NodeKind::Mesh { material, .. } = &scene.get("layer-0").unwrap().kind else {
            panic!("expected mesh");
        };
        assert_eq!(material.color, "red".parse().unwrap());
    }
}
