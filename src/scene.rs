//! Retained scene graph plus the identity cache that makes per-frame
//! rendering idempotent: nodes live in a dense arena and are looked up by
//! the name derived from their layer identity, so a render function finds
//! its existing node instead of constructing a second one.

use std::collections::HashMap;

use crate::{
    core::{Color, Vec3},
    defaults::TextSnapshot,
    geometry::Geometry,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Point,
    Spot,
    Directional,
    Ambient,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    /// Fixed at construction for mesh materials; never updated afterwards.
    pub opacity: f32,
    pub line_width: f32,
}

impl Material {
    pub fn solid(color: Color, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            line_width: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Mesh {
        geometry: Geometry,
        material: Material,
        cast_shadow: bool,
        receive_shadow: bool,
    },
    /// Connected polyline (waveform preset).
    Line {
        geometry: Geometry,
        material: Material,
    },
    /// Disconnected endpoint pairs (line-waveform preset).
    LineSegments {
        geometry: Geometry,
        material: Material,
    },
    Light {
        kind: LightKind,
        color: Color,
        intensity: f32,
    },
    /// Empty node holding a text layer's place while its font load is in
    /// flight; becomes a `Mesh` when the load settles.
    TextPlaceholder,
}

/// Per-node animation bookkeeping, owned by the node and destroyed with it.
#[derive(Clone, Debug)]
pub struct AnimationState {
    /// Ping-pong direction factors per rotation axis, ±1.
    pub dir_x: f32,
    pub dir_y: f32,
    pub dir_z: f32,
    /// True while an async font load for this node is in flight.
    pub loading: bool,
    /// Last-applied text parameters, for reload change detection.
    pub text_snapshot: Option<TextSnapshot>,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            dir_x: 1.0,
            dir_y: 1.0,
            dir_z: 1.0,
            loading: false,
            text_snapshot: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub position: Vec3,
    /// Euler rotation in radians, XYZ order.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub kind: NodeKind,
    pub anim: AnimationState,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::splat(1.0),
            kind,
            anim: AnimationState::default(),
        }
    }
}

/// Dense node arena with a name index. At most one live node per name;
/// lookups are O(1) amortized instead of a linear child scan.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    index: HashMap<String, usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SceneNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// Insert a freshly constructed node. Replaces any node already holding
    /// the name, preserving the at-most-one-node-per-identity invariant even
    /// if a render function skips its existence check.
    pub fn insert(&mut self, node: SceneNode) -> &mut SceneNode {
        if let Some(&i) = self.index.get(&node.name) {
            self.nodes[i] = node;
            return &mut self.nodes[i];
        }
        let i = self.nodes.len();
        self.index.insert(node.name.clone(), i);
        self.nodes.push(node);
        &mut self.nodes[i]
    }

    /// Explicit teardown path for orphaned layers; the core never reclaims
    /// nodes on its own.
    pub fn remove(&mut self, name: &str) -> Option<SceneNode> {
        let i = self.index.remove(name)?;
        let node = self.nodes.swap_remove(i);
        if let Some(moved) = self.nodes.get(i) {
            self.index.insert(moved.name.clone(), i);
        }
        Some(node)
    }

    /// Nodes in insertion order (draw order for the backend).
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_deg: 75.0,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Column-major perspective projection matrix.
    pub fn projection(&self) -> [[f32; 4]; 4] {
        let f = 1.0 / (self.fov_deg.to_radians() / 2.0).tan();
        let range = self.near - self.far;
        [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (self.near + self.far) / range, -1.0],
            [0.0, 0.0, 2.0 * self.near * self.far / range, 0.0],
        ]
    }
}

/// Boundary with the host rendering library: everything the core needs
/// from a GPU backend, and nothing else.
pub trait Renderer {
    fn set_clear_color(&mut self, color: Color);
    fn set_pixel_ratio(&mut self, ratio: f32);
    fn set_size(&mut self, width: u32, height: u32);
    /// One-way switch: once any light enables shadow maps they stay on for
    /// the session.
    fn enable_shadow_maps(&mut self);
    fn shadow_maps_enabled(&self) -> bool;
    fn submit(&mut self, scene: &Scene, camera: &Camera) -> crate::error::WavesceneResult<()>;
}

/// Headless backend for tests and the CLI: records state, draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub clear_color: Option<Color>,
    pub pixel_ratio: f32,
    pub size: (u32, u32),
    pub shadow_maps: bool,
    pub frames_submitted: u64,
    pub shadow_map_enable_calls: u64,
}

impl Renderer for NullRenderer {
    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = Some(color);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn enable_shadow_maps(&mut self) {
        self.shadow_map_enable_calls += 1;
        self.shadow_maps = true;
    }

    fn shadow_maps_enabled(&self) -> bool {
        self.shadow_maps
    }

    fn submit(&mut self, _scene: &Scene, _camera: &Camera) -> crate::error::WavesceneResult<()> {
        self.frames_submitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(name: &str) -> SceneNode {
        SceneNode::new(name, NodeKind::TextPlaceholder)
    }

    #[test]
    fn insert_then_lookup_by_name() {
        let mut scene = Scene::new();
        scene.insert(placeholder("layer-0"));
        scene.insert(placeholder("layer-1"));
        assert_eq!(scene.len(), 2);
        assert!(scene.get("layer-0").is_some());
        assert!(scene.get("layer-9").is_none());
    }

    #[test]
    fn insert_with_same_name_replaces_not_duplicates() {
        let mut scene = Scene::new();
        scene.insert(placeholder("layer-0"));
        let node = scene.insert(placeholder("layer-0"));
        node.position = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.get("layer-0").unwrap().position.x, 1.0);
    }

    #[test]
    fn remove_keeps_index_consistent_after_swap() {
        let mut scene = Scene::new();
        scene.insert(placeholder("a"));
        scene.insert(placeholder("b"));
        scene.insert(placeholder("c"));
        assert!(scene.remove("a").is_some());
        // "c" was swapped into slot 0; it must still be reachable.
        assert!(scene.get("c").is_some());
        assert!(scene.get_mut("b").is_some());
        assert_eq!(scene.len(), 2);
        assert!(scene.remove("a").is_none());
    }

    #[test]
    fn shadow_map_switch_is_one_way() {
        let mut r = NullRenderer::default();
        assert!(!r.shadow_maps_enabled());
        r.enable_shadow_maps();
        r.enable_shadow_maps();
        assert!(r.shadow_maps_enabled());
        assert_eq!(r.shadow_map_enable_calls, 2);
    }

    #[test]
    fn projection_uses_aspect() {
        let cam = Camera::new(2.0);
        let m = cam.projection();
        assert!((m[0][0] - m[1][1] / 2.0).abs() < 1e-6);
    }
}
