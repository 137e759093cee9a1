//! The host-facing facade: owns the declarative config, the retained scene,
//! the analyser and the render backend, and drives the per-frame pipeline.

use crate::{
    audio::{Analyser, FrameSamples, Transport},
    error::{WavesceneError, WavesceneResult},
    fonts::FontLibrary,
    model::{Config, Layer, LayerId, LayerSpec},
    render::{RenderCtx, apply_font_load, render_layer},
    scene::{Camera, Renderer, Scene},
    sched::{FramePacer, LoopState, ResizeDebouncer},
};

pub struct Visualizer {
    config: Config,
    scene: Scene,
    camera: Camera,
    renderer: Box<dyn Renderer>,
    analyser: Box<dyn Analyser>,
    transport: Option<Box<dyn Transport>>,
    samples: FrameSamples,
    fonts: FontLibrary,
    state: LoopState,
    pacer: FramePacer,
    resize: ResizeDebouncer,
    next_layer_id: u64,
    frames: u64,
}

impl Visualizer {
    /// Validates the config and brings the backend to a renderable state.
    /// Setup is all-or-nothing; an invalid config constructs nothing.
    pub fn new(
        config: Config,
        renderer: Box<dyn Renderer>,
        analyser: Box<dyn Analyser>,
        fonts: FontLibrary,
    ) -> WavesceneResult<Self> {
        config.validate()?;
        let buffer_len = analyser.buffer_len();
        let next_layer_id = config
            .layers
            .iter()
            .filter_map(|l| l.id)
            .map(|id| id.0 + 1)
            .max()
            .unwrap_or(0);
        let pacer = FramePacer::new(config.frame_delay);
        let mut state = LoopState::Idle;
        state.start()?;
        let mut visualizer = Self {
            config,
            scene: Scene::new(),
            camera: Camera::new(16.0 / 9.0),
            renderer,
            analyser,
            transport: None,
            samples: FrameSamples::new(buffer_len),
            fonts,
            state,
            pacer,
            resize: ResizeDebouncer::default(),
            next_layer_id,
            frames: 0,
        };
        visualizer
            .renderer
            .set_clear_color(visualizer.config.background);
        visualizer.renderer.set_pixel_ratio(1.0);
        Ok(visualizer)
    }

    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// One frame of the pipeline: settled font loads first, then any
    /// debounced resize, then every layer in declaration order, then one
    /// submit to the backend.
    #[tracing::instrument(level = "debug", skip_all, fields(frame = self.frames))]
    pub fn tick(&mut self) -> WavesceneResult<()> {
        if !self.state.is_running() {
            return Err(WavesceneError::render("tick on a stopped visualizer"));
        }

        for load in self.fonts.drain() {
            apply_font_load(&mut self.scene, load);
        }

        if let Some((width, height)) = self.resize.poll() {
            self.apply_size(width, height);
        }

        self.renderer.set_clear_color(self.config.background);
        self.samples.begin_frame();

        let Self {
            config,
            scene,
            camera,
            renderer,
            analyser,
            samples,
            fonts,
            next_layer_id,
            ..
        } = self;
        for layer in &mut config.layers {
            let id = *layer.id.get_or_insert_with(|| {
                let id = LayerId(*next_layer_id);
                *next_layer_id += 1;
                id
            });
            let buf = samples.sample(analyser.as_mut(), layer.spec.domain());
            let mut ctx = RenderCtx {
                scene,
                camera,
                renderer: renderer.as_mut(),
                fonts,
            };
            // One broken layer never takes the frame down with it.
            if let Err(err) = render_layer(&mut ctx, &layer.spec, buf, id) {
                tracing::warn!(
                    layer = id.0,
                    preset = %layer.spec.preset(),
                    error = %err,
                    "layer render failed, skipping for this frame",
                );
            }
        }

        self.renderer.submit(&self.scene, &self.camera)?;
        self.frames += 1;
        self.pacer.after_frame();
        Ok(())
    }

    pub fn run_frames(&mut self, n: u64) -> WavesceneResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(())
    }

    /// Start audio playback on the wired transport. Transport failures are
    /// logged and leave the render loop untouched.
    pub fn play(&mut self) {
        if let Some(transport) = &mut self.transport {
            if let Err(err) = transport.play() {
                tracing::warn!(error = %err, "audio transport failed to start");
            }
        }
    }

    pub fn pause(&mut self) {
        if let Some(transport) = &mut self.transport {
            if let Err(err) = transport.pause() {
                tracing::warn!(error = %err, "audio transport failed to pause");
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_playing())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Live edits to the layer store; the next tick picks them up.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn add_layer(&mut self, spec: LayerSpec) {
        self.config.layers.push(Layer::new(spec));
    }

    /// Remove a layer and its retained scene node. A no-op for unknown
    /// identities.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let before = self.config.layers.len();
        self.config.layers.retain(|l| l.id != Some(id));
        self.scene.remove(&id.node_name());
        self.config.layers.len() != before
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.renderer.set_pixel_ratio(ratio);
    }

    /// Debounced: a burst of calls applies once, after a quiet period.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.resize.push(width, height);
    }

    fn apply_size(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.camera.set_aspect(width as f32 / height as f32);
        self.renderer.set_size(width, height);
        tracing::debug!(width, height, "viewport resized");
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn time_extractions(&self) -> u64 {
        self.samples.time_extractions
    }

    pub fn frequency_extractions(&self) -> u64 {
        self.samples.frequency_extractions
    }

    /// Stop the loop for good. Further ticks fail; the scene stays readable.
    pub fn shutdown(&mut self) {
        self.state.stop();
        tracing::info!(frames = self.frames, "visualizer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::SilentAnalyser,
        fonts::PlaceholderFontFetcher,
        model::{LightSettings, ShapeSettings},
        scene::NullRenderer,
    };
    use std::sync::Arc;

    fn shape_config() -> Config {
        Config::new(vec![Layer::new(LayerSpec::Shape(ShapeSettings::default()))])
    }

    fn new_visualizer(config: Config) -> Visualizer {
        Visualizer::new(
            config,
            Box::new(NullRenderer::default()),
            Box::new(SilentAnalyser(8)),
            FontLibrary::new(Arc::new(PlaceholderFontFetcher)),
        )
        .unwrap()
    }

    #[test]
    fn invalid_config_constructs_nothing() {
        let result = Visualizer::new(
            Config::new(vec![]),
            Box::new(NullRenderer::default()),
            Box::new(SilentAnalyser(8)),
            FontLibrary::new(Arc::new(PlaceholderFontFetcher)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn ticks_assign_stable_identities_and_reuse_nodes() {
        let mut v = new_visualizer(shape_config());
        v.run_frames(5).unwrap();
        assert_eq!(v.scene().len(), 1);
        let id = v.config().layers[0].id.unwrap();
        v.run_frames(5).unwrap();
        assert_eq!(v.config().layers[0].id.unwrap(), id);
        assert_eq!(v.frames_rendered(), 10);
    }

    #[test]
    fn assigned_identities_skip_preexisting_ones() {
        let mut config = Config::new(vec![
            Layer::new(LayerSpec::Shape(ShapeSettings::default())),
            Layer::new(LayerSpec::Light(LightSettings::default())),
        ]);
        config.layers[0].id = Some(LayerId(5));
        let mut v = new_visualizer(config);
        v.tick().unwrap();
        assert_eq!(v.config().layers[1].id, Some(LayerId(6)));
    }

    #[test]
    fn remove_layer_tears_down_the_scene_node() {
        let mut v = new_visualizer(shape_config());
        v.tick().unwrap();
        let id = v.config().layers[0].id.unwrap();
        assert!(v.scene().contains(&id.node_name()));
        assert!(v.remove_layer(id));
        assert!(!v.scene().contains(&id.node_name()));
        assert!(v.config().layers.is_empty());
        assert!(!v.remove_layer(id));
    }

    #[test]
    fn shutdown_is_terminal() {
        let mut v = new_visualizer(shape_config());
        v.tick().unwrap();
        v.shutdown();
        assert!(v.tick().is_err());
    }
}
