//! End-to-end frame-loop scenarios over the recording backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wavescene::{
    Config, FontLibrary, Layer, LayerSpec, NullRenderer, PcmAnalyser, PlaceholderFontFetcher,
    SilentAnalyser, Visualizer,
    model::{LightSettings, ShapeSettings, WaveformSettings},
    scene::{LightKind, NodeKind},
};

const FULL_SCENE: &str = include_str!("data/full_scene.json");

fn visualizer_for(config: Config, buffer_len: usize) -> Visualizer {
    Visualizer::new(
        config,
        Box::new(NullRenderer::default()),
        Box::new(SilentAnalyser(buffer_len)),
        FontLibrary::new(Arc::new(PlaceholderFontFetcher)),
    )
    .unwrap()
}

/// Tick until every layer has a settled scene node or the deadline passes.
/// Text layers settle asynchronously.
fn run_until_settled(v: &mut Visualizer) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        v.tick().unwrap();
        let settled = v.scene().len() == v.config().layers.len()
            && v
                .scene()
                .iter()
                .all(|n| !matches!(n.kind, NodeKind::TextPlaceholder));
        if settled {
            return;
        }
        assert!(Instant::now() < deadline, "scene never settled");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn full_scene_fixture_builds_one_node_per_layer() {
    let config: Config = serde_json::from_str(FULL_SCENE).unwrap();
    let mut v = visualizer_for(config, 16);
    run_until_settled(&mut v);
    assert_eq!(v.scene().len(), 5);

    // Another batch of frames must reuse the same nodes.
    v.run_frames(20).unwrap();
    assert_eq!(v.scene().len(), 5);

    let light = v.scene().get("layer-0").unwrap();
    let NodeKind::Light { kind, .. } = &light.kind else {
        panic!("expected a light node");
    };
    assert_eq!(*kind, LightKind::Point);
    assert_eq!(light.position.y, 8.0);
}

#[test]
fn light_scene_stays_static_on_silence() {
    let mut settings = LightSettings {
        intensity: Some(40.0),
        ..LightSettings::default()
    };
    settings.transform.x = Some(2.0);
    settings.transform.y = Some(3.0);
    let mut v = visualizer_for(
        Config::new(vec![Layer::new(LayerSpec::Light(settings))]),
        8,
    );
    v.run_frames(30).unwrap();
    assert_eq!(v.scene().len(), 1);
    let node = v.scene().get("layer-0").unwrap();
    assert_eq!(node.position.x, 2.0);
    assert_eq!(node.position.y, 3.0);
    assert_eq!(node.rotation.x, 0.0);
}

#[test]
fn each_declared_domain_is_extracted_once_per_frame() {
    let shape_time = ShapeSettings::default();
    let shape_freq = ShapeSettings {
        domain_type: Some(wavescene::Domain::Frequency),
        ..ShapeSettings::default()
    };
    let config = Config::new(vec![
        Layer::new(LayerSpec::Shape(shape_time.clone())),
        Layer::new(LayerSpec::Shape(shape_time)),
        Layer::new(LayerSpec::Shape(shape_freq)),
    ]);
    let mut v = visualizer_for(config, 8);
    v.run_frames(10).unwrap();
    // Two time-domain layers share one extraction per frame.
    assert_eq!(v.time_extractions(), 10);
    assert_eq!(v.frequency_extractions(), 10);
}

#[test]
fn frames_with_no_frequency_layers_skip_the_fft() {
    let config = Config::new(vec![Layer::new(LayerSpec::Waveform(
        WaveformSettings::default(),
    ))]);
    let mut analyser = PcmAnalyser::new(32).unwrap();
    analyser.push_samples(&vec![0.5f32; 64]);
    let mut v = Visualizer::new(
        config,
        Box::new(NullRenderer::default()),
        Box::new(analyser),
        FontLibrary::new(Arc::new(PlaceholderFontFetcher)),
    )
    .unwrap();
    v.run_frames(5).unwrap();
    assert_eq!(v.time_extractions(), 5);
    assert_eq!(v.frequency_extractions(), 0);
}

#[test]
fn removing_a_layer_mid_session_reclaims_its_node() {
    let config = Config::new(vec![
        Layer::new(LayerSpec::Shape(ShapeSettings::default())),
        Layer::new(LayerSpec::Waveform(WaveformSettings::default())),
    ]);
    let mut v = visualizer_for(config, 8);
    v.run_frames(3).unwrap();
    assert_eq!(v.scene().len(), 2);

    let id = v.config().layers[0].id.unwrap();
    assert!(v.remove_layer(id));
    assert_eq!(v.scene().len(), 1);

    v.run_frames(3).unwrap();
    assert_eq!(v.scene().len(), 1, "removed layers must not respawn");
    assert_eq!(v.config().layers.len(), 1);
}

#[test]
fn adding_a_layer_mid_session_gets_a_fresh_identity() {
    let mut v = visualizer_for(
        Config::new(vec![Layer::new(LayerSpec::Shape(ShapeSettings::default()))]),
        8,
    );
    v.tick().unwrap();
    v.add_layer(LayerSpec::Light(LightSettings::default()));
    v.tick().unwrap();
    assert_eq!(v.scene().len(), 2);
    let ids: Vec<_> = v.config().layers.iter().map(|l| l.id.unwrap()).collect();
    assert_ne!(ids[0], ids[1]);
}
