//! Asynchronous font pipeline for the text preset: a closed set of font
//! faces, a fetcher boundary (asset transport stays external), a worker
//! backed library whose completions are drained by the scheduler and
//! applied as if they were their own frame, and extruded text geometry
//! built from glyph outlines.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;

use kurbo::{Affine, BezPath, PathEl};

use crate::{
    core::Vec3,
    defaults::TextSnapshot,
    error::{WavesceneError, WavesceneResult},
    geometry::Geometry,
    model::LayerId,
};

/// Closed set of font faces the text preset can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFace {
    Helvetiker,
    Optimer,
    Gentilis,
    Droid,
    DroidBold,
}

impl FontFace {
    /// Relative source path of the typeface file for this face.
    pub fn source_path(self) -> &'static str {
        match self {
            Self::Helvetiker => "helvetiker_regular.typeface.json",
            Self::Optimer => "optimer_regular.typeface.json",
            Self::Gentilis => "gentilis_regular.typeface.json",
            Self::Droid => "droid/droid_serif_regular.typeface.json",
            Self::DroidBold => "droid/droid_serif_bold.typeface.json",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Glyph {
    /// Outline in font units, y-up.
    pub path: BezPath,
    /// Horizontal advance in font units.
    pub advance: f64,
}

#[derive(Clone, Debug)]
pub struct FontData {
    pub face: FontFace,
    pub units_per_em: f64,
    pub glyphs: HashMap<char, Glyph>,
}

impl FontData {
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    /// Synthetic blocky face: every printable ASCII glyph is a rectangle.
    /// Used by tests and as the CLI fallback when no typeface directory is
    /// configured.
    pub fn placeholder(face: FontFace) -> Self {
        let mut glyphs = HashMap::new();
        for c in '!'..='~' {
            let mut path = BezPath::new();
            path.move_to((50.0, 0.0));
            path.line_to((550.0, 0.0));
            path.line_to((550.0, 700.0));
            path.line_to((50.0, 700.0));
            path.close_path();
            glyphs.insert(
                c,
                Glyph {
                    path,
                    advance: 650.0,
                },
            );
        }
        Self {
            face,
            units_per_em: 1000.0,
            glyphs,
        }
    }
}

/// Boundary with asset transport. Implementations must be shareable with
/// the loader worker.
pub trait FontFetcher: Send + Sync {
    fn fetch(&self, face: FontFace) -> WavesceneResult<FontData>;
}

/// Fetcher that always succeeds with the synthetic blocky face.
#[derive(Debug, Default)]
pub struct PlaceholderFontFetcher;

impl FontFetcher for PlaceholderFontFetcher {
    fn fetch(&self, face: FontFace) -> WavesceneResult<FontData> {
        Ok(FontData::placeholder(face))
    }
}

/// Fetcher reading typeface JSON files from a directory on disk.
#[derive(Debug)]
pub struct TypefaceFontFetcher {
    root: PathBuf,
}

impl TypefaceFontFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FontFetcher for TypefaceFontFetcher {
    fn fetch(&self, face: FontFace) -> WavesceneResult<FontData> {
        let path = self.root.join(face.source_path());
        let bytes = fs::read(&path).map_err(|e| {
            WavesceneError::asset(format!("reading font file {}: {e}", path.display()))
        })?;
        parse_typeface(face, &bytes)
    }
}

fn default_resolution() -> f64 {
    1000.0
}

#[derive(serde::Deserialize)]
struct TypefaceJson {
    glyphs: HashMap<String, TypefaceGlyph>,
    #[serde(default = "default_resolution")]
    resolution: f64,
}

#[derive(serde::Deserialize)]
struct TypefaceGlyph {
    #[serde(default)]
    ha: f64,
    #[serde(default)]
    o: String,
}

/// Parse a typeface JSON blob. Outline commands are space-separated tokens:
/// `m x y`, `l x y`, `q x y x1 y1`, `b x y x1 y1 x2 y2`, with the end point
/// first and control points after it.
pub fn parse_typeface(face: FontFace, bytes: &[u8]) -> WavesceneResult<FontData> {
    let parsed: TypefaceJson = serde_json::from_slice(bytes)
        .map_err(|e| WavesceneError::asset(format!("malformed typeface json: {e}")))?;

    let mut glyphs = HashMap::new();
    for (key, glyph) in &parsed.glyphs {
        let Some(c) = key.chars().next() else { continue };
        let path = parse_outline(&glyph.o)
            .map_err(|e| WavesceneError::asset(format!("glyph '{key}' outline: {e}")))?;
        glyphs.insert(
            c,
            Glyph {
                path,
                advance: glyph.ha,
            },
        );
    }
    Ok(FontData {
        face,
        units_per_em: parsed.resolution,
        glyphs,
    })
}

fn parse_outline(commands: &str) -> Result<BezPath, String> {
    let mut tokens = commands.split_whitespace();
    let mut path = BezPath::new();
    let mut open = false;
    let mut take = |tokens: &mut dyn Iterator<Item = &str>| -> Result<f64, String> {
        tokens
            .next()
            .ok_or_else(|| "truncated outline".to_string())?
            .parse::<f64>()
            .map_err(|e| e.to_string())
    };
    while let Some(cmd) = tokens.next() {
        match cmd {
            "m" => {
                if open {
                    path.close_path();
                }
                let x = take(&mut tokens)?;
                let y = take(&mut tokens)?;
                path.move_to((x, y));
                open = true;
            }
            "l" => {
                let x = take(&mut tokens)?;
                let y = take(&mut tokens)?;
                path.line_to((x, y));
            }
            "q" => {
                let x = take(&mut tokens)?;
                let y = take(&mut tokens)?;
                let x1 = take(&mut tokens)?;
                let y1 = take(&mut tokens)?;
                path.quad_to((x1, y1), (x, y));
            }
            "b" => {
                let x = take(&mut tokens)?;
                let y = take(&mut tokens)?;
                let x1 = take(&mut tokens)?;
                let y1 = take(&mut tokens)?;
                let x2 = take(&mut tokens)?;
                let y2 = take(&mut tokens)?;
                path.curve_to((x1, y1), (x2, y2), (x, y));
            }
            other => return Err(format!("unknown outline command '{other}'")),
        }
    }
    if open {
        path.close_path();
    }
    Ok(path)
}

/// One settled font load. Placement is the value visible at dispatch time,
/// applied verbatim on completion.
#[derive(Debug)]
pub struct FontLoad {
    pub layer: LayerId,
    pub snapshot: TextSnapshot,
    pub position: Vec3,
    pub rotation: Vec3,
    pub result: WavesceneResult<FontData>,
}

/// Owns the loader worker and the completion queue. Completions are never
/// applied here: the scheduler drains them at the top of a tick so a load
/// settling mid-session mutates the scene as its own frame, never
/// interleaved with a per-frame mutation of the same node.
pub struct FontLibrary {
    fetcher: Arc<dyn FontFetcher>,
    tx: mpsc::Sender<FontLoad>,
    rx: mpsc::Receiver<FontLoad>,
    cache: HashMap<FontFace, Arc<FontData>>,
}

impl FontLibrary {
    pub fn new(fetcher: Arc<dyn FontFetcher>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fetcher,
            tx,
            rx,
            cache: HashMap::new(),
        }
    }

    /// Dispatch a load for one text layer. A cached face completes without
    /// touching the fetcher, but still goes through the queue so it applies
    /// on the next drain. There is no cancellation: a stale in-flight load
    /// settles and applies, and the next tick's change detection issues a
    /// fresh load for the newer settings.
    pub fn request(&mut self, layer: LayerId, snapshot: TextSnapshot, position: Vec3, rotation: Vec3) {
        if let Some(font) = self.cache.get(&snapshot.font) {
            let load = FontLoad {
                layer,
                snapshot,
                position,
                rotation,
                result: Ok((**font).clone()),
            };
            let _ = self.tx.send(load);
            return;
        }
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = fetcher.fetch(snapshot.font);
            let _ = tx.send(FontLoad {
                layer,
                snapshot,
                position,
                rotation,
                result,
            });
        });
    }

    /// Collect every load settled since the last drain.
    pub fn drain(&mut self) -> Vec<FontLoad> {
        let loads: Vec<FontLoad> = self.rx.try_iter().collect();
        for load in &loads {
            if let Ok(font) = &load.result {
                self.cache
                    .entry(font.face)
                    .or_insert_with(|| Arc::new(font.clone()));
            }
        }
        loads
    }
}

/// Build extruded text geometry from a fetched font and the settings
/// snapshot captured at dispatch time. Glyph outlines are flattened with a
/// tolerance derived from `curve_segments`, offset for the bevel profile,
/// extruded through `steps` wall slices, capped, and finally re-centered on
/// the bounding-box midpoint.
pub fn build_text_geometry(font: &FontData, snap: &TextSnapshot) -> Geometry {
    let scale = f64::from(snap.size) / font.units_per_em;
    let tolerance = (f64::from(snap.size) / (f64::from(snap.curve_segments.max(1)) * 8.0))
        .max(1e-4);

    let mut contours: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut pen_x = 0.0f64;
    for c in snap.text.chars() {
        let Some(glyph) = font.glyph(c) else {
            // Unknown glyphs and whitespace advance the pen without outline.
            pen_x += font.units_per_em * 0.5 * scale;
            continue;
        };
        let mut path = glyph.path.clone();
        path.apply_affine(Affine::translate((pen_x, 0.0)) * Affine::scale(scale));
        flatten_into(&path, tolerance, &mut contours);
        pen_x += glyph.advance * scale;
    }

    let rings = bevel_profile(snap);

    let mut positions: Vec<f32> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for contour in &contours {
        let n = contour.len();
        if n < 3 {
            continue;
        }
        let normals = contour_normals(contour);
        let base = (positions.len() / 3) as u32;
        for &(z, offset) in &rings {
            for (p, nrm) in contour.iter().zip(&normals) {
                positions.extend_from_slice(&[
                    (p[0] + nrm[0] * offset) as f32,
                    (p[1] + nrm[1] * offset) as f32,
                    z as f32,
                ]);
            }
        }
        let ring_count = rings.len() as u32;
        let n32 = n as u32;
        for r in 0..ring_count - 1 {
            for i in 0..n32 {
                let a = base + r * n32 + i;
                let b = base + r * n32 + (i + 1) % n32;
                let c = a + n32;
                let d = b + n32;
                indices.extend_from_slice(&[a, b, c, b, d, c]);
            }
        }
        let caps = triangulate(contour);
        let front_base = base + (ring_count - 1) * n32;
        for [i0, i1, i2] in caps {
            let (i0, i1, i2) = (i0 as u32, i1 as u32, i2 as u32);
            indices.extend_from_slice(&[base + i0, base + i2, base + i1]);
            indices.extend_from_slice(&[front_base + i0, front_base + i1, front_base + i2]);
        }
    }

    center_on_origin(&mut positions);
    Geometry {
        positions,
        indices: Some(indices),
        dirty: true,
    }
}

/// Extrusion profile as (z, outward offset) rings. Without a bevel this is
/// a straight wall split into `steps` slices; with one, a linear chamfer
/// widens the contour by `bevel_size` over `bevel_thickness` on each side.
fn bevel_profile(snap: &TextSnapshot) -> Vec<(f64, f64)> {
    let depth = f64::from(snap.depth);
    let steps = snap.steps.max(1);
    let mut rings = Vec::new();
    if snap.bevel_enabled {
        let bt = f64::from(snap.bevel_thickness);
        let bs = f64::from(snap.bevel_size);
        let segs = snap.bevel_segments.max(1);
        for k in 0..=segs {
            let t = f64::from(k) / f64::from(segs);
            rings.push((-bt + bt * t, bs * t));
        }
        for s in 1..=steps {
            rings.push((depth * f64::from(s) / f64::from(steps), bs));
        }
        for k in 1..=segs {
            let t = f64::from(k) / f64::from(segs);
            rings.push((depth + bt * t, bs * (1.0 - t)));
        }
    } else {
        for s in 0..=steps {
            rings.push((depth * f64::from(s) / f64::from(steps), 0.0));
        }
    }
    rings
}

fn flatten_into(path: &BezPath, tolerance: f64, contours: &mut Vec<Vec<[f64; 2]>>) {
    let mut current: Vec<[f64; 2]> = Vec::new();
    kurbo::flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            if current.len() >= 3 {
                contours.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            current.push([p.x, p.y]);
        }
        PathEl::LineTo(p) => current.push([p.x, p.y]),
        PathEl::ClosePath => {}
        _ => {}
    });
    if current.len() >= 3 {
        contours.push(current);
    }
}

fn signed_area(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let [x0, y0] = points[i];
        let [x1, y1] = points[(i + 1) % n];
        area += x0 * y1 - x1 * y0;
    }
    area / 2.0
}

/// Per-vertex outward normals from the averaged adjacent edge normals.
fn contour_normals(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let n = points.len();
    let flip = if signed_area(points) >= 0.0 { 1.0 } else { -1.0 };
    let mut normals = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let e0 = [cur[0] - prev[0], cur[1] - prev[1]];
        let e1 = [next[0] - cur[0], next[1] - cur[1]];
        // Outward normal of a CCW edge is its right-hand perpendicular.
        let mut nx = (e0[1] + e1[1]) * flip;
        let mut ny = -(e0[0] + e1[0]) * flip;
        let len = (nx * nx + ny * ny).sqrt();
        if len > 1e-12 {
            nx /= len;
            ny /= len;
        } else {
            nx = 0.0;
            ny = 0.0;
        }
        normals.push([nx, ny]);
    }
    normals
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn point_in_triangle(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    let d0 = cross(a, b, p);
    let d1 = cross(b, c, p);
    let d2 = cross(c, a, p);
    let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
    !(has_neg && has_pos)
}

/// Ear-clipping triangulation of one simple contour. Holes are not carved
/// out of the caps; wall geometry still traces them.
fn triangulate(points: &[[f64; 2]]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }
    let mut idx: Vec<usize> = (0..n).collect();
    if signed_area(points) < 0.0 {
        idx.reverse();
    }
    let mut tris = Vec::new();
    while idx.len() > 3 {
        let m = idx.len();
        let mut clipped = false;
        for i in 0..m {
            let prev = idx[(i + m - 1) % m];
            let cur = idx[i];
            let next = idx[(i + 1) % m];
            let (a, b, c) = (points[prev], points[cur], points[next]);
            if cross(a, b, c) <= 0.0 {
                continue;
            }
            let blocked = idx.iter().any(|&j| {
                j != prev && j != cur && j != next && point_in_triangle(points[j], a, b, c)
            });
            if blocked {
                continue;
            }
            tris.push([prev, cur, next]);
            idx.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            // Degenerate remainder; keep what was produced.
            return tris;
        }
    }
    tris.push([idx[0], idx[1], idx[2]]);
    tris
}

fn center_on_origin(positions: &mut [f32]) {
    if positions.is_empty() {
        return;
    }
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for v in positions.chunks(3) {
        for k in 0..3 {
            min[k] = min[k].min(v[k]);
            max[k] = max[k].max(v[k]);
        }
    }
    let mid = [
        (min[0] + max[0]) / 2.0,
        (min[1] + max[1]) / 2.0,
        (min[2] + max[2]) / 2.0,
    ];
    for v in positions.chunks_mut(3) {
        for k in 0..3 {
            v[k] -= mid[k];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::TextSnapshot;
    use crate::model::TextSettings;

    fn snapshot_for(text: &str) -> TextSnapshot {
        TextSettings {
            text: Some(text.to_string()),
            ..TextSettings::default()
        }
        .resolve()
        .snapshot()
    }

    #[test]
    fn outline_parser_handles_quads_and_close() {
        let path = parse_outline("m 0 0 l 100 0 q 100 100 120 50 b 0 100 60 120 40 110").unwrap();
        assert!(path.iter().count() >= 5);
        assert!(parse_outline("m 0").is_err());
        assert!(parse_outline("z 1 2").is_err());
    }

    #[test]
    fn typeface_json_parses_glyphs_and_resolution() {
        let json = br#"{
            "resolution": 2048,
            "glyphs": {
                "A": { "ha": 1100, "o": "m 0 0 l 500 1400 l 1000 0 l 0 0" },
                " ": { "ha": 600, "o": "" }
            }
        }"#;
        let font = parse_typeface(FontFace::Helvetiker, json).unwrap();
        assert_eq!(font.units_per_em, 2048.0);
        assert_eq!(font.glyph('A').unwrap().advance, 1100.0);
    }

    #[test]
    fn triangulates_convex_and_concave_contours() {
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert_eq!(triangulate(&square).len(), 2);
        // L-shape: 6 vertices => 4 triangles.
        let ell = [
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [0.0, 2.0],
        ];
        assert_eq!(triangulate(&ell).len(), 4);
    }

    #[test]
    fn text_geometry_is_centered() {
        let font = FontData::placeholder(FontFace::Gentilis);
        let snap = snapshot_for("Hi");
        let g = build_text_geometry(&font, &snap);
        assert!(g.vertex_count() > 0);
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        for v in g.positions.chunks(3) {
            min_x = min_x.min(v[0]);
            max_x = max_x.max(v[0]);
        }
        assert!((min_x + max_x).abs() < 1e-3);
    }

    #[test]
    fn bevel_profile_widens_then_narrows() {
        let mut snap = snapshot_for("A");
        snap.bevel_enabled = true;
        snap.bevel_thickness = 0.02;
        snap.bevel_size = 0.01;
        snap.bevel_segments = 2;
        snap.steps = 1;
        let rings = bevel_profile(&snap);
        assert_eq!(rings.first().unwrap().1, 0.0);
        assert_eq!(rings.last().unwrap().1, 0.0);
        assert!(rings.iter().any(|r| r.1 > 0.0));
        assert!(rings.first().unwrap().0 < 0.0);
        assert!(rings.last().unwrap().0 > f64::from(snap.depth));
    }
}
