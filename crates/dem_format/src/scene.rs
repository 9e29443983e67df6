use serde::Deserialize;

use crate::error::ExtractionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Mesh,
    Joint,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub name: String,
}

/// One polygon corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Loop {
    pub vertex: usize,
    #[serde(default)]
    pub uv: [f64; 2],
    #[serde(default)]
    pub color: [f64; 3],
}

impl Loop {
    pub fn new(vertex: usize, uv: [f64; 2], color: [f64; 3]) -> Self {
        Self { vertex, uv, color }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    pub loops: Vec<Loop>,
}

impl From<Vec<Loop>> for Polygon {
    fn from(loops: Vec<Loop>) -> Self {
        Self { loops }
    }
}

/// Geometry of a mesh object; positions and normals are indexed by mesh vertex.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawJoint {
    pub name: String,
    /// Index of the parent joint, `-1` for roots.
    pub parent: i32,
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
}

/// Named position on the timeline where a clip starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Marker {
    pub name: String,
    pub frame: usize,
}

/// Absolute local transforms of one joint, one `[tx, ty, tz, rx, ry, rz]` per frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub joint: String,
    pub samples: Vec<[f64; 6]>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAnimation {
    pub frame_rate: u32,
    pub frame_count: usize,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Scene supplied by the host application.
///
/// `index` arguments refer to positions in the list returned by
/// [`HostScene::objects`].
pub trait HostScene {
    fn objects(&self) -> Vec<SceneObject>;

    fn mesh(&self, index: usize) -> Result<RawMesh, ExtractionError>;

    fn joint(&self, index: usize) -> Result<RawJoint, ExtractionError>;

    fn animation(&self) -> Result<Option<RawAnimation>, ExtractionError> {
        Ok(None)
    }
}
