use crate::{
    error::EncodingError,
    record::{check_name, AnimJoint, Encode, Frame, Joint, Triangle, Vertex, Weight},
};

/// Identifier of model documents.
pub const FORMAT_IDENTIFIER: &str = "DEM";
/// Identifier of documents holding nothing but animation.
pub const ANIMATION_IDENTIFIER: &str = "DEMA";
pub const FORMAT_VERSION: u32 = 10;

/// Material every mesh is exported with unless configured otherwise.
pub const DEFAULT_MATERIAL: &str = "lightmapped_generic";

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub material: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub weights: Vec<Weight>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: DEFAULT_MATERIAL.to_owned(),
            vertices: Vec::new(),
            triangles: Vec::new(),
            weights: Vec::new(),
        }
    }
}

/// An animation clip. Each animated joint owns `frame_count` consecutive
/// entries of `frames`, starting at its `start_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    pub frame_rate: u32,
    pub frame_count: usize,
    pub joints: Vec<AnimJoint>,
    pub frames: Vec<Frame>,
}

impl Clip {
    pub fn new(name: impl Into<String>, frame_rate: u32, frame_count: usize) -> Self {
        Self {
            name: name.into(),
            frame_rate,
            frame_count,
            joints: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Frames belonging to `joint`, empty if the run lies outside the buffer.
    pub fn frames_of(&self, joint: &AnimJoint) -> &[Frame] {
        joint
            .start_index
            .checked_add(self.frame_count)
            .and_then(|end| self.frames.get(joint.start_index..end))
            .unwrap_or(&[])
    }
}

/// Written as the `clip` line opening a clip section.
impl Encode for Clip {
    fn encode(&self) -> Result<String, EncodingError> {
        Ok(format!(
            "clip {} {} {} {}\n",
            check_name(&self.name)?,
            self.frame_rate,
            self.frame_count,
            self.joints.len()
        ))
    }
}

/// Root of an export: everything written to one or more DEM/DEMA files.
///
/// Mesh and joint order is the order the host listed its objects in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub joints: Vec<Joint>,
    pub meshes: Vec<Mesh>,
    pub clips: Vec<Clip>,
}

impl Document {
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|joint| joint.name == name)
    }

    /// A copy sharing this document's skeleton that holds only `clip`.
    pub fn with_clip(&self, clip: &Clip) -> Self {
        Self {
            joints: self.joints.clone(),
            meshes: Vec::new(),
            clips: vec![clip.clone()],
        }
    }
}
