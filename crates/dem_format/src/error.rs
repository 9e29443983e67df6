use std::fmt;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, FormatError>;

/// Raised by a single record when it cannot be represented as a text line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Field `{field}` is not a finite number: {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("Name {0:?} is empty or contains whitespace")]
    InvalidName(String),
    #[error("Animated joint references unknown joint index {0}")]
    UnknownJoint(usize),
}

/// The host could not supply the data of a scene object.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Object `{object}` has no active uv layer")]
    MissingUvLayer { object: String },
    #[error("Object `{object}` has {positions} vertex positions but {normals} normals")]
    AttributeCountMismatch {
        object: String,
        positions: usize,
        normals: usize,
    },
    #[error("Polygon {polygon} of `{object}` references vertex {vertex}, mesh has {count} vertices")]
    VertexOutOfRange {
        object: String,
        polygon: usize,
        vertex: usize,
        count: usize,
    },
    #[error("Animation track references unknown joint `{0}`")]
    UnknownJoint(String),
    #[error("Joint name `{0}` is used more than once")]
    DuplicateJoint(String),
    #[error("Joint `{joint}` has parent {parent}, expected -1 or an index below {count}")]
    InvalidParent {
        joint: String,
        parent: i32,
        count: usize,
    },
    #[error("Joint `{0}` has more than one animation track")]
    DuplicateTrack(String),
    #[error("Animation track for `{joint}` has {samples} samples, expected {expected}")]
    TrackLength {
        joint: String,
        samples: usize,
        expected: usize,
    },
    #[error("Object `{object}` could not be extracted: {reason}")]
    Host { object: String, reason: String },
}

/// Identifies the record that failed to encode.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordLocation {
    Joint(usize),
    Mesh(String),
    Vertex { mesh: String, index: usize },
    Triangle { mesh: String, index: usize },
    Weight { mesh: String, index: usize },
    Clip(String),
    AnimJoint { clip: String, index: usize },
    Frame { clip: String, index: usize },
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLocation::Joint(index) => write!(f, "joint {}", index),
            RecordLocation::Mesh(mesh) => write!(f, "mesh `{}`", mesh),
            RecordLocation::Vertex { mesh, index } => write!(f, "mesh `{}` vertex {}", mesh, index),
            RecordLocation::Triangle { mesh, index } => {
                write!(f, "mesh `{}` triangle {}", mesh, index)
            }
            RecordLocation::Weight { mesh, index } => write!(f, "mesh `{}` weight {}", mesh, index),
            RecordLocation::Clip(clip) => write!(f, "clip `{}`", clip),
            RecordLocation::AnimJoint { clip, index } => {
                write!(f, "clip `{}` joint {}", clip, index)
            }
            RecordLocation::Frame { clip, index } => write!(f, "clip `{}` frame {}", clip, index),
        }
    }
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Encoding Error in {location}: {source}")]
    Encoding {
        location: RecordLocation,
        #[source]
        source: EncodingError,
    },
    #[error("Extraction Error: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Parse Error on line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormatError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        FormatError::Parse {
            line,
            reason: reason.into(),
        }
    }
}
