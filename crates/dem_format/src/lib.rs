mod animation;
pub mod builder;
pub mod document;
pub mod error;
pub mod merge;
pub mod parser;
pub mod record;
pub mod scene;
pub mod triangulate;
pub mod writer;

pub use animation::ClipSplit;
pub use builder::{build, BuildOptions, BuildOutput, SceneBuilder};
pub use document::{Clip, Document, Mesh};
pub use error::{EncodingError, ExtractionError, FormatError, Result};
pub use writer::{write, write_with, Sections, WriterOptions};
