use log::{debug, info, warn};

use crate::{
    animation::{self, ClipSplit},
    document::{Document, Mesh, DEFAULT_MATERIAL},
    error::ExtractionError,
    merge::merge_vertices,
    record::Joint,
    scene::{HostScene, ObjectKind, RawMesh},
    triangulate::{dropped_loops, triangulate},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Material name assigned to every mesh.
    pub material: String,
    /// Abort on the first mesh that can't be extracted instead of skipping it.
    pub fail_fast: bool,
    pub clip_split: ClipSplit,
    /// Name of the clip spanning the whole timeline.
    pub clip_name: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            material: DEFAULT_MATERIAL.to_owned(),
            fail_fast: false,
            clip_split: ClipSplit::Whole,
            clip_name: "anim".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub document: Document,
    /// Meshes left out of the document because the host failed to supply them.
    pub skipped: Vec<ExtractionError>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    options: BuildOptions,
}

impl SceneBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Walks the host scene once, in the order the host lists its objects.
    ///
    /// Joint failures always abort since they would shift the joint indices
    /// other records refer to.
    pub fn build<S: HostScene + ?Sized>(&self, scene: &S) -> Result<BuildOutput, ExtractionError> {
        let mut document = Document::default();
        let mut skipped = Vec::new();

        for (index, object) in scene.objects().into_iter().enumerate() {
            match object.kind {
                ObjectKind::Mesh => {
                    debug!("Discovered mesh `{}`", object.name);
                    match scene
                        .mesh(index)
                        .and_then(|raw| self.build_mesh(&object.name, &raw))
                    {
                        Ok(mesh) => document.meshes.push(mesh),
                        Err(err) if !self.options.fail_fast => {
                            warn!("Skipping mesh `{}`: {}", object.name, err);
                            skipped.push(err);
                        }
                        Err(err) => return Err(err),
                    }
                }
                ObjectKind::Joint => {
                    debug!("Discovered joint `{}`", object.name);
                    let raw = scene.joint(index)?;
                    if document.joint_index(&raw.name).is_some() {
                        return Err(ExtractionError::DuplicateJoint(raw.name));
                    }
                    document.joints.push(Joint {
                        name: raw.name,
                        parent: raw.parent,
                        translation: raw.translation,
                        rotation: raw.rotation,
                    });
                }
                ObjectKind::Other => debug!("Ignoring object `{}`", object.name),
            }
        }

        check_parents(&document.joints)?;

        if let Some(raw) = scene.animation()? {
            document.clips = animation::build_clips(
                &document.joints,
                &raw,
                self.options.clip_split,
                &self.options.clip_name,
            )?;
        }

        info!(
            "Built document with {} meshes, {} joints and {} clips",
            document.meshes.len(),
            document.joints.len(),
            document.clips.len()
        );

        Ok(BuildOutput { document, skipped })
    }

    fn build_mesh(&self, name: &str, raw: &RawMesh) -> Result<Mesh, ExtractionError> {
        let vertices = merge_vertices(name, raw)?;

        let mut triangles = Vec::new();
        for (i, polygon) in raw.polygons.iter().enumerate() {
            let dropped = dropped_loops(polygon);
            if dropped > 0 {
                debug!(
                    "Polygon {} of `{}` is not triangulated, dropping {} loops",
                    i, name, dropped
                );
            }
            triangles.extend(triangulate(i, polygon));
        }

        debug!(
            "Mesh `{}`: {} vertices, {} triangles",
            name,
            vertices.len(),
            triangles.len()
        );

        Ok(Mesh {
            name: name.to_owned(),
            material: self.options.material.clone(),
            vertices,
            triangles,
            // skinning isn't extracted from the host yet
            weights: Vec::new(),
        })
    }
}

/// Parents may point forward, so they are checked once every joint is known.
fn check_parents(joints: &[Joint]) -> Result<(), ExtractionError> {
    let count = joints.len();
    match joints
        .iter()
        .find(|joint| joint.parent < -1 || joint.parent >= count as i32)
    {
        Some(joint) => Err(ExtractionError::InvalidParent {
            joint: joint.name.clone(),
            parent: joint.parent,
            count,
        }),
        None => Ok(()),
    }
}

/// Builds a document with the default options, skipping meshes the host
/// can't supply.
pub fn build<S: HostScene + ?Sized>(scene: &S) -> Result<Document, ExtractionError> {
    SceneBuilder::default()
        .build(scene)
        .map(|output| output.document)
}
