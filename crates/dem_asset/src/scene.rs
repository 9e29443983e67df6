//! Scene description files (`.scene`), a TOML stand in for a host application.
//!
//! ```toml
//! [[objects]]
//! kind = "joint"
//! name = "root"
//! translation = [0.0, 1.0, 0.0]
//!
//! [[objects]]
//! kind = "mesh"
//! name = "Body"
//! [objects.mesh]
//! positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
//! normals = [[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]
//! polygons = [[{ vertex = 0 }, { vertex = 1 }, { vertex = 2 }]]
//!
//! [animation]
//! frame_rate = 24
//! frame_count = 2
//! markers = [{ name = "idle", frame = 0 }]
//! tracks = [{ joint = "root", samples = [[0, 1, 0, 0, 0, 0], [0, 2, 0, 0, 0, 0]] }]
//! ```

use anyhow::{Context, Result};
use dem_format::{
    scene::{HostScene, ObjectKind, RawAnimation, RawJoint, RawMesh, SceneObject},
    ExtractionError,
};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{export, export::ExportMode, meta::ExportMeta};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SceneEntry {
    kind: ObjectKind,
    name: String,
    /// Index of the parent among the joint entries, `-1` for roots.
    #[serde(default = "root_parent")]
    parent: i32,
    #[serde(default)]
    translation: [f64; 3],
    #[serde(default)]
    rotation: [f64; 3],
    mesh: Option<RawMesh>,
}

fn root_parent() -> i32 {
    -1
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SceneFile {
    #[serde(default)]
    objects: Vec<SceneEntry>,
    animation: Option<RawAnimation>,
}

impl SceneFile {
    pub(crate) fn parse(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let scene: Self = toml::from_str(&data)
            .with_context(|| format!("Invalid scene description: {}", path.display()))?;
        Ok(scene)
    }

    fn entry(&self, index: usize) -> &SceneEntry {
        &self.objects[index]
    }
}

impl HostScene for SceneFile {
    fn objects(&self) -> Vec<SceneObject> {
        self.objects
            .iter()
            .map(|entry| SceneObject {
                kind: entry.kind,
                name: entry.name.clone(),
            })
            .collect()
    }

    fn mesh(&self, index: usize) -> Result<RawMesh, ExtractionError> {
        let entry = self.entry(index);
        entry.mesh.clone().ok_or_else(|| ExtractionError::Host {
            object: entry.name.clone(),
            reason: "mesh object without a [mesh] table".into(),
        })
    }

    fn joint(&self, index: usize) -> Result<RawJoint, ExtractionError> {
        let entry = self.entry(index);
        Ok(RawJoint {
            name: entry.name.clone(),
            parent: entry.parent,
            translation: entry.translation,
            rotation: entry.rotation,
        })
    }

    fn animation(&self) -> Result<Option<RawAnimation>, ExtractionError> {
        Ok(self.animation.clone())
    }
}

/// Exports the objects and animation of a `.scene` description.
pub(crate) fn process(
    path: &Path,
    output_dir: &Path,
    mode: Option<ExportMode>,
) -> Result<Vec<PathBuf>> {
    info!("Processing scene description: `{}`", path.display());
    let mut meta = ExportMeta::resolve(path, "scene")?;
    if let Some(mode) = mode {
        meta.mode = mode;
    }

    let scene = SceneFile::parse(path)?;
    export::export(&scene, path, output_dir, &meta)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const RIG: &str = r#"
[[objects]]
kind = "joint"
name = "root"
translation = [0.0, 1.0, 0.0]

[[objects]]
kind = "joint"
name = "arm"
parent = 0

[[objects]]
kind = "other"
name = "Camera"

[[objects]]
kind = "mesh"
name = "Body"
[objects.mesh]
positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
normals = [[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]
polygons = [[{ vertex = 0 }, { vertex = 1, uv = [1.0, 0.0] }, { vertex = 2 }]]

[[objects]]
kind = "mesh"
name = "Broken"

[animation]
frame_rate = 24
frame_count = 2
tracks = [{ joint = "root", samples = [[0.0, 1.0, 0.0, 0.0, 0.0, 0.0], [0.0, 2.0, 0.0, 0.0, 0.0, 0.0]] }]
"#;

    #[test]
    fn test_scene_objects() -> Result<()> {
        let scene: SceneFile = toml::from_str(RIG)?;
        let kinds: Vec<ObjectKind> = scene.objects().iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::Joint,
                ObjectKind::Joint,
                ObjectKind::Other,
                ObjectKind::Mesh,
                ObjectKind::Mesh
            ]
        );

        assert_eq!(scene.joint(0)?.parent, -1);
        assert_eq!(scene.joint(1)?.parent, 0);
        assert_eq!(scene.mesh(3)?.polygons[0].loops[1].uv, [1.0, 0.0]);
        assert!(matches!(
            scene.mesh(4),
            Err(ExtractionError::Host { object, .. }) if object == "Broken"
        ));
        assert_eq!(scene.animation()?.map(|a| a.frame_count), Some(2));
        Ok(())
    }

    #[test]
    fn test_process_skips_broken_mesh() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        let path = input.path().join("rig.scene");
        fs::write(&path, RIG)?;

        let written = process(&path, output.path(), Some(ExportMode::DemDema))?;
        assert_eq!(
            written,
            vec![output.path().join("rig.dem"), output.path().join("rig.dema")]
        );

        let model = fs::read_to_string(&written[0])?;
        assert!(model.starts_with("DEM_10\njoints 2\nmeshes 1\nmesh Body\n"));

        let animation = fs::read_to_string(&written[1])?;
        assert_eq!(
            animation,
            "DEMA_10\n\
             clips 1\n\
             clip anim 24 2 1\n\
             h root -1 2 0\n\
             frames 2\n\
             f 0 0.0 0.0 0.0 0.0 0.0 0.0\n\
             f 1 0.0 1.0 0.0 0.0 0.0 0.0\n"
        );
        Ok(())
    }

    #[test]
    fn test_fail_fast() -> Result<()> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        let path = input.path().join("rig.scene");
        fs::write(&path, RIG)?;
        fs::write(input.path().join("scene.toml"), "fail_fast = true\n")?;

        assert!(process(&path, output.path(), None).is_err());
        Ok(())
    }
}
