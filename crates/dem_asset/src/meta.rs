use anyhow::{Context, Result};
use dem_format::{document::DEFAULT_MATERIAL, BuildOptions, WriterOptions};
use serde::Deserialize;
use std::path::Path;

use crate::{export::ExportMode, utils};

/// Export settings of a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct ExportMeta {
    pub(crate) mode: ExportMode,
    pub(crate) fail_fast: bool,
    pub(crate) joint_lines: bool,
    pub(crate) material: String,
    pub(crate) flip_axis: [bool; 3],
    pub(crate) calculate_normals: bool,
}

impl Default for ExportMeta {
    fn default() -> Self {
        Self {
            mode: ExportMode::default(),
            fail_fast: false,
            joint_lines: false,
            material: DEFAULT_MATERIAL.to_owned(),
            flip_axis: [false; 3],
            calculate_normals: false,
        }
    }
}

impl ExportMeta {
    pub(crate) fn parse(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let meta: Self = toml::from_str(&data)
            .with_context(|| format!("Invalid export settings: {}", path.display()))?;
        Ok(meta)
    }

    /// Meta from `file.toml` next to the asset, else from a folder scoped
    /// `<extension>.toml`, else the defaults.
    pub(crate) fn resolve(path: &Path, extension: &str) -> Result<Self> {
        let dir = path
            .parent()
            .with_context(|| format!("Path terminates in root or prefix: {}", path.display()))?;
        let meta_file = utils::file_name(path)?;

        let path = utils::combine_path(dir, meta_file, "toml")?;
        if path.is_file() {
            return Self::parse(&path);
        }

        let path = utils::combine_path(dir, extension, "toml")?;
        if path.is_file() {
            return Self::parse(&path);
        }

        Ok(Self::default())
    }

    pub(crate) fn build_options(&self) -> BuildOptions {
        BuildOptions {
            material: self.material.clone(),
            fail_fast: self.fail_fast,
            clip_split: self.mode.clip_split(),
            ..BuildOptions::default()
        }
    }

    pub(crate) fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            joint_lines: self.joint_lines,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dem_format::ClipSplit;
    use std::fs;

    #[test]
    fn test_parse_meta() -> Result<()> {
        let meta: ExportMeta = toml::from_str(
            r#"
            mode = "DEMA_MULT"
            joint_lines = true
            flip_axis = [false, false, true]
            "#,
        )?;

        assert_eq!(meta.mode, ExportMode::DemaMult);
        assert!(meta.joint_lines);
        assert!(!meta.fail_fast);
        assert_eq!(meta.material, DEFAULT_MATERIAL);
        assert_eq!(meta.flip_axis, [false, false, true]);
        assert_eq!(meta.build_options().clip_split, ClipSplit::Markers);
        assert!(meta.writer_options().joint_lines);
        Ok(())
    }

    #[test]
    fn test_resolve_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let asset = dir.path().join("crate.obj");
        fs::write(&asset, "")?;

        assert_eq!(ExportMeta::resolve(&asset, "obj")?, ExportMeta::default());

        fs::write(dir.path().join("obj.toml"), "material = \"folder\"\n")?;
        assert_eq!(ExportMeta::resolve(&asset, "obj")?.material, "folder");

        fs::write(dir.path().join("crate.toml"), "material = \"file\"\n")?;
        assert_eq!(ExportMeta::resolve(&asset, "obj")?.material, "file");
        Ok(())
    }

    #[test]
    fn test_invalid_meta() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let asset = dir.path().join("crate.obj");
        fs::write(dir.path().join("crate.toml"), "mode = \"EVERYTHING\"\n")?;
        assert!(ExportMeta::resolve(&asset, "obj").is_err());
        Ok(())
    }
}
