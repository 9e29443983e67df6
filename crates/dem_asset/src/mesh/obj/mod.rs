mod builder;
mod parser;

use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::{export, export::ExportMode, meta::ExportMeta};

use self::builder::{ObjScene, ObjSettings};

fn parse(path: &Path, meta: &ExportMeta) -> Result<ObjScene> {
    let settings = ObjSettings {
        flip_axis: meta.flip_axis,
        calculate_normals: meta.calculate_normals,
    };
    parser::parse(path, settings)
        .with_context(|| format!("Could not parse Wavefront file: {}", path.display()))
}

/// Exports every object of a Wavefront `.obj`-file as a mesh.
pub(crate) fn process(
    path: &Path,
    output_dir: &Path,
    mode: Option<ExportMode>,
) -> Result<Vec<PathBuf>> {
    info!("Processing Wavefront `.obj`-file: `{}`", path.display());
    let mut meta = ExportMeta::resolve(path, "obj")?;
    if let Some(mode) = mode {
        meta.mode = mode;
    }

    let scene = parse(path, &meta)?;
    export::export(&scene, path, output_dir, &meta)
}
