use anyhow::{Context, Result};
use dem_format::{
    record::check_name, scene::HostScene, writer, ClipSplit, Document, SceneBuilder, Sections,
    WriterOptions,
};
use log::{info, warn};
use serde::Deserialize;
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{meta::ExportMeta, utils};

/// Which files an export produces and which sections go into each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub(crate) enum ExportMode {
    /// Model and animation packed into one `.dem` file.
    #[serde(rename = "DEM_ALL")]
    DemAll,
    /// Model in a `.dem` file, animation in a `.dema` file.
    #[serde(rename = "DEM_DEMA")]
    DemDema,
    /// Model only.
    #[default]
    #[serde(rename = "DEM_ONLY")]
    DemOnly,
    /// A single `.dema` file holding the whole timeline.
    #[serde(rename = "DEMA_ONE")]
    DemaOne,
    /// One `.dema` file per marker.
    #[serde(rename = "DEMA_MULT")]
    DemaMult,
}

impl ExportMode {
    pub(crate) fn clip_split(self) -> ClipSplit {
        match self {
            ExportMode::DemaMult => ClipSplit::Markers,
            _ => ClipSplit::Whole,
        }
    }
}

impl FromStr for ExportMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_ref() {
            "DEM_ALL" => Ok(ExportMode::DemAll),
            "DEM_DEMA" => Ok(ExportMode::DemDema),
            "DEM_ONLY" => Ok(ExportMode::DemOnly),
            "DEMA_ONE" => Ok(ExportMode::DemaOne),
            "DEMA_MULT" => Ok(ExportMode::DemaMult),
            _ => Err(format!(
                "Unknown export mode `{}`, expected one of DEM_ALL, DEM_DEMA, DEM_ONLY, DEMA_ONE, DEMA_MULT",
                value
            )),
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportMode::DemAll => "DEM_ALL",
            ExportMode::DemDema => "DEM_DEMA",
            ExportMode::DemOnly => "DEM_ONLY",
            ExportMode::DemaOne => "DEMA_ONE",
            ExportMode::DemaMult => "DEMA_MULT",
        };
        f.write_str(name)
    }
}

/// Builds the document of `scene` and writes the files `meta.mode` asks for
/// into `output_dir`, named after `source`. Returns the written paths.
pub(crate) fn export<S: HostScene + ?Sized>(
    scene: &S,
    source: &Path,
    output_dir: &Path,
    meta: &ExportMeta,
) -> Result<Vec<PathBuf>> {
    let output = SceneBuilder::new(meta.build_options())
        .build(scene)
        .with_context(|| format!("Could not build document of {}", source.display()))?;
    if !output.skipped.is_empty() {
        warn!(
            "{} meshes of {} were skipped",
            output.skipped.len(),
            source.display()
        );
    }

    let document = output.document;
    let stem = utils::file_name(source)?;
    let options = meta.writer_options();
    info!("Exporting {} as {}", source.display(), meta.mode);

    let mut written = Vec::new();
    let mut emit = |name: &str, extension: &str, document: &Document, sections: Sections| {
        let target = utils::combine_path(output_dir, name, extension)?;
        save(&target, document, sections, options)?;
        written.push(target);
        Result::<()>::Ok(())
    };

    match meta.mode {
        ExportMode::DemAll => emit(stem, "dem", &document, Sections::all())?,
        ExportMode::DemDema => {
            emit(stem, "dem", &document, Sections::MODEL)?;
            emit(stem, "dema", &document, Sections::ANIMATION)?;
        }
        ExportMode::DemOnly => emit(stem, "dem", &document, Sections::MODEL)?,
        ExportMode::DemaOne => emit(stem, "dema", &document, Sections::ANIMATION)?,
        ExportMode::DemaMult => {
            if document.clips.is_empty() {
                warn!("{} has no animation to export", source.display());
            }
            for clip in &document.clips {
                let name = format!("{}_{}", stem, clip_file_name(&clip.name)?);
                emit(&name, "dema", &document.with_clip(clip), Sections::ANIMATION)?;
            }
        }
    }

    Ok(written)
}

/// Clip name as part of a file name; path separators and characters
/// reserved by common file systems become `_`.
fn clip_file_name(name: &str) -> Result<String> {
    check_name(name).with_context(|| format!("Invalid clip name {:?}", name))?;
    Ok(name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c => c,
        })
        .collect())
}

fn save(target: &Path, document: &Document, sections: Sections, options: WriterOptions) -> Result<()> {
    info!("Writing {}", target.display());
    utils::write_file(target, |sink| {
        writer::write_with(document, sink, sections, options)
    })
}
