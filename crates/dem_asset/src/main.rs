pub(crate) mod export;
pub(crate) mod mesh;
pub(crate) mod meta;
pub(crate) mod scene;
pub(crate) mod utils;

use anyhow::Result;
use export::ExportMode;
use log::{debug, error, info, warn};
use mesh::obj;
use std::{fs, io, path::Path};
use structopt::StructOpt;
use walkdir::WalkDir;

// Cli arguments
#[derive(StructOpt, Debug)]
#[structopt(name = "dem_asset")]
struct CliArgs {
    /// Specify the input folder
    input: String,
    /// Output directory, to place the exported files in
    #[structopt(short = "o", long = "output")]
    output: String,
    /// Export mode for every asset, overrides the meta files
    /// (DEM_ALL, DEM_DEMA, DEM_ONLY, DEMA_ONE, DEMA_MULT)
    #[structopt(short = "m", long = "mode")]
    mode: Option<ExportMode>,
    /// Output debug info
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

/// Happens during setup
#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Input folder does not exist: {0}")]
    InputFolderNonExistant(String),
    #[error("Output folder strcuture could not be created: {0}")]
    ErrorCreatingOutputStructure(#[from] io::Error),
    #[error("Could not handle output path: {0}")]
    InvalidOutputPath(String),
    #[error("{0} assets failed to export")]
    ExportFailed(usize),
}

fn main() -> Result<()> {
    let args = CliArgs::from_args();

    if !args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    } else {
        env_logger::Builder::new()
            .filter(None, log::LevelFilter::Debug)
            .init();
    }

    prepare(args)
}

fn prepare(args: CliArgs) -> Result<()> {
    let output_path = Path::new(&args.output);

    let input_path = Path::new(&args.input);
    if !input_path.is_dir() {
        return Err(CliError::InputFolderNonExistant(input_path.display().to_string()).into());
    }

    let mut failed = 0;
    for entry in WalkDir::new(input_path) {
        let path = match &entry {
            Err(err) => {
                warn!("Error parsing path: {}", err);
                continue;
            }
            Ok(entry) => entry.path(),
        };

        if path.is_dir() {
            continue;
        }

        let output = output_path.join(
            path.strip_prefix(input_path)
                .map_err(|_| CliError::InvalidOutputPath(path.display().to_string()))?,
        );

        // creating the output folder of the input file in the same structure
        let local_output_folder = output.parent().unwrap_or(output_path);
        if !local_output_folder.exists() {
            fs::create_dir_all(&local_output_folder)
                .map_err(CliError::ErrorCreatingOutputStructure)?;
        }

        // check extension
        let result = if let Some(Some(extension)) = path.extension().map(|x| x.to_str()) {
            match extension.to_ascii_lowercase().as_ref() {
                "obj" => obj::process(path, local_output_folder, args.mode),
                "scene" => scene::process(path, local_output_folder, args.mode),
                "toml" => {
                    debug!("Ignored toml file: {}", &path.display());
                    continue;
                }
                _ => {
                    warn!("Could not handle path: {}", &path.display());
                    continue;
                }
            }
        } else {
            warn!(
                "Ignored file \"{}\", because no file extension was found.",
                path.display()
            );
            continue;
        };

        // a broken asset does not stop the others from exporting
        match result {
            Ok(written) => info!("Exported {} files from {}", written.len(), path.display()),
            Err(err) => {
                error!("Failed to export {}: {:?}", path.display(), err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::ExportFailed(failed).into());
    }
    Ok(())
}
