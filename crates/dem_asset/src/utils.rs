use anyhow::{anyhow, Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub fn file_name(path: &Path) -> Result<&str> {
    path.file_stem()
        .ok_or_else(|| anyhow!("No file stem found"))?
        .to_str()
        .ok_or_else(|| anyhow!("Can't convert file stem to string"))
}

pub fn combine_path(directory: &Path, file_name: &str, extension: &str) -> Result<PathBuf> {
    Ok(directory.join(format!("{}.{}", file_name, extension)))
}

/// Creates `target` and hands a buffered writer to `write`.
///
/// The buffer is flushed and the file closed whether or not `write`
/// succeeds. Writing is not atomic: a failed export leaves a truncated file.
pub fn write_file<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> dem_format::Result<()>,
{
    let file = File::create(target)
        .with_context(|| format!("Could not create file: {}", target.display()))?;
    let mut buffer = BufWriter::new(file);

    let written = write(&mut buffer);
    let flushed = buffer.flush();

    written.with_context(|| format!("Could not write data to file: {}", target.display()))?;
    flushed.with_context(|| format!("Could not flush file: {}", target.display()))?;
    Ok(())
}
