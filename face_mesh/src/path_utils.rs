use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

/// Resolves `path` against the working directory without requiring it to exist.
pub fn absolute(path: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(path);
    if path.is_relative() {
        let cwd = std::env::current_dir().context("Failed to read working directory")?;
        Ok(cwd.join(path))
    } else {
        Ok(path.to_path_buf())
    }
}

/// clap value parser for files that must already exist.
pub fn input_path(path: &str) -> anyhow::Result<PathBuf> {
    let path = absolute(path)?;
    if path.is_file() {
        Ok(path)
    } else {
        bail!("{} does not exist or is not a file", path.display())
    }
}

/// clap value parser for files about to be written. The parent directory must
/// exist; a missing extension becomes `.png`.
pub fn output_path(path: &str) -> anyhow::Result<PathBuf> {
    let mut path = absolute(path)?;
    if path.extension().is_none() {
        path.set_extension("png");
    }
    match path.parent() {
        Some(dir) if dir.is_dir() => Ok(path),
        _ => bail!("Output directory for {} does not exist", path.display()),
    }
}
