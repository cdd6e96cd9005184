use anyhow::Result;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Platform path list of scan roots used when none are given on the command line.
pub const PATH_ENV: &str = "ANNOTATION_FINDER_PATH";

pub fn default_m2_repository() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to resolve home directory"))?;
    Ok(home.join(".m2").join("repository"))
}

/// Scan roots: command-line paths, else `ANNOTATION_FINDER_PATH`, else the local
/// Maven repository.
pub fn resolve_scan_roots(cli_paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    resolve_scan_roots_from(cli_paths, env::var_os(PATH_ENV))
}

fn resolve_scan_roots_from(
    cli_paths: &[PathBuf],
    env_value: Option<OsString>,
) -> Result<Vec<PathBuf>> {
    if !cli_paths.is_empty() {
        return Ok(cli_paths.to_vec());
    }

    if let Some(value) = env_value {
        let roots: Vec<PathBuf> = env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !roots.is_empty() {
            return Ok(roots);
        }
    }

    let m2 = default_m2_repository()?;
    log::debug!("no scan paths given, defaulting to {}", m2.display());
    Ok(vec![m2])
}

/// Writes `content` to `path`, creating parent directories, or to stdout.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
