//! Copies a built binary into an install directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::InstallError;

/// `$CARGO_HOME/bin`, else `$HOME/.cargo/bin`.
pub fn default_install_dir() -> Option<PathBuf> {
    if let Some(cargo_home) = std::env::var_os("CARGO_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(cargo_home).join("bin"));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".cargo").join("bin"))
}

/// Installs `output_dir/<binary_name>` (or its `.exe` variant) into
/// `install_dir` and returns the installed path.
///
/// The install directory is created if needed. On unix the installed file
/// is marked executable.
pub fn install_binary(
    output_dir: &Path,
    binary_name: &str,
    install_dir: &Path,
) -> Result<PathBuf, InstallError> {
    let source = locate_binary(output_dir, binary_name)?;
    let file_name = source
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| InstallError::MissingBinary(source.clone()))?;

    fs::create_dir_all(install_dir).map_err(|source| InstallError::Io {
        path: install_dir.to_path_buf(),
        source,
    })?;

    let dest = install_dir.join(file_name);
    fs::copy(&source, &dest).map_err(|e| InstallError::Io {
        path: dest.clone(),
        source: e,
    })?;
    set_executable(&dest)?;

    info!(from = %source.display(), to = %dest.display(), "binary installed");
    Ok(dest)
}

fn locate_binary(output_dir: &Path, binary_name: &str) -> Result<PathBuf, InstallError> {
    let plain = output_dir.join(binary_name);
    if plain.is_file() {
        return Ok(plain);
    }
    let exe = output_dir.join(format!("{binary_name}.exe"));
    if exe.is_file() {
        return Ok(exe);
    }
    Err(InstallError::MissingBinary(plain))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        InstallError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}
