use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::github::GithubError;
use crate::models::{Credentials, Snapshot};
use crate::raster::{Rasterizer, RasterError};
use crate::render::{self, RenderConfig};
use crate::storage::{Config, Storage};

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Where the wallpaper image lands and at what resolution.
#[derive(Debug, Clone)]
pub struct WallpaperTarget {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub fn default_output() -> Option<PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("streakwall.png"))
}

#[derive(Debug)]
pub enum ApplyError {
    NotConfigured,
    Fetch(GithubError),
    Raster(RasterError),
    Hook(String),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::NotConfigured => {
                write!(f, "No GitHub username configured. Complete setup first.")
            }
            ApplyError::Fetch(err) => write!(f, "{err}"),
            ApplyError::Raster(err) => write!(f, "{err}"),
            ApplyError::Hook(message) => write!(f, "Wallpaper command failed: {message}"),
        }
    }
}

impl std::error::Error for ApplyError {}

/// Fetches the latest contributions (falling back to the cache when
/// GitHub is unreachable), writes the wallpaper image, and runs the
/// configured wallpaper command.
pub fn apply(storage: &Storage, target: &WallpaperTarget) -> Result<FetchOutcome, ApplyError> {
    let config = storage.read_config();
    let login = config
        .login
        .clone()
        .filter(|login| !login.trim().is_empty())
        .ok_or(ApplyError::NotConfigured)?;
    let credentials = Credentials {
        login,
        token: storage.read_token(),
    };
    let fetcher = Fetcher::new(storage.clone());
    let outcome = fetcher.fetch(&credentials).map_err(ApplyError::Fetch)?;
    paint(&config, Some(&outcome.snapshot), target)?;
    Ok(outcome)
}

/// Rebuilds the image from whatever is cached without contacting
/// GitHub. An empty cache paints the placeholder design.
pub fn repaint_cached(
    storage: &Storage,
    target: &WallpaperTarget,
) -> Result<Option<Snapshot>, ApplyError> {
    let config = storage.read_config();
    let snapshot = storage.read_snapshot();
    paint(&config, snapshot.as_ref(), target)?;
    Ok(snapshot)
}

fn paint(
    config: &Config,
    snapshot: Option<&Snapshot>,
    target: &WallpaperTarget,
) -> Result<(), ApplyError> {
    let render_config = RenderConfig::new(target.width, target.height, config.dark_mode);
    let ops = render::render_ops(&render_config, snapshot);
    let rasterizer = Rasterizer::new().map_err(ApplyError::Raster)?;
    rasterizer
        .write_png(&ops, target.width, target.height, &target.output)
        .map_err(ApplyError::Raster)?;
    info!(path = %target.output.display(), "wallpaper image written");

    if let Some(command) = &config.wallpaper_command {
        run_hook(command, &target.output)?;
    }
    Ok(())
}

fn run_hook(command: &str, path: &Path) -> Result<(), ApplyError> {
    let expanded = expand_hook(command, path);
    let status = Command::new("sh")
        .arg("-c")
        .arg(&expanded)
        .status()
        .map_err(|err| ApplyError::Hook(err.to_string()))?;
    if !status.success() {
        return Err(ApplyError::Hook(format!("'{expanded}' exited with {status}")));
    }
    info!(command = %expanded, "wallpaper command finished");
    Ok(())
}

/// The configured command may reference the written image as `{path}`.
fn expand_hook(command: &str, path: &Path) -> String {
    command.replace("{path}", &path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_substitutes_the_image_path() {
        let expanded = expand_hook("feh --bg-fill {path}", Path::new("/tmp/wall.png"));
        assert_eq!(expanded, "feh --bg-fill /tmp/wall.png");
    }

    #[test]
    fn hook_without_placeholder_is_untouched() {
        let expanded = expand_hook("notify-send refreshed", Path::new("/tmp/wall.png"));
        assert_eq!(expanded, "notify-send refreshed");
    }
}
