use std::path::PathBuf;
use std::sync::OnceLock;

static BASE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory all relative data paths hang off.
///
/// The directory containing the executable, falling back to the working
/// directory when it cannot be determined.
pub fn get_base_dir() -> &'static PathBuf {
    BASE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the glyph template library root: `<base>/templates/`
pub fn get_templates_dir() -> PathBuf {
    get_base_dir().join("templates")
}

/// Returns the unrecognized glyph dump directory: `<base>/unrecognized_sign/`
pub fn get_unrecognized_sign_dir() -> PathBuf {
    get_base_dir().join("unrecognized_sign")
}

/// Returns the unrecognized cell dump directory: `<base>/unrecognized_cell/`
pub fn get_unrecognized_cell_dir() -> PathBuf {
    get_base_dir().join("unrecognized_cell")
}

/// Returns the match report directory: `<base>/results/`
pub fn get_results_dir() -> PathBuf {
    get_base_dir().join("results")
}

/// Returns the replay frame directory: `<base>/frames/`
pub fn get_frames_dir() -> PathBuf {
    get_base_dir().join("frames")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_templates_dir())?;
    std::fs::create_dir_all(get_unrecognized_sign_dir())?;
    std::fs::create_dir_all(get_unrecognized_cell_dir())?;
    std::fs::create_dir_all(get_results_dir())?;
    Ok(())
}
