use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory whose reports are listed and served.
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}
