//! Model format detection and path containment checks

use std::path::{Component, Path, PathBuf};

/// Recognized 3D model formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// Binary glTF (`.glb`)
    Glb,
    /// JSON glTF (`.gltf`)
    Gltf,
}

/// Lowercase extensions the scanner and file server accept.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["glb", "gltf"];

impl ModelFormat {
    /// Detect the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(ModelFormat::Glb),
            "gltf" => Some(ModelFormat::Gltf),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ModelFormat::Glb => "model/gltf-binary",
            ModelFormat::Gltf => "model/gltf+json",
        }
    }
}

/// Quick check used by the scanner walk.
pub fn is_model_file(path: &Path) -> bool {
    ModelFormat::from_path(path).is_some()
}

/// Lexical containment check.
///
/// Rejects relative paths and any path carrying a `..` component, then requires
/// the path to sit under one of `roots`. Symlinks are not resolved.
pub fn is_within_roots(path: &Path, roots: &[PathBuf]) -> bool {
    if !path.is_absolute() {
        return false;
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return false;
    }
    roots.iter().any(|root| path.starts_with(root))
}
