//! Reference template gallery.
//!
//! Loaded once at startup from a directory of prepared reference recordings,
//! then read-only for the life of the detection session.

use crate::error::{Result, WakegateError};
use crate::features::{FeatureExtractor, Features};
use std::path::Path;

/// One named reference: an exemplar recording of the wake phrase, reduced to
/// its feature representation. Immutable after creation.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub features: Features,
}

/// Immutable, ordered set of templates.
///
/// Gallery order matters: when several templates are equidistant below the
/// threshold, the first one in this order wins.
#[derive(Debug, Clone)]
pub struct TemplateGallery {
    templates: Vec<Template>,
}

impl TemplateGallery {
    /// Build a gallery from pre-extracted templates (used by tests and tools).
    ///
    /// # Errors
    /// Returns [`WakegateError::EmptyGallery`] if `templates` is empty; a
    /// detection loop must never start without at least one reference.
    pub fn from_templates(templates: Vec<Template>) -> Result<Self> {
        if templates.is_empty() {
            return Err(WakegateError::EmptyGallery {
                dir: "<in-memory>".to_string(),
            });
        }
        Ok(Self { templates })
    }

    /// Load every `.wav` in `dir` (sorted by file name) through the extractor.
    ///
    /// Individual unreadable files are reported and skipped so one corrupt
    /// recording does not take down the gallery; zero usable templates is
    /// fatal.
    pub fn load_dir(dir: &Path, extractor: &dyn FeatureExtractor) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| WakegateError::TemplateLoad {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("wav"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut templates = Vec::new();
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            match extractor.load_template(&path) {
                Ok(features) => templates.push(Template { name, features }),
                Err(e) => eprintln!("wakegate: skipping reference {}: {}", name, e),
            }
        }

        if templates.is_empty() {
            return Err(WakegateError::EmptyGallery {
                dir: dir.display().to_string(),
            });
        }
        Ok(Self { templates })
    }

    /// Templates in gallery order.
    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
