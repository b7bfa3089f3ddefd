//! Built-in template catalog and template references.

use std::path::PathBuf;

use crate::error::CanvasError;

/// A classic meme template shipped with the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Display name
    pub name: &'static str,
    /// File name under the template root
    pub file: &'static str,
}

impl Template {
    /// File name without extension, e.g. `"drake"`.
    pub fn slug(&self) -> &'static str {
        self.file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(self.file)
    }
}

/// The template catalog, in display order.
pub const TEMPLATES: &[Template] = &[
    Template { name: "Drake", file: "drake.jpg" },
    Template { name: "Distracted BF", file: "distracted-bf.jpg" },
    Template { name: "Two Buttons", file: "two-buttons.jpg" },
    Template { name: "Expanding Brain", file: "expanding-brain.jpg" },
    Template { name: "This Is Fine", file: "this-is-fine.jpg" },
    Template { name: "Change My Mind", file: "change-my-mind.jpg" },
    Template { name: "Surprised Pikachu", file: "surprised-pikachu.jpg" },
    Template { name: "One Does Not", file: "one-does-not.jpg" },
    Template { name: "Success Kid", file: "success-kid.jpg" },
    Template { name: "Woman Yelling", file: "woman-yelling-cat.jpg" },
    Template { name: "Hide Pain Harold", file: "hide-pain-harold.jpg" },
];

/// Find a catalog template by display name or slug (case-insensitive).
pub fn by_name(name: &str) -> Option<(usize, &'static Template)> {
    let wanted = name.trim().to_lowercase();
    TEMPLATES
        .iter()
        .enumerate()
        .find(|(_, t)| t.name.to_lowercase() == wanted || t.slug() == wanted)
}

/// Where catalog templates live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRoot {
    /// Local directory containing the template files
    Dir(PathBuf),
    /// Base URL the template file names are appended to
    Url(String),
}

impl TemplateRoot {
    /// Parse a root: http(s) URLs are remote, anything else is a directory.
    pub fn parse(root: &str) -> Self {
        if is_url(root) {
            TemplateRoot::Url(root.trim_end_matches('/').to_string())
        } else {
            TemplateRoot::Dir(PathBuf::from(root))
        }
    }
}

impl Default for TemplateRoot {
    fn default() -> Self {
        TemplateRoot::Dir(PathBuf::from("templates"))
    }
}

/// Something that can be loaded as a template image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// Index into [`TEMPLATES`]
    Catalog(usize),
    /// Image file on disk
    Path(PathBuf),
    /// Remote image
    Url(String),
}

/// Concrete location of template bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Remote(String),
}

impl TemplateRef {
    /// Parse a user-supplied reference.
    ///
    /// Accepts an http(s) URL, a catalog index, a catalog name or slug, or
    /// falls back to a file path.
    pub fn parse(reference: &str) -> Result<Self, CanvasError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CanvasError::InvalidTemplate("Empty template reference".to_string()));
        }
        if is_url(reference) {
            return Ok(TemplateRef::Url(reference.to_string()));
        }
        if let Ok(index) = reference.parse::<usize>() {
            if index >= TEMPLATES.len() {
                return Err(CanvasError::InvalidTemplate(format!(
                    "Template index {} out of range (0-{})",
                    index,
                    TEMPLATES.len() - 1
                )));
            }
            return Ok(TemplateRef::Catalog(index));
        }
        if let Some((index, _)) = by_name(reference) {
            return Ok(TemplateRef::Catalog(index));
        }
        Ok(TemplateRef::Path(PathBuf::from(reference)))
    }

    /// Resolve to a concrete location against the catalog root.
    pub fn resolve(&self, root: &TemplateRoot) -> Result<Location, CanvasError> {
        match self {
            TemplateRef::Catalog(index) => {
                let template = TEMPLATES.get(*index).ok_or_else(|| {
                    CanvasError::InvalidTemplate(format!("Unknown template index {}", index))
                })?;
                Ok(match root {
                    TemplateRoot::Dir(dir) => Location::File(dir.join(template.file)),
                    TemplateRoot::Url(base) => Location::Remote(format!("{}/{}", base, template.file)),
                })
            }
            TemplateRef::Path(path) => Ok(Location::File(path.clone())),
            TemplateRef::Url(url) => Ok(Location::Remote(url.clone())),
        }
    }

    /// Key used for the decoded-image cache.
    pub fn cache_key(&self, root: &TemplateRoot) -> Option<String> {
        match self.resolve(root).ok()? {
            Location::File(path) => Some(path.display().to_string()),
            Location::Remote(url) => Some(url),
        }
    }
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_has_eleven_templates() {
        assert_eq!(TEMPLATES.len(), 11);
        assert_eq!(TEMPLATES[0].slug(), "drake");
        assert_eq!(TEMPLATES[9].slug(), "woman-yelling-cat");
    }

    #[test]
    fn test_by_name_matches_name_or_slug() {
        assert_eq!(by_name("Success Kid").map(|(i, _)| i), Some(8));
        assert_eq!(by_name("success-kid").map(|(i, _)| i), Some(8));
        assert_eq!(by_name("THIS IS FINE").map(|(i, _)| i), Some(4));
        assert!(by_name("rickroll").is_none());
    }

    #[test]
    fn test_parse_reference_kinds() {
        assert_eq!(TemplateRef::parse("drake").unwrap(), TemplateRef::Catalog(0));
        assert_eq!(TemplateRef::parse("3").unwrap(), TemplateRef::Catalog(3));
        assert_eq!(
            TemplateRef::parse("https://example.com/cat.png").unwrap(),
            TemplateRef::Url("https://example.com/cat.png".to_string())
        );
        assert_eq!(
            TemplateRef::parse("./photos/me.jpg").unwrap(),
            TemplateRef::Path(PathBuf::from("./photos/me.jpg"))
        );
    }

    #[test]
    fn test_parse_rejects_bad_references() {
        assert!(TemplateRef::parse("").is_err());
        assert!(TemplateRef::parse("11").is_err());
    }

    #[test]
    fn test_resolve_against_roots() {
        let dir = TemplateRoot::parse("/srv/templates");
        let url = TemplateRoot::parse("https://cdn.example.com/templates/");

        assert_eq!(
            TemplateRef::Catalog(1).resolve(&dir).unwrap(),
            Location::File(PathBuf::from("/srv/templates/distracted-bf.jpg"))
        );
        assert_eq!(
            TemplateRef::Catalog(1).resolve(&url).unwrap(),
            Location::Remote("https://cdn.example.com/templates/distracted-bf.jpg".to_string())
        );
        assert!(TemplateRef::Catalog(50).resolve(&dir).is_err());
    }
}
