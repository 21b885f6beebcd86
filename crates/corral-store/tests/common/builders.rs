//! Builders for parsed template trees

use corral_core::types::{TemplateMetadata, TemplateSource, VersionSource};

/// Fluent builder for a `TemplateSource`
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    source: TemplateSource,
}

impl TemplateBuilder {
    pub fn new(folder: &str) -> Self {
        Self {
            source: TemplateSource {
                folder: folder.to_string(),
                template_base: Some(String::new()),
                is_system: Some(false),
                metadata: TemplateMetadata {
                    name: Some(folder.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    pub fn base(mut self, base: &str) -> Self {
        self.source.template_base = Some(base.to_string());
        self
    }

    pub fn system(mut self, is_system: bool) -> Self {
        self.source.is_system = Some(is_system);
        self
    }

    pub fn without_is_system(mut self) -> Self {
        self.source.is_system = None;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.source.metadata.category = Some(category.to_string());
        self
    }

    /// Add a version in folder `<index>` with no platform bounds
    pub fn version(self, version: &str) -> Self {
        self.version_with_bounds(version, None, None)
    }

    /// Add a version in folder `<index>` with platform bounds
    pub fn version_with_bounds(
        mut self,
        version: &str,
        minimum: Option<&str>,
        maximum: Option<&str>,
    ) -> Self {
        let folder = self.source.versions.len().to_string();
        self.source.versions.push(VersionSource {
            folder,
            version: version.to_string(),
            minimum_platform_version: minimum.map(String::from),
            maximum_platform_version: maximum.map(String::from),
            ..Default::default()
        });
        self
    }

    /// Restrict which installed versions may upgrade to the last version added
    pub fn upgrade_from(mut self, range: &str) -> Self {
        if let Some(last) = self.source.versions.last_mut() {
            last.upgrade_from = Some(range.to_string());
        }
        self
    }

    pub fn build(self) -> TemplateSource {
        self.source
    }
}
