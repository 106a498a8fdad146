//! Outward projection of artifacts for prompt context
//!
//! [`ArtifactReference`] is what a task sees of another task's output. It is
//! produced from an [`Artifact`] by a single conversion and rendered either as
//! JSON (serde) or as the XML block prompt assembly consumes.

use crate::artifact::{Artifact, ArtifactId};
use crate::artifact_type::ArtifactType;
use crate::metadata::ArtifactMetadata;
use crate::path::StoragePath;
use crate::xml::{escape, XmlWriter};
use serde::{Deserialize, Serialize};

/// Serializable view of an artifact
///
/// Carries the full metadata block because the XML wire format renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReference {
    /// Artifact id
    pub id: ArtifactId,
    /// Display name
    pub name: String,
    /// Semantic category
    pub artifact_type: ArtifactType,
    /// Location on disk
    pub storage_path: StoragePath,
    /// Copy of `metadata.description`
    pub description: String,
    /// Producing task
    pub created_by_task: String,
    /// Optional relevance in `[0.0, 1.0]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    /// Full metadata
    pub metadata: ArtifactMetadata,
}

impl ArtifactReference {
    /// Attach a relevance score (clamped to `[0.0, 1.0]`)
    #[inline]
    #[must_use]
    pub fn with_relevance(mut self, score: f64) -> Self {
        self.relevance_score = Some(score.clamp(0.0, 1.0));
        self
    }

    /// Render as an `<artifact>` element
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut w = XmlWriter::new();

        let mut open = format!(
            "<artifact id=\"{}\" name=\"{}\" type=\"{}\" path=\"{}\" task=\"{}\"",
            self.id,
            escape(&self.name),
            self.artifact_type,
            escape(&self.storage_path.to_string()),
            escape(&self.created_by_task),
        );
        if let Some(score) = self.relevance_score {
            open.push_str(&format!(" relevance=\"{score}\""));
        }
        open.push('>');
        w.line(0, &open);

        w.text_element(1, "description", &self.description);
        write_metadata(&mut w, &self.metadata);

        w.line(0, "</artifact>");
        w.finish()
    }
}

impl From<&Artifact> for ArtifactReference {
    fn from(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id,
            name: artifact.name.clone(),
            artifact_type: artifact.artifact_type,
            storage_path: artifact.storage_path.clone(),
            description: artifact.metadata.description().to_string(),
            created_by_task: artifact.created_by_task.clone(),
            relevance_score: None,
            metadata: artifact.metadata.clone(),
        }
    }
}

impl From<Artifact> for ArtifactReference {
    fn from(artifact: Artifact) -> Self {
        Self::from(&artifact)
    }
}

fn has_renderable_metadata(meta: &ArtifactMetadata) -> bool {
    meta.mime_type.is_some()
        || meta.size_bytes.is_some()
        || meta.row_count.is_some()
        || meta.column_count.is_some()
        || meta.schema.as_ref().is_some_and(|s| !s.is_empty())
        || meta.preview.is_some()
        || meta.usage_hints.as_ref().is_some_and(|h| !h.is_empty())
}

fn write_metadata(w: &mut XmlWriter, meta: &ArtifactMetadata) {
    if !has_renderable_metadata(meta) {
        return;
    }
    w.line(1, "<metadata>");

    if let Some(mime) = &meta.mime_type {
        w.text_element(2, "mime_type", mime);
    }
    if let Some(size) = meta.size_bytes {
        w.text_element(2, "size_bytes", &size.to_string());
    }
    if let Some(kb) = meta.size_kb() {
        w.text_element(2, "size_kb", &format!("{kb:.2}"));
    }
    if let Some(rows) = meta.row_count {
        w.text_element(2, "row_count", &rows.to_string());
    }
    if let Some(cols) = meta.column_count {
        w.text_element(2, "column_count", &cols.to_string());
    }
    if let Some(schema) = meta.schema.as_ref().filter(|s| !s.is_empty()) {
        w.line(2, "<schema>");
        for (name, ty) in schema {
            w.line(
                3,
                &format!("<column name=\"{}\" type=\"{}\" />", escape(name), escape(ty)),
            );
        }
        w.line(2, "</schema>");
    }
    if let Some(preview) = &meta.preview {
        w.text_element(2, "preview", preview);
    }
    if let Some(hints) = meta.usage_hints.as_ref().filter(|h| !h.is_empty()) {
        w.line(2, "<usage_hints>");
        for hint in hints {
            w.text_element(3, "hint", hint);
        }
        w.line(2, "</usage_hints>");
    }

    w.line(1, "</metadata>");
}

/// Render a list of references inside an `<artifacts>` wrapper
///
/// An empty list renders as an empty string so callers can skip the section.
#[must_use]
pub fn render_references(references: &[ArtifactReference]) -> String {
    if references.is_empty() {
        return String::new();
    }
    let mut out = String::from("<artifacts>\n");
    for reference in references {
        out.push_str(&reference.to_xml());
        out.push('\n');
    }
    out.push_str("</artifacts>");
    out
}
