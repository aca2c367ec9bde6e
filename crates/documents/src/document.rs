//! Document types.
//!
//! A document is an immutable byte payload with a media type, an optional file extension and a
//! character set. [`EmbeddedDocument`] additionally carries a basename and, once attachments
//! have been registered, the storage key it is filed under.

use crate::{DocumentError, DocumentResult};
use std::fs;
use std::path::Path;

/// A payload that can be persisted.
pub trait Document {
    /// The payload bytes.
    fn bytes(&self) -> &[u8];

    /// Detected media type, e.g. `application/pdf`.
    fn mime_type(&self) -> &str;

    /// File extension without the leading dot, if the media type has one.
    fn extension(&self) -> Option<&str>;

    /// Character set of the payload: `us-ascii`, `utf-8` or `binary`.
    fn character_set(&self) -> &str;

    /// Writes the payload to `path`, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` if:
    /// - `path` has no file name component
    /// - a parent directory cannot be created (I/O)
    /// - the file cannot be written (I/O)
    fn save(&self, path: &Path) -> DocumentResult<()> {
        if path.file_name().is_none() {
            return Err(DocumentError::InvalidPath(format!(
                "Path has no file name: {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DocumentError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {}: {}", parent.display(), e),
                ))
            })?;
        }

        fs::write(path, self.bytes()).map_err(|e| {
            DocumentError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write document to {}: {}", path.display(), e),
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = self.bytes().len(),
            mime_type = self.mime_type(),
            "saved document"
        );
        Ok(())
    }
}

/// A file extracted from an observation message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedDocument {
    data: Vec<u8>,
    basename: String,
    mime_type: String,
    extension: Option<String>,
    character_set: String,
    storage_key: Option<String>,
}

impl EmbeddedDocument {
    /// Creates a document from already detected type information.
    ///
    /// Prefer [`crate::DocumentFactory::create_embedded`], which detects the type from the
    /// payload.
    pub fn new(
        data: Vec<u8>,
        basename: impl Into<String>,
        mime_type: impl Into<String>,
        extension: Option<String>,
        character_set: impl Into<String>,
    ) -> Self {
        Self {
            data,
            basename: basename.into(),
            mime_type: mime_type.into(),
            extension,
            character_set: character_set.into(),
            storage_key: None,
        }
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn set_basename(&mut self, basename: impl Into<String>) {
        self.basename = basename.into();
    }

    /// The key the document is filed under, once assigned.
    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn set_storage_key(&mut self, storage_key: impl Into<String>) {
        self.storage_key = Some(storage_key.into());
    }

    /// `basename.extension`, or just the basename when there is no extension.
    pub fn filename(&self) -> String {
        match &self.extension {
            Some(extension) => format!("{}.{}", self.basename, extension),
            None => self.basename.clone(),
        }
    }
}

impl Document for EmbeddedDocument {
    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    fn character_set(&self) -> &str {
        &self.character_set
    }
}

/// A rendered XML document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDocument {
    xml: String,
}

impl XmlDocument {
    pub fn new(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

impl Document for XmlDocument {
    fn bytes(&self) -> &[u8] {
        self.xml.as_bytes()
    }

    fn mime_type(&self) -> &str {
        "application/xml"
    }

    fn extension(&self) -> Option<&str> {
        Some("xml")
    }

    fn character_set(&self) -> &str {
        "utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pdf() -> EmbeddedDocument {
        EmbeddedDocument::new(
            b"%PDF-1.4\n".to_vec(),
            "rapport",
            "application/pdf",
            Some("pdf".to_string()),
            "binary",
        )
    }

    #[test]
    fn test_filename_includes_extension() {
        assert_eq!(pdf().filename(), "rapport.pdf");
    }

    #[test]
    fn test_filename_without_extension_is_basename() {
        let document = EmbeddedDocument::new(
            vec![0x00, 0xff],
            "rapport",
            "application/octet-stream",
            None,
            "binary",
        );
        assert_eq!(document.filename(), "rapport");
    }

    #[test]
    fn test_basename_and_storage_key_are_mutable() {
        let mut document = pdf();
        assert_eq!(document.storage_key(), None);

        document.set_basename("rapport-2");
        document.set_storage_key("1@abc");

        assert_eq!(document.basename(), "rapport-2");
        assert_eq!(document.storage_key(), Some("1@abc"));
        assert_eq!(document.bytes(), b"%PDF-1.4\n");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dossier").join("rapport.pdf");

        pdf().save(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.4\n");
    }

    #[test]
    fn test_save_rejects_path_without_file_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("..");

        let result = pdf().save(&path);

        assert!(matches!(result, Err(DocumentError::InvalidPath(_))));
    }

    #[test]
    fn test_xml_document_reports_xml_type() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dossier.xml");
        let document = XmlDocument::new("<resource/>");

        document.save(&path).unwrap();

        assert_eq!(document.mime_type(), "application/xml");
        assert_eq!(document.extension(), Some("xml"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<resource/>");
    }
}
