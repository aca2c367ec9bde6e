//! Document creation with media type detection.

use crate::document::{EmbeddedDocument, XmlDocument};

const TEXT_MIME_TYPE: &str = "text/plain";
const TEXT_EXTENSION: &str = "txt";
const BINARY_MIME_TYPE: &str = "application/octet-stream";

/// Creates documents from raw payloads.
pub trait DocumentFactory: std::fmt::Debug {
    /// Creates an embedded document, detecting its media type, extension and character set.
    fn create_embedded(&self, data: Vec<u8>, basename: &str) -> EmbeddedDocument;

    /// Wraps rendered XML.
    fn create_xml(&self, xml: String) -> XmlDocument {
        XmlDocument::new(xml)
    }
}

/// Default factory: detects the media type from the payload's file signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct SniffingDocumentFactory;

impl DocumentFactory for SniffingDocumentFactory {
    fn create_embedded(&self, data: Vec<u8>, basename: &str) -> EmbeddedDocument {
        let character_set = detect_character_set(&data);
        let (mime_type, extension) = match infer::get(&data) {
            Some(kind) => (kind.mime_type(), Some(kind.extension().to_string())),
            None if character_set == "binary" => (BINARY_MIME_TYPE, None),
            None => (TEXT_MIME_TYPE, Some(TEXT_EXTENSION.to_string())),
        };

        tracing::debug!(
            basename,
            mime_type,
            character_set,
            size_bytes = data.len(),
            "created embedded document"
        );

        EmbeddedDocument::new(data, basename, mime_type, extension, character_set)
    }
}

/// `us-ascii` for 7-bit payloads, `utf-8` for other valid UTF-8, `binary` otherwise.
fn detect_character_set(data: &[u8]) -> &'static str {
    if data.is_ascii() {
        "us-ascii"
    } else if std::str::from_utf8(data).is_ok() {
        "utf-8"
    } else {
        "binary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn test_pdf_is_detected_by_signature() {
        let data = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec();
        let document = SniffingDocumentFactory.create_embedded(data, "rapport");

        assert_eq!(document.mime_type(), "application/pdf");
        assert_eq!(document.extension(), Some("pdf"));
        assert_eq!(document.character_set(), "binary");
        assert_eq!(document.filename(), "rapport.pdf");
    }

    #[test]
    fn test_ascii_text_falls_back_to_plain_text() {
        let data = b"Verslag echo\nGeen bijzonderheden\n".to_vec();
        let document = SniffingDocumentFactory.create_embedded(data, "rapport");

        assert_eq!(document.mime_type(), "text/plain");
        assert_eq!(document.extension(), Some("txt"));
        assert_eq!(document.character_set(), "us-ascii");
    }

    #[test]
    fn test_utf8_text_keeps_utf8_character_set() {
        let data = "Echo: groei normaal, één foetus\n".as_bytes().to_vec();
        let document = SniffingDocumentFactory.create_embedded(data, "rapport");

        assert_eq!(document.mime_type(), "text/plain");
        assert_eq!(document.character_set(), "utf-8");
    }

    #[test]
    fn test_unknown_binary_has_no_extension() {
        let data = vec![0x13, 0x37, 0xc3, 0x28];
        let document = SniffingDocumentFactory.create_embedded(data, "rapport");

        assert_eq!(document.mime_type(), "application/octet-stream");
        assert_eq!(document.extension(), None);
        assert_eq!(document.character_set(), "binary");
        assert_eq!(document.filename(), "rapport");
    }

    #[test]
    fn test_create_xml_wraps_text() {
        let document = SniffingDocumentFactory.create_xml("<resource/>".to_string());
        assert_eq!(document.as_str(), "<resource/>");
    }
}
