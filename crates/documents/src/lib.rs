//! Dossier Documents
//!
//! This crate provides the documents produced while converting an observation message into a
//! Peri22x dossier.
//!
//! ## Document Kinds
//!
//! - [`EmbeddedDocument`]: a file carried inside the message (an encapsulated report, a text
//!   attachment), destined to become a stored attachment of the dossier
//! - [`XmlDocument`]: the rendered dossier itself
//!
//! Both implement [`Document`], which exposes the payload together with its media type,
//! extension and character set, and can persist it to disk.
//!
//! ## Media Type Detection
//!
//! Embedded payloads arrive without reliable type information. [`SniffingDocumentFactory`]
//! detects the media type from the file signature and falls back to plain text for valid UTF-8
//! payloads and to `application/octet-stream` for everything else:
//!
//! ```text
//! %PDF-1.4 …        → application/pdf, .pdf, binary
//! Verslag echo …    → text/plain, .txt, us-ascii
//! 0x00 0xff …       → application/octet-stream, (no extension), binary
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use hl7_peri22x_documents::{Document, DocumentFactory, SniffingDocumentFactory};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = SniffingDocumentFactory;
//! let document = factory.create_embedded(b"%PDF-1.4\n".to_vec(), "rapport");
//! assert_eq!(document.mime_type(), "application/pdf");
//! document.save(Path::new("out/rapport.pdf"))?;
//! # Ok(())
//! # }
//! ```

mod document;
mod factory;

pub use document::{Document, EmbeddedDocument, XmlDocument};
pub use factory::{DocumentFactory, SniffingDocumentFactory};

/// Errors that can occur while handling documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Target path cannot be written to
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results that can fail with a [`DocumentError`].
pub type DocumentResult<T> = Result<T, DocumentError>;
