//! Peri22x resource model.
//!
//! This crate provides the **in-memory model** of a Peri22x resource and its XML rendering:
//! - sections typed `client`, `intake`, `consult` or `echo`, each holding ordered values
//! - values keyed by concept id, optionally qualified by a `repeat` sub-identifier and
//!   optionally rendered as CDATA
//! - attachment records referencing files stored next to the resource
//!
//! The model does not know about HL7; populating it is the concern of the conversion core.
//!
//! ```text
//! <resource type="hub/dossier">
//!   <section type="intake" createstamp="2016-01-20 10:10:10" effectstamp="2016-01-20 09:30:00">
//!     <value concept="peri22-dataelement-20010">1</value>
//!   </section>
//!   <attachments>
//!     <attachment id="1" mimetype="application/pdf" filename="rapport.pdf"/>
//!   </attachments>
//! </resource>
//! ```

pub mod attachment;
pub mod resource;
pub mod section;
mod xml;

pub use attachment::Attachment;
pub use resource::Resource;
pub use section::{Section, SectionType, Value, SECTION_TIMESTAMP_FORMAT};

/// Errors returned by the `peri22x` crate.
#[derive(Debug, thiserror::Error)]
pub enum Peri22xError {
    #[error("failed to write XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("rendered XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Type alias for Results that can fail with a [`Peri22xError`].
pub type Peri22xResult<T> = Result<T, Peri22xError>;
