//! HL7v2 boundary support.
//!
//! This crate provides the **typed segment model** consumed by the dossier conversion pipeline:
//! - encoding parameters (delimiters, escape character, character set)
//! - field values as a sum type over the recognised HL7 data type kinds
//! - the PID, PV1, OBR and OBX segments, with every other segment kept by name only
//! - rewindable segment groups mirroring the ORU^R01 grouping
//! - a minimal ER7 (pipe-delimited) reader that builds the above from raw bytes
//!
//! Field values keep their **raw bytes** together with the declared character encoding.
//! Decoding to UTF-8 and unescaping of escape sequences are the caller's concern; the reader
//! never rewrites field content.
//!
//! This crate is not a validator: it only understands the fields the conversion pipeline reads.

pub mod data_types;
pub mod encoding;
pub mod group;
pub mod reader;
pub mod segments;

pub use data_types::{
    Ce, Cnn, Cx, DataType, Ed, Ei, FamilyName, FieldValue, Ndl, Sad, SimpleValue, Ts, Xad, Xcn, Xpn,
    Xtn,
};
pub use encoding::EncodingParameters;
pub use group::{GroupEntry, SegmentGroup};
pub use reader::Message;
pub use segments::{ObrSegment, ObxSegment, PidSegment, Pv1Segment, Segment};

/// Errors returned by the `hl7v2` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum Hl7Error {
    #[error("message is empty")]
    EmptyMessage,

    #[error("message must start with an MSH segment")]
    MissingHeader,

    #[error("invalid MSH encoding characters: {0}")]
    InvalidEncodingCharacters(String),
}

/// Type alias for Results that can fail with an [`Hl7Error`].
pub type Hl7Result<T> = Result<T, Hl7Error>;
