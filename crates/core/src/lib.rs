//! # HL7 → Peri22x conversion core
//!
//! Turns parsed HL7 v2 observation messages into Peri22x dossiers.
//!
//! This crate contains the conversion itself:
//! - the [`ObservationProcessor`], which maps a patient group's PID, OBR and OBX segments onto
//!   client, intake and echo sections, dossier metadata and embedded files
//! - the HL7 escape sequence filter, date/time normalisation, unit conversion and value
//!   transformers it relies on
//! - the [`Dossier`] aggregate and the attachment strategy that names embedded files before
//!   they are stored
//!
//! **No I/O concerns**: reading messages from disk and writing dossiers out belong in the
//! `hl7-peri22x` binary. Configuration is resolved once into a [`CoreConfig`] and passed in.

pub mod attachment;
pub mod config;
pub mod constants;
pub mod dossier;
pub mod error;
pub mod helpers;
pub mod processor;
pub mod text_filter;
pub mod transformer;

pub use attachment::{AttachmentOptions, AttachmentStrategy, HubAttachmentStrategy};
pub use config::CoreConfig;
pub use dossier::Dossier;
pub use error::{DossierError, DossierResult};
pub use processor::ObservationProcessor;
pub use text_filter::EscapeSequenceFilter;
pub use transformer::{IdentityTransformer, MappingTransformer, ValueMappings, ValueTransformer};
