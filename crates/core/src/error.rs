use crate::helpers::datetime::DateTimeParseError;

#[derive(Debug, thiserror::Error)]
pub enum DossierError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unable to decode Base64 encoded embedded file; encoding is invalid: {0}")]
    InvalidBase64(base64::DecodeError),
    #[error("unable to extract embedded file encoded as \"{0}\"")]
    UnsupportedEmbeddedEncoding(String),

    #[error("unable to normalise a date/time with value \"{value}\"")]
    DateTimeNormalisation {
        value: String,
        #[source]
        source: DateTimeParseError,
    },
    #[error("unable to normalise a timestamp with value \"{value}\"")]
    TimestampNormalisation {
        value: String,
        #[source]
        source: DateTimeParseError,
    },
    #[error("unsupported character encoding: {0}")]
    UnsupportedCharacterEncoding(String),

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize value mappings: {0}")]
    ValueMappings(serde_yaml::Error),

    #[error("document error: {0}")]
    Document(#[from] hl7_peri22x_documents::DocumentError),
    #[error("failed to render dossier XML: {0}")]
    Xml(#[from] peri22x::Peri22xError),
}

pub type DossierResult<T> = std::result::Result<T, DossierError>;
