//! Message encoding parameters.
//!
//! The delimiters of an HL7v2 message are declared by the message itself (MSH-1 and MSH-2) and
//! its character set by MSH-18. Escape sequences inside text fields refer to these delimiters,
//! so anything that unescapes text needs the parameters of the message the text came from.

/// Character encoding label used when MSH-18 is empty (HL7 default is 7-bit ASCII).
pub const DEFAULT_CHARACTER_ENCODING: &str = "ASCII";

/// Delimiters and character set of one HL7v2 message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodingParameters {
    pub segment_sep: char,
    pub field_sep: char,
    pub component_sep: char,
    pub repetition_sep: char,
    pub escape_char: char,
    pub subcomponent_sep: char,
    pub character_encoding: String,
}

impl Default for EncodingParameters {
    fn default() -> Self {
        Self {
            segment_sep: '\r',
            field_sep: '|',
            component_sep: '^',
            repetition_sep: '~',
            escape_char: '\\',
            subcomponent_sep: '&',
            character_encoding: DEFAULT_CHARACTER_ENCODING.to_string(),
        }
    }
}

impl EncodingParameters {
    /// Returns a copy with a different escape character.
    pub fn with_escape_char(mut self, escape_char: char) -> Self {
        self.escape_char = escape_char;
        self
    }

    /// Returns a copy with a different character encoding label.
    pub fn with_character_encoding(mut self, character_encoding: impl Into<String>) -> Self {
        self.character_encoding = character_encoding.into();
        self
    }
}
