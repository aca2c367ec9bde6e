//! HL7 escape sequence filter.
//!
//! Free-text fields (ST, TX, FT) may contain escape sequences delimited by the message's
//! escape character: formatting commands such as `\.br\` and delimiter substitutions such as
//! `\F\`. The filter rewrites them into plain text. The delimiters differ per message, so the
//! patterns are compiled from the message's [`EncodingParameters`] before use.

use crate::helpers::encoding;
use crate::{DossierError, DossierResult};
use hl7v2::{EncodingParameters, SimpleValue};
use regex::{NoExpand, Regex};

/// Formatting sequences and their replacements, without the surrounding escape characters.
const FORMATTING_SEQUENCES: [(&str, &str); 10] = [
    (r"\.sp\d*", "\n"),
    (r"\.br", "\n"),
    (r"\.ce", "\n"),
    (r"\.in[+-]?\d*", " "),
    (r"\.sk\d*", " "),
    (r"\.ti[+-]?\d*", ""),
    (r"\.fi", ""),
    (r"\.nf", ""),
    ("H", ""),
    ("N", ""),
];

#[derive(Clone, Debug, Default)]
pub struct EscapeSequenceFilter {
    patterns: Option<Vec<(Regex, String)>>,
}

impl EscapeSequenceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles the patterns for a message's delimiters. Must be called before [`Self::filter`].
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::InvalidConfiguration`] if a pattern fails to compile.
    pub fn set_encoding_parameters(&mut self, params: &EncodingParameters) -> DossierResult<()> {
        let esc = regex::escape(&params.escape_char.to_string());

        let substitutions = [
            ("F", params.field_sep),
            ("S", params.component_sep),
            ("T", params.subcomponent_sep),
            ("R", params.repetition_sep),
            ("E", params.escape_char),
        ];

        let mut patterns = Vec::with_capacity(FORMATTING_SEQUENCES.len() + substitutions.len());
        for (sequence, replacement) in FORMATTING_SEQUENCES {
            patterns.push((compile(&esc, sequence)?, replacement.to_string()));
        }
        for (sequence, delimiter) in substitutions {
            patterns.push((compile(&esc, sequence)?, delimiter.to_string()));
        }

        self.patterns = Some(patterns);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.patterns.is_some()
    }

    /// True for the free-text kinds escape sequences may appear in.
    pub fn is_value_supported(&self, value: &SimpleValue) -> bool {
        value.data_type().is_text()
    }

    /// Decodes the value to UTF-8 and, for free-text kinds, rewrites its escape sequences.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::InvalidConfiguration`] if no encoding parameters were set, or
    /// [`DossierError::UnsupportedCharacterEncoding`] if the value cannot be decoded.
    pub fn filter(&self, value: &SimpleValue) -> DossierResult<String> {
        let patterns = self.patterns.as_ref().ok_or_else(|| {
            DossierError::InvalidConfiguration(
                "set_encoding_parameters() must be called before filter()".into(),
            )
        })?;

        let text = encoding::decode(value.raw(), value.character_encoding())?.into_owned();
        if !self.is_value_supported(value) {
            return Ok(text);
        }

        Ok(patterns.iter().fold(text, |text, (pattern, replacement)| {
            pattern
                .replace_all(&text, NoExpand(replacement))
                .into_owned()
        }))
    }
}

fn compile(esc: &str, sequence: &str) -> DossierResult<Regex> {
    Regex::new(&format!("{esc}{sequence}{esc}")).map_err(|e| {
        DossierError::InvalidConfiguration(format!("invalid escape sequence pattern: {e}"))
    })
}
