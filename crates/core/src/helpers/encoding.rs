//! Character set normalisation.
//!
//! Field values keep the raw bytes of the message; this module decodes them to UTF-8 using the
//! character set the message declared in MSH-18. Both HL7 table 0211 names (`8859/1`,
//! `UNICODE UTF-8`) and common labels (`utf8`, `iso-8859-1`) are understood.

use crate::{DossierError, DossierResult};
use encoding_rs::{Encoding, BIG5, EUC_KR, GB18030, UTF_16LE, UTF_8, WINDOWS_1252};
use std::borrow::Cow;

/// How to decode a declared character set.
enum Charset {
    /// 7-bit declarations; bytes above 0x7f are read as UTF-8 when valid, else Windows-1252.
    Ascii,
    Encoding(&'static Encoding),
}

fn resolve(label: &str) -> Option<Charset> {
    let label = label.trim();
    let upper = label.to_ascii_uppercase();
    let charset = match upper.as_str() {
        "" | "ASCII" | "US-ASCII" | "7BIT" | "ISO IR6" => Charset::Ascii,
        "UNICODE" | "UNICODE UTF-8" | "UTF8" | "UTF-8" => Charset::Encoding(UTF_8),
        "UNICODE UTF-16" => Charset::Encoding(UTF_16LE),
        "GB 18030-2000" => Charset::Encoding(GB18030),
        "KS X 1001" => Charset::Encoding(EUC_KR),
        "BIG-5" => Charset::Encoding(BIG5),
        "ISO IR100" => Charset::Encoding(WINDOWS_1252),
        _ => {
            if let Some(part) = upper.strip_prefix("8859/") {
                return Encoding::for_label(format!("iso-8859-{part}").as_bytes())
                    .map(Charset::Encoding);
            }
            return Encoding::for_label(label.as_bytes()).map(Charset::Encoding);
        }
    };
    Some(charset)
}

/// Decodes `raw` from the character set named by `label` into UTF-8.
///
/// Malformed sequences are replaced with U+FFFD.
///
/// # Errors
///
/// Returns [`DossierError::UnsupportedCharacterEncoding`] if the label is not recognised.
pub fn decode<'a>(raw: &'a [u8], label: &str) -> DossierResult<Cow<'a, str>> {
    let charset =
        resolve(label).ok_or_else(|| DossierError::UnsupportedCharacterEncoding(label.into()))?;

    let (text, had_errors) = match charset {
        Charset::Ascii => match std::str::from_utf8(raw) {
            Ok(text) => (Cow::Borrowed(text), false),
            Err(_) => WINDOWS_1252.decode_without_bom_handling(raw),
        },
        Charset::Encoding(encoding) => encoding.decode_without_bom_handling(raw),
    };

    if had_errors {
        tracing::warn!(
            character_encoding = label,
            "replaced malformed byte sequences while decoding field"
        );
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_latin1_declarations() {
        let raw = b"Jos\xe9";
        assert_eq!(decode(raw, "8859/1").unwrap(), "José");
        assert_eq!(decode(raw, "iso-8859-1").unwrap(), "José");
    }

    #[test]
    fn decodes_utf8_declarations() {
        let raw = "Здравей".as_bytes();
        assert_eq!(decode(raw, "UNICODE UTF-8").unwrap(), "Здравей");
        assert_eq!(decode(raw, "utf8").unwrap(), "Здравей");
    }

    #[test]
    fn ascii_declarations_tolerate_eight_bit_text() {
        assert_eq!(decode(b"Hello", "ASCII").unwrap(), "Hello");
        assert_eq!(decode(b"Hello", "7bit").unwrap(), "Hello");
        assert_eq!(decode("één".as_bytes(), "ASCII").unwrap(), "één");
        assert_eq!(decode(b"\xe9\xe9n", "").unwrap(), "één");
    }

    #[test]
    fn decodes_other_8859_parts() {
        assert_eq!(decode(b"\xb1", "8859/2").unwrap(), "ą");
    }

    #[test]
    fn rejects_unknown_labels() {
        let err = decode(b"x", "EBCDIC-42").unwrap_err();
        assert!(matches!(
            err,
            DossierError::UnsupportedCharacterEncoding(label) if label == "EBCDIC-42"
        ));
    }
}
