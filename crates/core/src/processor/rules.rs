//! Observation dispatch table.
//!
//! Each recognised OBX-3 identifier resolves once to an [`ObservationRule`] that says where
//! the value goes and how it is extracted.

use crate::constants::*;
use peri22x::SectionType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationKind {
    Gravida,
    Parity,
    DueDate,
    GestationalAge,
    Weight,
    HeadCircumference,
    HeadCircumferencePercentile,
    FemurLength,
    FemurLengthPercentile,
    AbdominalCircumference,
    AbdominalCircumferencePercentile,
    PlacentaLocation,
    Diagnosis,
    Conclusion,
    Report,
}

/// How the observation value is extracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// Values joined by a space, converted to the rule's unit if it has one.
    Value,
    /// Date/time values only, normalised.
    Date,
    /// As [`Extraction::Value`], then passed through the value transformer.
    Transformed,
    /// Lines joined by newlines, stored as CDATA.
    Multiline,
    /// Each value becomes an embedded file.
    EmbeddedFile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObservationRule {
    pub kind: ObservationKind,
    /// Section and concept the value is stored under; `None` for embedded files.
    pub target: Option<(SectionType, &'static str)>,
    /// Unit the value is converted to.
    pub unit: Option<&'static str>,
    /// Whether OBX-4 qualifies the value as a `repeat`.
    pub repeatable: bool,
    pub extraction: Extraction,
}

const fn rule(
    kind: ObservationKind,
    section: SectionType,
    concept: &'static str,
    unit: Option<&'static str>,
    repeatable: bool,
    extraction: Extraction,
) -> ObservationRule {
    ObservationRule {
        kind,
        target: Some((section, concept)),
        unit,
        repeatable,
        extraction,
    }
}

use Extraction::{Date, Multiline, Transformed, Value};
use ObservationKind as K;
use SectionType::{Echo, Intake};

/// Lowercase OBX-3 identifier → rule.
pub static RULES: &[(&str, ObservationRule)] = &[
    ("gravida", rule(K::Gravida, Intake, CONCEPT_GRAVIDITY, None, false, Value)),
    ("parity", rule(K::Parity, Intake, CONCEPT_PARITY, None, false, Value)),
    ("due_date", rule(K::DueDate, Intake, CONCEPT_DUE_DATE, None, false, Date)),
    (
        "gestational_age",
        rule(K::GestationalAge, Echo, CONCEPT_GESTATIONAL_AGE, Some("days"), false, Value),
    ),
    ("weight", rule(K::Weight, Echo, CONCEPT_ESTIMATED_WEIGHT, Some("g"), false, Value)),
    (
        "hc",
        rule(K::HeadCircumference, Echo, CONCEPT_HEAD_CIRCUMFERENCE, Some("mm"), true, Value),
    ),
    (
        "hcperc",
        rule(
            K::HeadCircumferencePercentile,
            Echo,
            CONCEPT_HEAD_CIRCUMFERENCE_PERCENTILE,
            None,
            true,
            Value,
        ),
    ),
    (
        "hcp",
        rule(
            K::HeadCircumferencePercentile,
            Echo,
            CONCEPT_HEAD_CIRCUMFERENCE_PERCENTILE,
            None,
            true,
            Value,
        ),
    ),
    ("fl", rule(K::FemurLength, Echo, CONCEPT_FEMUR_LENGTH, Some("mm"), true, Value)),
    (
        "flperc",
        rule(K::FemurLengthPercentile, Echo, CONCEPT_FEMUR_LENGTH_PERCENTILE, None, true, Value),
    ),
    (
        "flp",
        rule(K::FemurLengthPercentile, Echo, CONCEPT_FEMUR_LENGTH_PERCENTILE, None, true, Value),
    ),
    (
        "ac",
        rule(
            K::AbdominalCircumference,
            Echo,
            CONCEPT_ABDOMINAL_CIRCUMFERENCE,
            Some("mm"),
            true,
            Value,
        ),
    ),
    (
        "acperc",
        rule(
            K::AbdominalCircumferencePercentile,
            Echo,
            CONCEPT_ABDOMINAL_CIRCUMFERENCE_PERCENTILE,
            None,
            true,
            Value,
        ),
    ),
    (
        "acp",
        rule(
            K::AbdominalCircumferencePercentile,
            Echo,
            CONCEPT_ABDOMINAL_CIRCUMFERENCE_PERCENTILE,
            None,
            true,
            Value,
        ),
    ),
    (
        "placentaloc",
        rule(K::PlacentaLocation, Echo, CONCEPT_PLACENTA_LOCATION, None, true, Transformed),
    ),
    ("diagnosis", rule(K::Diagnosis, Echo, CONCEPT_ECHO_DIAGNOSIS, None, false, Multiline)),
    ("conclusion", rule(K::Conclusion, Echo, CONCEPT_ECHO_CONCLUSION, None, false, Multiline)),
    (
        EMBEDDED_FILE_OBSERVATION,
        ObservationRule {
            kind: K::Report,
            target: None,
            unit: None,
            repeatable: false,
            extraction: Extraction::EmbeddedFile,
        },
    ),
];

/// The rule for an OBX-3 identifier, compared case-insensitively.
pub fn lookup(identifier: &str) -> Option<&'static ObservationRule> {
    let identifier = identifier.trim().to_lowercase();
    RULES
        .iter()
        .find(|(name, _)| *name == identifier)
        .map(|(_, rule)| rule)
}
