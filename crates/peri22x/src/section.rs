//! Sections and their values.

use chrono::{FixedOffset, NaiveDateTime};
use std::fmt;

/// Format of the `createstamp` and `effectstamp` section attributes (local time). An effect
/// stamp with a known offset is followed by it, e.g. `2016-01-20 09:30:00 +01:00`.
pub const SECTION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The kind of data a section groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionType {
    /// Patient demographics.
    Client,
    /// Pregnancy intake.
    Intake,
    Consult,
    /// Ultrasound examination.
    Echo,
}

impl SectionType {
    /// Section types populated from observation reports, in output order.
    pub const REPORT: [SectionType; 3] =
        [SectionType::Intake, SectionType::Consult, SectionType::Echo];

    pub const fn as_str(self) -> &'static str {
        match self {
            SectionType::Client => "client",
            SectionType::Intake => "intake",
            SectionType::Consult => "consult",
            SectionType::Echo => "echo",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data element of a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Value {
    concept: String,
    value: String,
    cdata: bool,
    repeat: Option<String>,
}

impl Value {
    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when the value is rendered as a CDATA block.
    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    /// Sub-identifier distinguishing repeated occurrences of one concept.
    pub fn repeat(&self) -> Option<&str> {
        self.repeat.as_deref()
    }
}

/// A typed, timestamped group of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    section_type: SectionType,
    create_stamp: Option<NaiveDateTime>,
    effect_stamp: Option<NaiveDateTime>,
    effect_offset: Option<FixedOffset>,
    id: Option<String>,
    values: Vec<Value>,
}

impl Section {
    pub fn new(section_type: SectionType) -> Self {
        Self {
            section_type,
            create_stamp: None,
            effect_stamp: None,
            effect_offset: None,
            id: None,
            values: Vec::new(),
        }
    }

    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub fn create_stamp(&self) -> Option<NaiveDateTime> {
        self.create_stamp
    }

    pub fn set_create_stamp(&mut self, stamp: NaiveDateTime) {
        self.create_stamp = Some(stamp);
    }

    /// When the recorded data took effect, e.g. the time of the examination.
    pub fn effect_stamp(&self) -> Option<NaiveDateTime> {
        self.effect_stamp
    }

    pub fn set_effect_stamp(&mut self, stamp: NaiveDateTime) {
        self.effect_stamp = Some(stamp);
    }

    /// UTC offset the effect stamp was recorded in, if the source carried one.
    pub fn effect_offset(&self) -> Option<FixedOffset> {
        self.effect_offset
    }

    pub fn set_effect_offset(&mut self, offset: FixedOffset) {
        self.effect_offset = Some(offset);
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn add_value(&mut self, concept: impl Into<String>, value: impl Into<String>) {
        self.push(concept.into(), value.into(), false, None);
    }

    /// Adds a value qualified by a `repeat` sub-identifier.
    pub fn add_repeated_value(
        &mut self,
        concept: impl Into<String>,
        value: impl Into<String>,
        repeat: impl Into<String>,
    ) {
        self.push(concept.into(), value.into(), false, Some(repeat.into()));
    }

    /// Adds a value rendered as CDATA, for multi-line text.
    pub fn add_cdata_value(&mut self, concept: impl Into<String>, value: impl Into<String>) {
        self.push(concept.into(), value.into(), true, None);
    }

    fn push(&mut self, concept: String, value: String, cdata: bool, repeat: Option<String>) {
        self.values.push(Value {
            concept,
            value,
            cdata,
            repeat,
        });
    }

    /// The first value stored for `concept`.
    pub fn value(&self, concept: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|value| value.concept == concept)
            .map(Value::value)
    }

    /// The value stored for `concept` with the given `repeat` qualifier.
    pub fn repeated_value(&self, concept: &str, repeat: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|value| value.concept == concept && value.repeat.as_deref() == Some(repeat))
            .map(Value::value)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }
}
