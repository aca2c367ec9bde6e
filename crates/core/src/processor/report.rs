//! Report groups: an OBR segment followed by its OBX observations.

use super::rules::{self, Extraction, ObservationRule};
use super::ObservationProcessor;
use crate::constants::*;
use crate::dossier::Dossier;
use crate::helpers::units;
use crate::{DossierError, DossierResult};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use crate::helpers::datetime::Hl7DateTime;
use hl7v2::{Ed, FieldValue, ObrSegment, ObxSegment, Segment, SegmentGroup};
use peri22x::{Section, SectionType};

/// Standard alphabet, padding optional.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The report sections being filled, in output order.
struct ReportSections([Section; 3]);

impl ReportSections {
    fn new() -> Self {
        Self(SectionType::REPORT.map(Section::new))
    }

    fn get_mut(&mut self, section_type: SectionType) -> Option<&mut Section> {
        self.0
            .iter_mut()
            .find(|section| section.section_type() == section_type)
    }
}

impl ObservationProcessor {
    pub(super) fn add_report(&self, dossier: &mut Dossier, group: &SegmentGroup) -> DossierResult<()> {
        let Some(Segment::Obr(obr)) = group.first_segment() else {
            tracing::debug!("ignoring nested group that does not start with OBR");
            return Ok(());
        };

        let mut sections = ReportSections::new();
        let observed = self.add_request_details(dossier, &mut sections, obr)?;

        for entry in group.entries().skip(1) {
            match entry.as_segment() {
                Some(Segment::Obx(obx)) => self.add_observation(dossier, &mut sections, obx)?,
                Some(other) => {
                    tracing::debug!(segment = other.name(), "ignoring segment in report")
                }
                None => tracing::debug!("ignoring nested group in report"),
            }
        }

        let now = self.now();
        for mut section in sections.0 {
            if !section.has_values() {
                continue;
            }
            section.set_create_stamp(now);
            if let Some(observed) = &observed {
                section.set_effect_stamp(observed.local());
                if let Some(offset) = observed.offset() {
                    section.set_effect_offset(offset);
                }
            }
            dossier.resource_mut().add_section(section);
        }
        Ok(())
    }

    /// Records the OBR fields, returning the observation time for the effective stamp.
    fn add_request_details(
        &self,
        dossier: &mut Dossier,
        sections: &mut ReportSections,
        obr: &ObrSegment,
    ) -> DossierResult<Option<Hl7DateTime>> {
        if let Some(order) = &obr.filler_order_number {
            if let Some(number) = self.optional_text(order.entity_identifier.as_ref())? {
                dossier.add_metadata(METADATA_ORDER_NUMBER, number);
            }
            if let Some(application) = self.optional_text(order.namespace_id.as_ref())? {
                dossier.add_metadata(METADATA_FILLER_APPLICATION, application);
            }
        }

        let mut observed = None;
        let time = obr
            .observation_datetime
            .as_ref()
            .and_then(|ts| ts.time.as_ref())
            .filter(|time| time.has_value());
        if let Some(time) = time {
            let timestamp = self.timestamp_value(time)?;
            dossier.add_metadata(METADATA_OBSERVATION_TIME, timestamp.to_string());
            if let Some(echo) = sections.get_mut(SectionType::Echo) {
                echo.add_value(CONCEPT_EXAMINATION_DATE, self.date_value(time)?);
            }
            observed = Some(timestamp);
        }

        if let Some(status) = self.optional_text(obr.result_status.as_ref())? {
            dossier.add_metadata(METADATA_RESULT_STATUS, status);
        }

        let interpreter = obr
            .principal_result_interpreter
            .as_ref()
            .and_then(|ndl| ndl.name.as_ref())
            .and_then(|name| name.id_number.as_ref());
        if let Some(interpreter) = self.optional_text(interpreter)? {
            if let Some(echo) = sections.get_mut(SectionType::Echo) {
                echo.add_value(CONCEPT_RESULT_INTERPRETER, interpreter);
            }
        }

        let practice = obr
            .ordering_provider
            .iter()
            .find_map(|provider| provider.id_number.as_ref().filter(|id| id.has_value()));
        if let Some(practice) = self.optional_text(practice)? {
            dossier.add_metadata(METADATA_REFERRING_PRACTICE, practice);
        }

        Ok(observed)
    }

    fn add_observation(
        &self,
        dossier: &mut Dossier,
        sections: &mut ReportSections,
        obx: &ObxSegment,
    ) -> DossierResult<()> {
        let identifier = obx
            .observation_identifier
            .as_ref()
            .and_then(|ce| ce.identifier.as_ref());
        let Some(identifier) = self.optional_text(identifier)? else {
            tracing::debug!("ignoring observation without identifier");
            return Ok(());
        };
        let Some(rule) = rules::lookup(&identifier) else {
            tracing::debug!(identifier, "ignoring unrecognised observation");
            return Ok(());
        };
        tracing::debug!(identifier, kind = ?rule.kind, "dispatching observation");

        let Some((section_type, concept)) = rule.target else {
            let value_type = self
                .optional_text(obx.value_type.as_ref())?
                .unwrap_or_default()
                .to_uppercase();
            return self.add_embedded_file(dossier, obx, &value_type, &identifier.to_lowercase());
        };
        let Some(section) = sections.get_mut(section_type) else {
            return Ok(());
        };

        if rule.extraction == Extraction::Multiline {
            let text = self.multiline_value(obx)?;
            if !text.is_empty() {
                section.add_cdata_value(concept, text);
            }
            return Ok(());
        }

        let mut value = self.observation_value(obx, rule)?;
        if rule.extraction == Extraction::Transformed {
            value = self.transformer.transform(&identifier, &value);
        }
        if value.is_empty() {
            tracing::debug!(identifier, "skipping observation without a value");
            return Ok(());
        }

        let repeat = if rule.repeatable {
            self.optional_text(obx.observation_sub_id.as_ref())?
        } else {
            None
        };
        match repeat {
            Some(repeat) => section.add_repeated_value(concept, value, repeat),
            None => section.add_value(concept, value),
        }
        Ok(())
    }

    /// The observation values joined by a space, each converted to the rule's unit.
    fn observation_value(&self, obx: &ObxSegment, rule: &ObservationRule) -> DossierResult<String> {
        let source_unit = self
            .optional_text(obx.units.as_ref().and_then(|ce| ce.identifier.as_ref()))?
            .unwrap_or_default();

        let mut values = Vec::with_capacity(obx.observation_value.len());
        for field in &obx.observation_value {
            let value = match (rule.extraction, field) {
                (Extraction::Date, FieldValue::Timestamp(ts)) => match &ts.time {
                    Some(time) if time.has_value() => self.date_value(time)?,
                    _ => continue,
                },
                (Extraction::Date, _) => continue,
                (_, field) => match self.optional_text(field.primary())? {
                    Some(value) => value,
                    None => continue,
                },
            };
            let value = match rule.unit {
                Some(target) => units::convert(&value, &source_unit, target),
                None => value,
            };
            if !value.is_empty() {
                values.push(value);
            }
        }
        Ok(values.join(" "))
    }

    fn multiline_value(&self, obx: &ObxSegment) -> DossierResult<String> {
        let mut lines = Vec::with_capacity(obx.observation_value.len());
        for field in &obx.observation_value {
            if let Some(line) = field.primary().filter(|v| v.has_value()) {
                lines.push(self.text(line)?);
            }
        }
        Ok(lines.join("\n"))
    }

    fn add_embedded_file(
        &self,
        dossier: &mut Dossier,
        obx: &ObxSegment,
        value_type: &str,
        basename: &str,
    ) -> DossierResult<()> {
        match value_type {
            "ED" => {
                for field in &obx.observation_value {
                    if let FieldValue::EncapsulatedData(ed) = field {
                        let data = self.encapsulated_data(ed)?;
                        dossier.add_file_data(data, basename);
                    }
                }
            }
            "TX" => {
                let mut text = self.multiline_value(obx)?;
                text.push('\n');
                dossier.add_file_data(text.into_bytes(), basename);
            }
            other => {
                tracing::warn!(value_type = other, "embedded file has unsupported value type");
            }
        }
        Ok(())
    }

    fn encapsulated_data(&self, ed: &Ed) -> DossierResult<Vec<u8>> {
        let encoding = self
            .optional_text(ed.encoding.as_ref())?
            .unwrap_or_default();

        match encoding.as_str() {
            "Base64" => {
                let payload: Vec<u8> = ed
                    .data
                    .as_ref()
                    .map(|data| data.raw())
                    .unwrap_or_default()
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                BASE64.decode(payload).map_err(DossierError::InvalidBase64)
            }
            "A" => Ok(self
                .optional_text(ed.data.as_ref())?
                .unwrap_or_default()
                .into_bytes()),
            other => Err(DossierError::UnsupportedEmbeddedEncoding(other.to_string())),
        }
    }
}
