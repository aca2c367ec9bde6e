//! Observation message → dossier conversion.
//!
//! An [`ObservationProcessor`] walks one patient group of a parsed observation message:
//! the PID segment becomes the client section, and every nested OBR group becomes a report
//! whose OBX segments are dispatched through the [`rules`] table into intake and echo
//! sections, dossier metadata and embedded files.
//!
//! The processor is configured once per message with the message's encoding parameters,
//! then asked for one dossier per patient group:
//!
//! ```no_run
//! use hl7_peri22x::{CoreConfig, ObservationProcessor};
//! use hl7v2::Message;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let message = Message::parse(&std::fs::read("message.hl7")?)?;
//! let mut processor = ObservationProcessor::new(&CoreConfig::default());
//! processor.set_encoding_parameters(message.encoding_parameters())?;
//!
//! for group in message.segment_groups() {
//!     let dossier = processor.get_dossier(&group)?;
//!     println!("{}", dossier.to_xml_document()?.as_str());
//! }
//! # Ok(())
//! # }
//! ```

mod demographics;
mod report;
pub mod rules;

use crate::config::CoreConfig;
use crate::dossier::Dossier;
use crate::helpers::datetime::{self, Hl7DateTime};
use crate::helpers::encoding;
use crate::text_filter::EscapeSequenceFilter;
use crate::transformer::ValueTransformer;
use crate::{DossierError, DossierResult};
use chrono::NaiveDateTime;
use hl7_peri22x_documents::{DocumentFactory, SniffingDocumentFactory};
use hl7v2::{EncodingParameters, GroupEntry, Segment, SegmentGroup, SimpleValue};
use peri22x::Section;
use std::sync::Arc;

/// Source of the create stamp given to new sections.
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Builds dossiers from patient groups of an observation message.
#[derive(Debug)]
pub struct ObservationProcessor {
    resource_type: String,
    transformer: Box<dyn ValueTransformer + Send + Sync>,
    document_factory: Arc<dyn DocumentFactory + Send + Sync>,
    filter: EscapeSequenceFilter,
    clock: Clock,
}

impl ObservationProcessor {
    /// Creates a processor with the configured value transformer, MIME sniffing for embedded
    /// files and the local wall clock.
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            resource_type: config.resource_type().to_string(),
            transformer: config.value_transformer(),
            document_factory: Arc::new(SniffingDocumentFactory),
            filter: EscapeSequenceFilter::new(),
            clock: local_now,
        }
    }

    pub fn with_value_transformer(
        mut self,
        transformer: Box<dyn ValueTransformer + Send + Sync>,
    ) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_document_factory(
        mut self,
        document_factory: Arc<dyn DocumentFactory + Send + Sync>,
    ) -> Self {
        self.document_factory = document_factory;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Configures the escape sequence filter for the delimiters of the next message.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::InvalidConfiguration`] if the filter patterns cannot be built.
    pub fn set_encoding_parameters(&mut self, params: &EncodingParameters) -> DossierResult<()> {
        self.filter.set_encoding_parameters(params)
    }

    /// Builds a dossier from one patient group.
    ///
    /// # Arguments
    ///
    /// * `group` - A patient group: an optional PID, an optional PV1, then OBR groups.
    ///
    /// # Errors
    ///
    /// Returns [`DossierError::InvalidConfiguration`] if [`Self::set_encoding_parameters`]
    /// has not been called, a normalisation error for malformed dates, or an embedded file
    /// error for undecodable `rapport` observations.
    pub fn get_dossier(&self, group: &SegmentGroup) -> DossierResult<Dossier> {
        if !self.filter.is_configured() {
            return Err(DossierError::InvalidConfiguration(
                "set_encoding_parameters() must be called before get_dossier()".into(),
            ));
        }

        let mut dossier = Dossier::new(&self.resource_type, Arc::clone(&self.document_factory));
        let mut entries = group.entries().peekable();

        let pid = match entries.peek().and_then(|entry| entry.as_segment()) {
            Some(Segment::Pid(pid)) => {
                entries.next();
                Some(pid)
            }
            _ => None,
        };
        if let Some(Segment::Pv1(_)) = entries.peek().and_then(|entry| entry.as_segment()) {
            tracing::debug!("skipping PV1 segment");
            entries.next();
        }

        match pid {
            Some(pid) => self.add_client_section(&mut dossier, pid)?,
            None => tracing::warn!("patient group has no PID segment; no client section added"),
        }

        for entry in entries {
            match entry {
                GroupEntry::Group(report) => self.add_report(&mut dossier, report)?,
                GroupEntry::Segment(segment) => {
                    tracing::debug!(segment = segment.name(), "ignoring segment outside a report")
                }
            }
        }

        tracing::debug!(
            sections = dossier.resource().sections().len(),
            embedded_files = dossier.embedded_files().len(),
            "built dossier"
        );
        Ok(dossier)
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    // ========================================================================
    // Value extraction
    // ========================================================================

    /// The value as UTF-8, with escape sequences resolved for free-text kinds.
    fn text(&self, value: &SimpleValue) -> DossierResult<String> {
        self.filter.filter(value)
    }

    /// As [`Self::text`], skipping absent and empty values.
    fn optional_text(&self, value: Option<&SimpleValue>) -> DossierResult<Option<String>> {
        match value.filter(|v| v.has_value()) {
            Some(value) => Ok(Some(self.text(value)?).filter(|text| !text.is_empty())),
            None => Ok(None),
        }
    }

    fn decoded(&self, value: &SimpleValue) -> DossierResult<String> {
        Ok(encoding::decode(value.raw(), value.character_encoding())?.into_owned())
    }

    /// A date/time field formatted according to its precision.
    fn date_value(&self, value: &SimpleValue) -> DossierResult<String> {
        let text = self.decoded(value)?;
        datetime::format(text.trim()).map_err(|source| DossierError::DateTimeNormalisation {
            value: text,
            source,
        })
    }

    /// A timestamp field parsed for use as metadata and an effective stamp.
    fn timestamp_value(&self, value: &SimpleValue) -> DossierResult<Hl7DateTime> {
        let text = self.decoded(value)?;
        Hl7DateTime::parse(text.trim()).map_err(|source| DossierError::TimestampNormalisation {
            value: text,
            source,
        })
    }
}

/// Adds `value` under `concept` unless it is empty.
fn add_value(section: &mut Section, concept: &str, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        section.add_value(concept, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::HubAttachmentStrategy;
    use crate::constants::*;
    use crate::transformer::{MappingTransformer, ValueMappings};
    use chrono::NaiveDate;
    use hl7_peri22x_documents::Document;
    use hl7v2::Message;
    use peri22x::SectionType;

    const MESSAGE: &str = "MSH|^~\\&|ECHO|CLINIC|HUB|HUB|20160120101010||ORU^R01|1|P|2.5\r\
PID|1||123456789^^^NLM^NNNLD~A100^^^LOCAL^PI~X9^^^OTHER^MR||Jansen&van&Jansen^Anna^Maria^^^^L~^Ans^^^^^N||19850312|F|||Dorpsstraat 1&Dorpsstraat&1^Utrecht-gem^Utrecht^^3511AB^NLD^H||^PRN^CP^^31^06^12345678~^PRN^PH^^^030^1234567^12^^0~^NET^X.400^anna@example.org\r\
PV1|1|O\r\
OBR|1||ORD-1^ECHOAPP|ECHO^Echo|||20160120093000|||||||||12345^Huisarts|||||||||F|||||||INTERP1&Doe&Jane\r\
OBX|1|NM|gravida||1||||||F\r\
OBX|2|NM|Parity||0||||||F\r\
OBX|3|TS|due_date||20160809000000||||||F\r\
OBX|4|ST|gestational_age||27w3d||||||F\r\
OBX|5|NM|weight||1.2|Kg|||||F\r\
OBX|6|NM|hc|1|180|mm|||||F\r\
OBX|7|NM|hc|2|182|mm|||||F\r\
OBX|8|ST|placentaloc|1|Anterior Wall||||||F\r\
OBX|9|TX|diagnosis||Normal growth\\.br\\no anomalies~Follow up\\F\\ in 4 weeks||||||F\r\
OBX|10|NM|heartbeat||140||||||F\r\
OBX|11|ED|rapport||^AP^PDF^Base64^JVBERi0xLjQK||||||F\r";

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 1, 21)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap()
    }

    fn processor() -> ObservationProcessor {
        ObservationProcessor::new(&CoreConfig::default()).with_clock(fixed_now)
    }

    fn dossier_for(message: &str) -> DossierResult<Dossier> {
        dossier_with(processor(), message)
    }

    fn dossier_with(mut processor: ObservationProcessor, message: &str) -> DossierResult<Dossier> {
        let message = Message::parse(message.as_bytes()).unwrap();
        processor
            .set_encoding_parameters(message.encoding_parameters())
            .unwrap();
        let groups = message.segment_groups();
        assert_eq!(groups.len(), 1);
        processor.get_dossier(&groups[0])
    }

    fn section(dossier: &Dossier, section_type: SectionType) -> &Section {
        dossier.resource().section(section_type).unwrap()
    }

    #[test]
    fn unconfigured_processor_fails_fast() {
        let message = Message::parse(MESSAGE.as_bytes()).unwrap();
        let groups = message.segment_groups();

        let result = processor().get_dossier(&groups[0]);

        assert!(matches!(result, Err(DossierError::InvalidConfiguration(_))));
    }

    #[test]
    fn intake_values_are_extracted() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let intake = section(&dossier, SectionType::Intake);

        assert_eq!(intake.value(CONCEPT_GRAVIDITY), Some("1"));
        assert_eq!(intake.value(CONCEPT_PARITY), Some("0"));
        assert_eq!(intake.value(CONCEPT_DUE_DATE), Some("2016-08-09 00:00:00"));
    }

    #[test]
    fn echo_values_are_converted() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let echo = section(&dossier, SectionType::Echo);

        assert_eq!(echo.value(CONCEPT_GESTATIONAL_AGE), Some("192"));
        assert_eq!(echo.value(CONCEPT_ESTIMATED_WEIGHT), Some("1200"));
        assert_eq!(echo.value(CONCEPT_EXAMINATION_DATE), Some("2016-01-20 09:30:00"));
        assert_eq!(echo.value(CONCEPT_RESULT_INTERPRETER), Some("INTERP1"));
    }

    #[test]
    fn sub_ids_become_repeats() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let echo = section(&dossier, SectionType::Echo);

        assert_eq!(echo.repeated_value(CONCEPT_HEAD_CIRCUMFERENCE, "1"), Some("180"));
        assert_eq!(echo.repeated_value(CONCEPT_HEAD_CIRCUMFERENCE, "2"), Some("182"));
        assert_eq!(echo.repeated_value(CONCEPT_PLACENTA_LOCATION, "1"), Some("Anterior Wall"));
    }

    #[test]
    fn repeatable_observation_without_sub_id_is_unqualified() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1\rOBX|1|NM|fl||55|mm|||||F\r";

        let dossier = dossier_for(message).unwrap();
        let echo = section(&dossier, SectionType::Echo);
        let femur = echo
            .values()
            .iter()
            .find(|v| v.concept() == CONCEPT_FEMUR_LENGTH)
            .unwrap();

        assert_eq!(femur.value(), "55");
        assert_eq!(femur.repeat(), None);
    }

    #[test]
    fn unconvertible_unit_drops_the_value() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1||||||20160120093000\r\
OBX|1|NM|hc|1|18|cm|||||F\r";

        let dossier = dossier_for(message).unwrap();
        let echo = section(&dossier, SectionType::Echo);

        assert_eq!(echo.value(CONCEPT_EXAMINATION_DATE), Some("2016-01-20 09:30:00"));
        assert_eq!(echo.value(CONCEPT_HEAD_CIRCUMFERENCE), None);
        assert_eq!(echo.values().len(), 1);
    }

    #[test]
    fn multiline_values_are_filtered_cdata() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let echo = section(&dossier, SectionType::Echo);
        let diagnosis = echo
            .values()
            .iter()
            .find(|v| v.concept() == CONCEPT_ECHO_DIAGNOSIS)
            .unwrap();

        assert!(diagnosis.is_cdata());
        assert_eq!(
            diagnosis.value(),
            "Normal growth\nno anomalies\nFollow up| in 4 weeks"
        );
    }

    #[test]
    fn unrecognised_observations_are_ignored() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let echo = section(&dossier, SectionType::Echo);

        assert!(echo.values().iter().all(|v| !v.value().contains("140")));
        assert!(dossier.resource().section(SectionType::Consult).is_none());
    }

    #[test]
    fn report_metadata_is_recorded() {
        let dossier = dossier_for(MESSAGE).unwrap();

        assert_eq!(dossier.metadata_value(METADATA_ORDER_NUMBER), Some("ORD-1"));
        assert_eq!(dossier.metadata_value(METADATA_FILLER_APPLICATION), Some("ECHOAPP"));
        assert_eq!(
            dossier.metadata_value(METADATA_OBSERVATION_TIME),
            Some("2016-01-20 09:30:00")
        );
        assert_eq!(dossier.metadata_value(METADATA_RESULT_STATUS), Some("F"));
        assert_eq!(dossier.metadata_value(METADATA_REFERRING_PRACTICE), Some("12345"));
    }

    #[test]
    fn report_sections_are_stamped() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let observed = NaiveDate::from_ymd_opt(2016, 1, 20)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();

        for section_type in [SectionType::Intake, SectionType::Echo] {
            let section = section(&dossier, section_type);
            assert_eq!(section.create_stamp(), Some(fixed_now()));
            assert_eq!(section.effect_stamp(), Some(observed));
        }
    }

    #[test]
    fn observation_time_offset_is_kept() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1||||||20160120093000+0100\r\
OBX|1|NM|gravida||1||||||F\r";

        let dossier = dossier_for(message).unwrap();
        let intake = section(&dossier, SectionType::Intake);

        assert_eq!(
            intake.effect_stamp(),
            NaiveDate::from_ymd_opt(2016, 1, 20).and_then(|d| d.and_hms_opt(9, 30, 0))
        );
        assert_eq!(intake.effect_offset(), chrono::FixedOffset::east_opt(3600));
        assert_eq!(
            dossier.metadata_value(METADATA_OBSERVATION_TIME),
            Some("2016-01-20 09:30:00 +01:00")
        );
        let xml = dossier.to_xml_document().unwrap();
        assert!(xml.as_str().contains(r#"effectstamp="2016-01-20 09:30:00 +01:00""#));
    }

    #[test]
    fn client_section_is_extracted() {
        let dossier = dossier_for(MESSAGE).unwrap();
        let client = section(&dossier, SectionType::Client);

        assert_eq!(client.id(), Some("1"));
        assert_eq!(client.create_stamp(), Some(fixed_now()));
        assert_eq!(client.value(CONCEPT_NATIONAL_IDENTIFIER), Some("123456789"));
        assert_eq!(client.value(CONCEPT_LOCAL_IDENTIFIER), Some("A100"));
        assert_eq!(client.value(CONCEPT_BIRTH_DATE), Some("1985-03-12"));
        assert_eq!(client.value(CONCEPT_FORENAMES), Some("Anna Maria"));
        assert_eq!(client.value(CONCEPT_SURNAME), Some("Jansen"));
        assert_eq!(client.value(CONCEPT_NICKNAME), Some("Ans"));
        assert_eq!(client.value(CONCEPT_STREET), Some("Dorpsstraat 1"));
        assert_eq!(client.value(CONCEPT_HOUSE_NUMBER), None);
        assert_eq!(client.value(CONCEPT_CITY), Some("Utrecht"));
        assert_eq!(client.value(CONCEPT_POSTCODE), Some("3511AB"));
        assert_eq!(client.value(CONCEPT_COUNTRY), Some("NLD"));
        assert_eq!(client.value(CONCEPT_ADDRESS_TYPE), Some("H"));
        assert_eq!(client.value(CONCEPT_MUNICIPALITY), Some("Utrecht-gem"));
    }

    #[test]
    fn other_designation_is_the_municipality() {
        let message = "MSH|^~\\&|ECHO\rPID|1||||||||||Dorpsstraat 1^Gemeente X^Utrecht\rOBR|1\r";

        let dossier = dossier_for(message).unwrap();
        let client = section(&dossier, SectionType::Client);

        assert_eq!(client.value(CONCEPT_STREET), Some("Dorpsstraat 1"));
        assert_eq!(client.value(CONCEPT_MUNICIPALITY), Some("Gemeente X"));
        assert_eq!(client.value(CONCEPT_CITY), Some("Utrecht"));
    }

    #[test]
    fn contact_details_become_metadata() {
        let dossier = dossier_for(MESSAGE).unwrap();

        assert_eq!(
            dossier.metadata_value(METADATA_CLIENT_MOBILE_PHONE_NUMBER),
            Some("31 612345678")
        );
        assert_eq!(
            dossier.metadata_value(METADATA_CLIENT_PHONE_NUMBER),
            Some("0301234567 012")
        );
        assert_eq!(
            dossier.metadata_value(METADATA_CLIENT_EMAIL_ADDRESS),
            Some("anna@example.org")
        );
    }

    #[test]
    fn base64_report_becomes_embedded_pdf() {
        let mut dossier = dossier_for(MESSAGE).unwrap();

        let files = dossier.embedded_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].basename(), "rapport");
        assert_eq!(files[0].mime_type(), "application/pdf");
        assert_eq!(files[0].bytes(), b"%PDF-1.4\n");

        dossier.set_storage_key("dossier-1");
        dossier
            .register_attachments(&HubAttachmentStrategy)
            .unwrap();
        assert_eq!(dossier.resource().attachments()[0].filename(), "rapport.pdf");
        assert_eq!(dossier.embedded_files()[0].storage_key(), Some("1@dossier-1"));
    }

    #[test]
    fn value_transformer_remaps_placenta_location() {
        let mappings = ValueMappings::from_iter([(
            "placentaloc",
            [("anterior_wall".to_string(), "voorwand".to_string())],
        )]);
        let processor =
            processor().with_value_transformer(Box::new(MappingTransformer::new(mappings)));

        let dossier = dossier_with(processor, MESSAGE).unwrap();

        assert_eq!(
            section(&dossier, SectionType::Echo).repeated_value(CONCEPT_PLACENTA_LOCATION, "1"),
            Some("voorwand")
        );
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1\rOBX|1|ED|rapport||^AP^PDF^Base64^!!!!||||||F\r";

        let result = dossier_for(message);

        assert!(matches!(result, Err(DossierError::InvalidBase64(_))));
    }

    #[test]
    fn unsupported_embedded_encoding_names_the_tag() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1\rOBX|1|ED|rapport||^AP^PDF^Hex^2550||||||F\r";

        let result = dossier_for(message);

        assert!(
            matches!(result, Err(DossierError::UnsupportedEmbeddedEncoding(tag)) if tag == "Hex")
        );
    }

    #[test]
    fn text_report_is_embedded_as_plain_text() {
        let message =
            "MSH|^~\\&|ECHO\rPID|1\rOBR|1\rOBX|1|TX|RAPPORT||Line one~Line two||||||F\r";

        let dossier = dossier_for(message).unwrap();

        let files = dossier.embedded_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].bytes(), b"Line one\nLine two\n");
        assert_eq!(files[0].mime_type(), "text/plain");
    }

    #[test]
    fn malformed_observation_time_is_a_timestamp_error() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1||||||2016012\r";

        let result = dossier_for(message);

        assert!(matches!(
            result,
            Err(DossierError::TimestampNormalisation { ref value, .. }) if value == "2016012"
        ));
    }

    #[test]
    fn malformed_due_date_is_a_date_error() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1\rOBX|1|TS|due_date||2016081||||||F\r";

        let result = dossier_for(message);

        assert!(matches!(result, Err(DossierError::DateTimeNormalisation { .. })));
    }

    #[test]
    fn empty_sections_are_not_added() {
        let message = "MSH|^~\\&|ECHO\rPID|1\rOBR|1\rOBX|1|NM|gravida||||||||F\r";

        let dossier = dossier_for(message).unwrap();

        assert!(dossier.resource().sections().is_empty());
    }

    #[test]
    fn group_without_pid_has_no_client_section() {
        let message = "MSH|^~\\&|ECHO\rOBR|1\rOBX|1|NM|gravida||2||||||F\r";

        let dossier = dossier_for(message).unwrap();

        assert!(dossier.resource().section(SectionType::Client).is_none());
        assert_eq!(
            section(&dossier, SectionType::Intake).value(CONCEPT_GRAVIDITY),
            Some("2")
        );
        assert!(section(&dossier, SectionType::Intake).effect_stamp().is_none());
    }

    #[test]
    fn dossier_renders_to_xml() {
        let dossier = dossier_for(MESSAGE).unwrap();

        let xml = dossier.to_xml_document().unwrap();

        assert!(xml.as_str().contains(r#"<section type="client""#));
        assert!(xml
            .as_str()
            .contains(r#"<value concept="peri22-dataelement-20010">1</value>"#));
    }
}
