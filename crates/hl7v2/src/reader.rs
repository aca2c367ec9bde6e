//! Minimal ER7 reader.
//!
//! Splits a pipe-delimited HL7v2 message into segments, fields, repetitions, components and
//! subcomponents using the delimiters declared in its MSH segment, and builds the typed
//! segments of [`crate::segments`]. Field bytes are kept verbatim: no character set decoding
//! and no escape sequence processing happens here.

use crate::data_types::{
    present, Ce, Cnn, Cx, DataType, Ed, Ei, FamilyName, FieldValue, Ndl, Sad, SimpleValue, Ts,
    Xad, Xcn, Xpn, Xtn,
};
use crate::encoding::{EncodingParameters, DEFAULT_CHARACTER_ENCODING};
use crate::group::SegmentGroup;
use crate::segments::{ObrSegment, ObxSegment, PidSegment, Pv1Segment, Segment};
use crate::{Hl7Error, Hl7Result};

/// A parsed HL7v2 message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    encoding: EncodingParameters,
    segments: Vec<Segment>,
}

impl Message {
    /// Parse an ER7 encoded message.
    ///
    /// Segments may be separated by `\r`, `\n` or `\r\n`; blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Hl7Error`] if the input is empty, does not start with an MSH segment, or the
    /// MSH segment does not declare four encoding characters.
    pub fn parse(input: &[u8]) -> Hl7Result<Self> {
        let mut lines = input
            .split(|b| *b == b'\r' || *b == b'\n')
            .filter(|line| !line.is_empty());

        let header = lines.next().ok_or(Hl7Error::EmptyMessage)?;
        let encoding = read_encoding_parameters(header)?;
        let delimiters = Delimiters::from(&encoding);

        let mut segments = vec![Segment::Other("MSH".to_string())];
        for line in lines {
            segments.push(read_segment(line, &delimiters, &encoding.character_encoding));
        }

        tracing::debug!(
            segments = segments.len(),
            character_encoding = %encoding.character_encoding,
            "parsed HL7 message"
        );

        Ok(Self { encoding, segments })
    }

    pub fn encoding_parameters(&self) -> &EncodingParameters {
        &self.encoding
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Group the segments per patient: `PID [PV1] { OBR {OBX} }`.
    ///
    /// Segments preceding the first PID (other than MSH) open an anonymous patient group.
    /// Unmodelled segments stay in whichever group is open when they appear.
    pub fn segment_groups(&self) -> Vec<SegmentGroup> {
        let mut groups = Vec::new();
        let mut patient: Option<SegmentGroup> = None;
        let mut report: Option<SegmentGroup> = None;

        for segment in self.segments.iter().skip(1) {
            match segment {
                Segment::Pid(_) => {
                    flush_report(&mut patient, &mut report);
                    if let Some(done) = patient.take() {
                        groups.push(done);
                    }
                    let mut group = SegmentGroup::new();
                    group.push_segment(segment.clone());
                    patient = Some(group);
                }
                Segment::Obr(_) => {
                    flush_report(&mut patient, &mut report);
                    let mut group = SegmentGroup::new();
                    group.push_segment(segment.clone());
                    report = Some(group);
                }
                _ => match report.as_mut() {
                    Some(open) => open.push_segment(segment.clone()),
                    None => patient
                        .get_or_insert_with(SegmentGroup::new)
                        .push_segment(segment.clone()),
                },
            }
        }

        flush_report(&mut patient, &mut report);
        if let Some(done) = patient {
            groups.push(done);
        }
        groups
    }
}

fn flush_report(patient: &mut Option<SegmentGroup>, report: &mut Option<SegmentGroup>) {
    if let Some(done) = report.take() {
        patient.get_or_insert_with(SegmentGroup::new).push_group(done);
    }
}

/// Delimiters as bytes, for splitting.
struct Delimiters {
    field: u8,
    component: u8,
    repetition: u8,
    subcomponent: u8,
}

impl From<&EncodingParameters> for Delimiters {
    fn from(params: &EncodingParameters) -> Self {
        Self {
            field: params.field_sep as u32 as u8,
            component: params.component_sep as u32 as u8,
            repetition: params.repetition_sep as u32 as u8,
            subcomponent: params.subcomponent_sep as u32 as u8,
        }
    }
}

fn read_encoding_parameters(header: &[u8]) -> Hl7Result<EncodingParameters> {
    if !header.starts_with(b"MSH") || header.len() < 4 {
        return Err(Hl7Error::MissingHeader);
    }
    let field_sep = header[3];
    let encoding_chars: Vec<u8> = header[4..]
        .iter()
        .copied()
        .take_while(|b| *b != field_sep)
        .collect();
    if encoding_chars.len() < 4 {
        return Err(Hl7Error::InvalidEncodingCharacters(
            String::from_utf8_lossy(&encoding_chars).into_owned(),
        ));
    }

    // MSH-1 is the field separator itself, so MSH-n sits at split index n - 1.
    let character_encoding = header
        .split(|b| *b == field_sep)
        .nth(17)
        .map(|field| {
            let first = field
                .split(|b| *b == encoding_chars[1])
                .next()
                .unwrap_or_default();
            let first = first
                .split(|b| *b == encoding_chars[0])
                .next()
                .unwrap_or_default();
            String::from_utf8_lossy(first).trim().to_string()
        })
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| DEFAULT_CHARACTER_ENCODING.to_string());

    Ok(EncodingParameters {
        segment_sep: '\r',
        field_sep: field_sep as char,
        component_sep: encoding_chars[0] as char,
        repetition_sep: encoding_chars[1] as char,
        escape_char: encoding_chars[2] as char,
        subcomponent_sep: encoding_chars[3] as char,
        character_encoding,
    })
}

/// One repetition of a field: its raw bytes and its components split into subcomponents.
struct Repetition<'a> {
    raw: &'a [u8],
    components: Vec<Vec<&'a [u8]>>,
}

impl<'a> Repetition<'a> {
    fn new(raw: &'a [u8], delimiters: &Delimiters) -> Self {
        let components = raw
            .split(|b| *b == delimiters.component)
            .map(|component| component.split(|b| *b == delimiters.subcomponent).collect())
            .collect();
        Self { raw, components }
    }

    /// 1-based component, first subcomponent.
    fn component(&self, index: usize) -> &'a [u8] {
        self.subcomponent(index, 1)
    }

    /// 1-based component and subcomponent.
    fn subcomponent(&self, index: usize, sub: usize) -> &'a [u8] {
        self.components
            .get(index - 1)
            .and_then(|subs| subs.get(sub - 1))
            .copied()
            .unwrap_or_default()
    }
}

/// Builds typed values from the repetitions of one segment.
struct FieldReader<'a> {
    fields: Vec<&'a [u8]>,
    delimiters: &'a Delimiters,
    character_encoding: &'a str,
}

impl<'a> FieldReader<'a> {
    /// Non-empty repetitions of field `index` (segment name is index 0).
    fn repetitions(&self, index: usize) -> Vec<Repetition<'a>> {
        match self.fields.get(index) {
            Some(field) => field
                .split(|b| *b == self.delimiters.repetition)
                .filter(|rep| !rep.is_empty())
                .map(|rep| Repetition::new(rep, self.delimiters))
                .collect(),
            None => Vec::new(),
        }
    }

    fn first(&self, index: usize) -> Option<Repetition<'a>> {
        self.repetitions(index).into_iter().next()
    }

    fn leaf(&self, data_type: DataType, raw: &[u8]) -> Option<SimpleValue> {
        present(Some(SimpleValue::new(
            data_type,
            raw.to_vec(),
            self.character_encoding,
        )))
    }

    fn simple(&self, index: usize, data_type: DataType) -> Option<SimpleValue> {
        self.first(index)
            .and_then(|rep| self.leaf(data_type, rep.component(1)))
    }

    fn cx(&self, rep: &Repetition) -> Cx {
        Cx {
            id_number: self.leaf(DataType::St, rep.component(1)),
            check_digit: self.leaf(DataType::St, rep.component(2)),
            check_digit_scheme: self.leaf(DataType::Id, rep.component(3)),
            assigning_authority: self.leaf(DataType::Is, rep.component(4)),
            identifier_type_code: self.leaf(DataType::Id, rep.component(5)),
        }
    }

    fn family_name(&self, rep: &Repetition, index: usize) -> Option<FamilyName> {
        let name = FamilyName {
            surname: self.leaf(DataType::St, rep.subcomponent(index, 1)),
            own_surname_prefix: self.leaf(DataType::St, rep.subcomponent(index, 2)),
            own_surname: self.leaf(DataType::St, rep.subcomponent(index, 3)),
        };
        if name == FamilyName::default() {
            None
        } else {
            Some(name)
        }
    }

    fn xpn(&self, rep: &Repetition) -> Xpn {
        Xpn {
            family_name: self.family_name(rep, 1),
            given_name: self.leaf(DataType::St, rep.component(2)),
            second_names: self.leaf(DataType::St, rep.component(3)),
            suffix: self.leaf(DataType::St, rep.component(4)),
            prefix: self.leaf(DataType::St, rep.component(5)),
            degree: self.leaf(DataType::Is, rep.component(6)),
            name_type_code: self.leaf(DataType::Id, rep.component(7)),
        }
    }

    fn ts(&self, rep: &Repetition) -> Ts {
        Ts {
            time: self.leaf(DataType::Dtm, rep.component(1)),
            degree_of_precision: self.leaf(DataType::Id, rep.component(2)),
        }
    }

    fn xad(&self, rep: &Repetition) -> Xad {
        let sad = Sad {
            street_or_mailing_address: self.leaf(DataType::St, rep.subcomponent(1, 1)),
            street_name: self.leaf(DataType::St, rep.subcomponent(1, 2)),
            dwelling_number: self.leaf(DataType::St, rep.subcomponent(1, 3)),
        };
        Xad {
            street_address: (sad != Sad::default()).then_some(sad),
            other_designation: self.leaf(DataType::St, rep.component(2)),
            city: self.leaf(DataType::St, rep.component(3)),
            state_or_province: self.leaf(DataType::St, rep.component(4)),
            zip_or_postal_code: self.leaf(DataType::St, rep.component(5)),
            country: self.leaf(DataType::Id, rep.component(6)),
            address_type: self.leaf(DataType::Id, rep.component(7)),
            other_geographic_designation: self.leaf(DataType::St, rep.component(8)),
        }
    }

    fn xtn(&self, rep: &Repetition) -> Xtn {
        Xtn {
            telephone_number: self.leaf(DataType::St, rep.component(1)),
            telecommunication_use_code: self.leaf(DataType::Id, rep.component(2)),
            telecommunication_equipment_type: self.leaf(DataType::Id, rep.component(3)),
            email_address: self.leaf(DataType::St, rep.component(4)),
            country_code: self.leaf(DataType::Nm, rep.component(5)),
            area_city_code: self.leaf(DataType::Nm, rep.component(6)),
            local_number: self.leaf(DataType::Nm, rep.component(7)),
            extension: self.leaf(DataType::Nm, rep.component(8)),
            any_text: self.leaf(DataType::St, rep.component(9)),
            extension_prefix: self.leaf(DataType::St, rep.component(10)),
            speed_dial_code: self.leaf(DataType::St, rep.component(11)),
            unformatted_telephone_number: self.leaf(DataType::St, rep.component(12)),
        }
    }

    fn ei(&self, rep: &Repetition) -> Ei {
        Ei {
            entity_identifier: self.leaf(DataType::St, rep.component(1)),
            namespace_id: self.leaf(DataType::Is, rep.component(2)),
            universal_id: self.leaf(DataType::St, rep.component(3)),
            universal_id_type: self.leaf(DataType::Id, rep.component(4)),
        }
    }

    fn ce(&self, rep: &Repetition) -> Ce {
        Ce {
            identifier: self.leaf(DataType::St, rep.component(1)),
            text: self.leaf(DataType::St, rep.component(2)),
            name_of_coding_system: self.leaf(DataType::Id, rep.component(3)),
        }
    }

    fn xcn(&self, rep: &Repetition) -> Xcn {
        Xcn {
            id_number: self.leaf(DataType::St, rep.component(1)),
            family_name: self.family_name(rep, 2),
            given_name: self.leaf(DataType::St, rep.component(3)),
        }
    }

    fn ndl(&self, rep: &Repetition) -> Ndl {
        let cnn = Cnn {
            id_number: self.leaf(DataType::St, rep.subcomponent(1, 1)),
            family_name: self.leaf(DataType::St, rep.subcomponent(1, 2)),
            given_name: self.leaf(DataType::St, rep.subcomponent(1, 3)),
        };
        Ndl {
            name: (cnn != Cnn::default()).then_some(cnn),
            start_date_time: self.leaf(DataType::Dtm, rep.component(2)),
            end_date_time: self.leaf(DataType::Dtm, rep.component(3)),
        }
    }

    fn ed(&self, rep: &Repetition) -> Ed {
        Ed {
            source_application: self.leaf(DataType::St, rep.component(1)),
            type_of_data: self.leaf(DataType::Id, rep.component(2)),
            data_subtype: self.leaf(DataType::Id, rep.component(3)),
            encoding: self.leaf(DataType::Id, rep.component(4)),
            data: self.leaf(DataType::Tx, rep.component(5)),
        }
    }

    /// Type one OBX-5 repetition according to the OBX-2 value type code.
    fn observation_value(&self, value_type: &str, rep: &Repetition) -> FieldValue {
        match value_type {
            "ED" => FieldValue::EncapsulatedData(self.ed(rep)),
            "XTN" => FieldValue::PhoneNumber(self.xtn(rep)),
            "XPN" => FieldValue::Name(self.xpn(rep)),
            "XAD" => FieldValue::Address(self.xad(rep)),
            code => match DataType::from_code(code) {
                DataType::Dtm | DataType::Dt => FieldValue::Timestamp(self.ts(rep)),
                // Free text keeps component separators verbatim.
                data_type if data_type.is_text() => FieldValue::Simple(SimpleValue::new(
                    data_type,
                    rep.raw.to_vec(),
                    self.character_encoding,
                )),
                data_type => FieldValue::Simple(SimpleValue::new(
                    data_type,
                    rep.component(1).to_vec(),
                    self.character_encoding,
                )),
            },
        }
    }
}

fn read_segment(line: &[u8], delimiters: &Delimiters, character_encoding: &str) -> Segment {
    let fields: Vec<&[u8]> = line.split(|b| *b == delimiters.field).collect();
    let name = String::from_utf8_lossy(fields.first().copied().unwrap_or_default()).into_owned();
    let reader = FieldReader {
        fields,
        delimiters,
        character_encoding,
    };

    match name.as_str() {
        "PID" => Segment::Pid(read_pid(&reader)),
        "PV1" => Segment::Pv1(read_pv1(&reader)),
        "OBR" => Segment::Obr(read_obr(&reader)),
        "OBX" => Segment::Obx(read_obx(&reader)),
        _ => Segment::Other(name),
    }
}

fn read_pid(reader: &FieldReader) -> PidSegment {
    PidSegment {
        set_id: reader.simple(1, DataType::Si),
        patient_identifier_list: reader.repetitions(3).iter().map(|r| reader.cx(r)).collect(),
        patient_name: reader.repetitions(5).iter().map(|r| reader.xpn(r)).collect(),
        datetime_of_birth: reader.first(7).map(|r| reader.ts(&r)),
        administrative_sex: reader.simple(8, DataType::Is),
        patient_address: reader.repetitions(11).iter().map(|r| reader.xad(r)).collect(),
        phone_number_home: reader.repetitions(13).iter().map(|r| reader.xtn(r)).collect(),
    }
}

fn read_pv1(reader: &FieldReader) -> Pv1Segment {
    Pv1Segment {
        set_id: reader.simple(1, DataType::Si),
        patient_class: reader.simple(2, DataType::Is),
        visit_number: reader.first(19).map(|r| reader.cx(&r)),
    }
}

fn read_obr(reader: &FieldReader) -> ObrSegment {
    ObrSegment {
        set_id: reader.simple(1, DataType::Si),
        placer_order_number: reader.first(2).map(|r| reader.ei(&r)),
        filler_order_number: reader.first(3).map(|r| reader.ei(&r)),
        universal_service_identifier: reader.first(4).map(|r| reader.ce(&r)),
        observation_datetime: reader.first(7).map(|r| reader.ts(&r)),
        ordering_provider: reader.repetitions(16).iter().map(|r| reader.xcn(r)).collect(),
        result_status: reader.simple(25, DataType::Id),
        principal_result_interpreter: reader.first(32).map(|r| reader.ndl(&r)),
    }
}

fn read_obx(reader: &FieldReader) -> ObxSegment {
    let value_type = reader.simple(2, DataType::Id);
    let code = value_type
        .as_ref()
        .map(|v| String::from_utf8_lossy(v.raw()).trim().to_ascii_uppercase())
        .unwrap_or_else(|| "ST".to_string());

    ObxSegment {
        set_id: reader.simple(1, DataType::Si),
        value_type,
        observation_identifier: reader.first(3).map(|r| reader.ce(&r)),
        observation_sub_id: reader.simple(4, DataType::St),
        observation_value: reader
            .repetitions(5)
            .iter()
            .map(|r| reader.observation_value(&code, r))
            .collect(),
        units: reader.first(6).map(|r| reader.ce(&r)),
        observation_result_status: reader.simple(11, DataType::Id),
    }
}
