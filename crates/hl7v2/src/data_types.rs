//! HL7v2 data types.
//!
//! Every leaf of a field is a [`SimpleValue`]: raw bytes tagged with the HL7 data type they were
//! declared as and the character encoding of the message they came from. Composite data types
//! are plain structs of optional leaves, and [`FieldValue`] is the sum type over the kinds an
//! OBX observation value may take.

/// HL7 data type of a primitive value.
///
/// Only the distinction between free-text kinds (`ST`, `TX`, `FT`) and everything else matters
/// downstream, so unrecognised codes collapse into [`DataType::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    /// String data.
    St,
    /// Text data (may carry escape sequences and repeat as lines).
    Tx,
    /// Formatted text.
    Ft,
    /// Coded value from an HL7 table.
    Id,
    /// Coded value from a user-defined table.
    Is,
    /// Numeric.
    Nm,
    /// Sequence id.
    Si,
    /// Date.
    Dt,
    /// Date/time.
    Dtm,
    /// Coded element (first component only).
    Ce,
    Other,
}

impl DataType {
    /// Parse an OBX-2 style data type code. Unknown codes map to [`DataType::Other`].
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "ST" => DataType::St,
            "TX" => DataType::Tx,
            "FT" => DataType::Ft,
            "ID" => DataType::Id,
            "IS" => DataType::Is,
            "NM" => DataType::Nm,
            "SI" => DataType::Si,
            "DT" => DataType::Dt,
            "DTM" | "TS" => DataType::Dtm,
            "CE" | "CWE" | "CNE" => DataType::Ce,
            _ => DataType::Other,
        }
    }

    /// True for the free-text kinds that may contain escape sequences.
    pub fn is_text(self) -> bool {
        matches!(self, DataType::St | DataType::Tx | DataType::Ft)
    }
}

/// A primitive HL7 value: raw bytes plus declared type and character encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleValue {
    data_type: DataType,
    raw: Vec<u8>,
    character_encoding: String,
}

impl SimpleValue {
    pub fn new(
        data_type: DataType,
        raw: impl Into<Vec<u8>>,
        character_encoding: impl Into<String>,
    ) -> Self {
        Self {
            data_type,
            raw: raw.into(),
            character_encoding: character_encoding.into(),
        }
    }

    /// True when the value carries at least one byte.
    pub fn has_value(&self) -> bool {
        !self.raw.is_empty()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The undecoded bytes, exactly as they appeared in the message.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Character encoding label the raw bytes are in (MSH-18 of the source message).
    pub fn character_encoding(&self) -> &str {
        &self.character_encoding
    }
}

/// Returns the value only if it is present and non-empty.
pub(crate) fn present(value: Option<SimpleValue>) -> Option<SimpleValue> {
    value.filter(SimpleValue::has_value)
}

/// TS: time stamp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ts {
    pub time: Option<SimpleValue>,
    pub degree_of_precision: Option<SimpleValue>,
}

/// ED: encapsulated data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ed {
    pub source_application: Option<SimpleValue>,
    pub type_of_data: Option<SimpleValue>,
    pub data_subtype: Option<SimpleValue>,
    pub encoding: Option<SimpleValue>,
    pub data: Option<SimpleValue>,
}

/// XTN: extended telecommunication number.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Xtn {
    pub telephone_number: Option<SimpleValue>,
    pub telecommunication_use_code: Option<SimpleValue>,
    pub telecommunication_equipment_type: Option<SimpleValue>,
    pub email_address: Option<SimpleValue>,
    pub country_code: Option<SimpleValue>,
    pub area_city_code: Option<SimpleValue>,
    pub local_number: Option<SimpleValue>,
    pub extension: Option<SimpleValue>,
    pub any_text: Option<SimpleValue>,
    pub extension_prefix: Option<SimpleValue>,
    pub speed_dial_code: Option<SimpleValue>,
    pub unformatted_telephone_number: Option<SimpleValue>,
}

/// FN: family name (first component of XPN and XCN).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FamilyName {
    pub surname: Option<SimpleValue>,
    pub own_surname_prefix: Option<SimpleValue>,
    pub own_surname: Option<SimpleValue>,
}

/// XPN: extended person name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Xpn {
    pub family_name: Option<FamilyName>,
    pub given_name: Option<SimpleValue>,
    pub second_names: Option<SimpleValue>,
    pub suffix: Option<SimpleValue>,
    pub prefix: Option<SimpleValue>,
    pub degree: Option<SimpleValue>,
    pub name_type_code: Option<SimpleValue>,
}

/// SAD: street address (first component of XAD).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sad {
    pub street_or_mailing_address: Option<SimpleValue>,
    pub street_name: Option<SimpleValue>,
    pub dwelling_number: Option<SimpleValue>,
}

/// XAD: extended address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Xad {
    pub street_address: Option<Sad>,
    pub other_designation: Option<SimpleValue>,
    pub city: Option<SimpleValue>,
    pub state_or_province: Option<SimpleValue>,
    pub zip_or_postal_code: Option<SimpleValue>,
    pub country: Option<SimpleValue>,
    pub address_type: Option<SimpleValue>,
    pub other_geographic_designation: Option<SimpleValue>,
}

/// CX: extended composite id with check digit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cx {
    pub id_number: Option<SimpleValue>,
    pub check_digit: Option<SimpleValue>,
    pub check_digit_scheme: Option<SimpleValue>,
    pub assigning_authority: Option<SimpleValue>,
    pub identifier_type_code: Option<SimpleValue>,
}

/// CE: coded element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ce {
    pub identifier: Option<SimpleValue>,
    pub text: Option<SimpleValue>,
    pub name_of_coding_system: Option<SimpleValue>,
}

/// EI: entity identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ei {
    pub entity_identifier: Option<SimpleValue>,
    pub namespace_id: Option<SimpleValue>,
    pub universal_id: Option<SimpleValue>,
    pub universal_id_type: Option<SimpleValue>,
}

/// XCN: extended composite id number and name for persons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Xcn {
    pub id_number: Option<SimpleValue>,
    pub family_name: Option<FamilyName>,
    pub given_name: Option<SimpleValue>,
}

/// CNN: composite id number and name (first component of NDL).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cnn {
    pub id_number: Option<SimpleValue>,
    pub family_name: Option<SimpleValue>,
    pub given_name: Option<SimpleValue>,
}

/// NDL: name with date and location.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ndl {
    pub name: Option<Cnn>,
    pub start_date_time: Option<SimpleValue>,
    pub end_date_time: Option<SimpleValue>,
}

/// The kinds an observation value (OBX-5) can take.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Simple(SimpleValue),
    Timestamp(Ts),
    EncapsulatedData(Ed),
    PhoneNumber(Xtn),
    Name(Xpn),
    Address(Xad),
}

impl FieldValue {
    /// The primitive carrying this value's principal content, if there is one.
    ///
    /// Composites resolve to their most significant leaf: the time of a TS, the data of an ED,
    /// the given name of an XPN and so on.
    pub fn primary(&self) -> Option<&SimpleValue> {
        match self {
            FieldValue::Simple(value) => Some(value),
            FieldValue::Timestamp(ts) => ts.time.as_ref(),
            FieldValue::EncapsulatedData(ed) => ed.data.as_ref(),
            FieldValue::PhoneNumber(xtn) => xtn
                .telephone_number
                .as_ref()
                .or(xtn.unformatted_telephone_number.as_ref()),
            FieldValue::Name(xpn) => xpn
                .family_name
                .as_ref()
                .and_then(|name| name.surname.as_ref())
                .or(xpn.given_name.as_ref()),
            FieldValue::Address(xad) => xad
                .street_address
                .as_ref()
                .and_then(|sad| sad.street_or_mailing_address.as_ref())
                .or(xad.city.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_codes_are_case_insensitive() {
        assert_eq!(DataType::from_code("tx"), DataType::Tx);
        assert_eq!(DataType::from_code(" FT "), DataType::Ft);
        assert_eq!(DataType::from_code("TS"), DataType::Dtm);
        assert_eq!(DataType::from_code("CWE"), DataType::Ce);
        assert_eq!(DataType::from_code("ZZ"), DataType::Other);
    }

    #[test]
    fn only_free_text_kinds_are_text() {
        assert!(DataType::St.is_text());
        assert!(DataType::Tx.is_text());
        assert!(DataType::Ft.is_text());
        assert!(!DataType::Id.is_text());
        assert!(!DataType::Nm.is_text());
    }

    #[test]
    fn empty_value_has_no_value() {
        let value = SimpleValue::new(DataType::St, Vec::new(), "ASCII");
        assert!(!value.has_value());
        assert!(present(Some(value)).is_none());
    }

    #[test]
    fn primary_of_timestamp_is_time() {
        let time = SimpleValue::new(DataType::Dtm, b"20200101".to_vec(), "ASCII");
        let value = FieldValue::Timestamp(Ts {
            time: Some(time.clone()),
            degree_of_precision: None,
        });
        assert_eq!(value.primary(), Some(&time));
    }
}
