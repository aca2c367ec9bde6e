//! Typed segments.
//!
//! Only the fields read by the observation conversion are modelled. Repeating fields are
//! `Vec`s (empty when absent); non-repeating fields are `Option`s.

use crate::data_types::{Ce, Cx, Ei, FieldValue, Ndl, SimpleValue, Ts, Xad, Xcn, Xpn, Xtn};

/// PID: patient identification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PidSegment {
    /// PID-1
    pub set_id: Option<SimpleValue>,
    /// PID-3
    pub patient_identifier_list: Vec<Cx>,
    /// PID-5
    pub patient_name: Vec<Xpn>,
    /// PID-7
    pub datetime_of_birth: Option<Ts>,
    /// PID-8
    pub administrative_sex: Option<SimpleValue>,
    /// PID-11
    pub patient_address: Vec<Xad>,
    /// PID-13
    pub phone_number_home: Vec<Xtn>,
}

/// PV1: patient visit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pv1Segment {
    /// PV1-1
    pub set_id: Option<SimpleValue>,
    /// PV1-2
    pub patient_class: Option<SimpleValue>,
    /// PV1-19
    pub visit_number: Option<Cx>,
}

/// OBR: observation request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObrSegment {
    /// OBR-1
    pub set_id: Option<SimpleValue>,
    /// OBR-2
    pub placer_order_number: Option<Ei>,
    /// OBR-3
    pub filler_order_number: Option<Ei>,
    /// OBR-4
    pub universal_service_identifier: Option<Ce>,
    /// OBR-7
    pub observation_datetime: Option<Ts>,
    /// OBR-16
    pub ordering_provider: Vec<Xcn>,
    /// OBR-25
    pub result_status: Option<SimpleValue>,
    /// OBR-32
    pub principal_result_interpreter: Option<Ndl>,
}

/// OBX: observation/result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObxSegment {
    /// OBX-1
    pub set_id: Option<SimpleValue>,
    /// OBX-2
    pub value_type: Option<SimpleValue>,
    /// OBX-3
    pub observation_identifier: Option<Ce>,
    /// OBX-4
    pub observation_sub_id: Option<SimpleValue>,
    /// OBX-5, typed according to OBX-2.
    pub observation_value: Vec<FieldValue>,
    /// OBX-6
    pub units: Option<Ce>,
    /// OBX-11
    pub observation_result_status: Option<SimpleValue>,
}

/// A segment of an observation message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Pid(PidSegment),
    Pv1(Pv1Segment),
    Obr(ObrSegment),
    Obx(ObxSegment),
    /// Any segment this crate does not model, kept by its three-letter name.
    Other(String),
}

impl Segment {
    /// The three-letter segment name.
    pub fn name(&self) -> &str {
        match self {
            Segment::Pid(_) => "PID",
            Segment::Pv1(_) => "PV1",
            Segment::Obr(_) => "OBR",
            Segment::Obx(_) => "OBX",
            Segment::Other(name) => name,
        }
    }
}
