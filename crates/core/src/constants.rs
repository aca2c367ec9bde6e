//! Constants used throughout the conversion core.
//!
//! Concept ids, metadata keys and defaults live here so the processor, the dossier and the
//! command line agree on them.

/// Resource type of a dossier.
pub const RESOURCE_TYPE: &str = "hub/dossier";

/// Observation identifier whose values are embedded files.
pub const EMBEDDED_FILE_OBSERVATION: &str = "rapport";

// ============================================================================
// Dossier metadata keys
// ============================================================================

pub const METADATA_ORDER_NUMBER: &str = "order_number";
pub const METADATA_FILLER_APPLICATION: &str = "filler_application";
pub const METADATA_OBSERVATION_TIME: &str = "observation_time";
pub const METADATA_RESULT_STATUS: &str = "result_status";
pub const METADATA_REFERRING_PRACTICE: &str = "referring_practice";
pub const METADATA_CLIENT_MOBILE_PHONE_NUMBER: &str = "client_mobile_phone_number";
pub const METADATA_CLIENT_PHONE_NUMBER: &str = "client_phone_number";
pub const METADATA_CLIENT_EMAIL_ADDRESS: &str = "client_email_address";

// ============================================================================
// Client concepts
// ============================================================================

/// National person identifier (PID-3 type `NNNLD`).
pub const CONCEPT_NATIONAL_IDENTIFIER: &str = "peri22-dataelement-10030";
/// Local person identifier (PID-3 type `PI`).
pub const CONCEPT_LOCAL_IDENTIFIER: &str = "peri22-dataelement-10031";
pub const CONCEPT_BIRTH_DATE: &str = "peri22-dataelement-10040";
/// Given and second names of the legal name.
pub const CONCEPT_FORENAMES: &str = "peri22-dataelement-10042";
pub const CONCEPT_SURNAME: &str = "peri22-dataelement-82361";
pub const CONCEPT_NICKNAME: &str = "peri22-dataelement-82360";
pub const CONCEPT_STREET: &str = "peri22-dataelement-10301";
pub const CONCEPT_HOUSE_NUMBER: &str = "peri22-dataelement-10302";
pub const CONCEPT_POSTCODE: &str = "peri22-dataelement-10304";
pub const CONCEPT_CITY: &str = "peri22-dataelement-10305";
pub const CONCEPT_MUNICIPALITY: &str = "peri22-dataelement-10306";
pub const CONCEPT_COUNTRY: &str = "peri22-dataelement-10307";
pub const CONCEPT_ADDRESS_TYPE: &str = "peri22-dataelement-10308";

// ============================================================================
// Report concepts
// ============================================================================

pub const CONCEPT_EXAMINATION_DATE: &str = "peri22-dataelement-50020";
pub const CONCEPT_RESULT_INTERPRETER: &str = "peri22-dataelement-80754";
pub const CONCEPT_GRAVIDITY: &str = "peri22-dataelement-20010";
pub const CONCEPT_PARITY: &str = "peri22-dataelement-20153";
pub const CONCEPT_DUE_DATE: &str = "peri22-dataelement-20030";
/// Gestational age at the examination date, in days.
pub const CONCEPT_GESTATIONAL_AGE: &str = "peri22-dataelement-50021";
/// Estimated fetal weight, in grams.
pub const CONCEPT_ESTIMATED_WEIGHT: &str = "peri22-dataelement-82340";
pub const CONCEPT_HEAD_CIRCUMFERENCE: &str = "peri22-dataelement-60060";
pub const CONCEPT_HEAD_CIRCUMFERENCE_PERCENTILE: &str = "peri22-dataelement-60061";
pub const CONCEPT_FEMUR_LENGTH: &str = "peri22-dataelement-60100";
pub const CONCEPT_FEMUR_LENGTH_PERCENTILE: &str = "peri22-dataelement-60101";
pub const CONCEPT_ABDOMINAL_CIRCUMFERENCE: &str = "peri22-dataelement-60080";
pub const CONCEPT_ABDOMINAL_CIRCUMFERENCE_PERCENTILE: &str = "peri22-dataelement-60081";
pub const CONCEPT_PLACENTA_LOCATION: &str = "peri22-dataelement-80946";
pub const CONCEPT_ECHO_DIAGNOSIS: &str = "peri22x-echo-diagnose";
pub const CONCEPT_ECHO_CONCLUSION: &str = "peri22x-echo-conclusie";
