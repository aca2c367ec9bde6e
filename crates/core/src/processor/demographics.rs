//! Client section and contact metadata from the PID segment.

use super::{add_value, ObservationProcessor};
use crate::constants::*;
use crate::dossier::Dossier;
use crate::DossierResult;
use hl7v2::{Cx, PidSegment, Xad, Xpn, Xtn};
use peri22x::{Section, SectionType};

impl ObservationProcessor {
    pub(super) fn add_client_section(
        &self,
        dossier: &mut Dossier,
        pid: &PidSegment,
    ) -> DossierResult<()> {
        let mut section = Section::new(SectionType::Client);
        section.set_create_stamp(self.now());
        if let Some(id) = self.optional_text(pid.set_id.as_ref())? {
            section.set_id(id);
        }

        for identifier in &pid.patient_identifier_list {
            self.add_identifier(&mut section, identifier)?;
        }

        if let Some(time) = pid.datetime_of_birth.as_ref().and_then(|ts| ts.time.as_ref()) {
            if time.has_value() {
                add_value(&mut section, CONCEPT_BIRTH_DATE, Some(self.date_value(time)?));
            }
        }

        for name in &pid.patient_name {
            self.add_name(&mut section, name)?;
        }

        for address in &pid.patient_address {
            self.add_address(&mut section, address)?;
        }

        for contact in &pid.phone_number_home {
            self.add_contact_details(dossier, contact)?;
        }

        if section.has_values() {
            dossier.resource_mut().add_section(section);
        } else {
            tracing::debug!("PID segment yielded no client values");
        }
        Ok(())
    }

    fn add_identifier(&self, section: &mut Section, identifier: &Cx) -> DossierResult<()> {
        let concept = match self
            .optional_text(identifier.identifier_type_code.as_ref())?
            .as_deref()
        {
            Some("NNNLD") => CONCEPT_NATIONAL_IDENTIFIER,
            Some("PI") => CONCEPT_LOCAL_IDENTIFIER,
            other => {
                tracing::debug!(identifier_type = ?other, "ignoring patient identifier");
                return Ok(());
            }
        };
        add_value(section, concept, self.optional_text(identifier.id_number.as_ref())?);
        Ok(())
    }

    fn add_name(&self, section: &mut Section, name: &Xpn) -> DossierResult<()> {
        match self.optional_text(name.name_type_code.as_ref())?.as_deref() {
            None | Some("L") => {
                let forenames = [name.given_name.as_ref(), name.second_names.as_ref()]
                    .into_iter()
                    .map(|part| self.optional_text(part))
                    .collect::<DossierResult<Vec<_>>>()?
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>();
                if !forenames.is_empty() {
                    section.add_value(CONCEPT_FORENAMES, forenames.join(" "));
                }

                let surname = name
                    .family_name
                    .as_ref()
                    .and_then(|family| family.surname.as_ref());
                add_value(section, CONCEPT_SURNAME, self.optional_text(surname)?);
            }
            Some("N") => {
                add_value(
                    section,
                    CONCEPT_NICKNAME,
                    self.optional_text(name.given_name.as_ref())?,
                );
            }
            Some(other) => tracing::debug!(name_type = other, "ignoring patient name"),
        }
        Ok(())
    }

    fn add_address(&self, section: &mut Section, address: &Xad) -> DossierResult<()> {
        if let Some(street) = &address.street_address {
            match self.optional_text(street.street_or_mailing_address.as_ref())? {
                Some(line) => section.add_value(CONCEPT_STREET, line),
                None => {
                    add_value(
                        section,
                        CONCEPT_STREET,
                        self.optional_text(street.street_name.as_ref())?,
                    );
                    add_value(
                        section,
                        CONCEPT_HOUSE_NUMBER,
                        self.optional_text(street.dwelling_number.as_ref())?,
                    );
                }
            }
        }

        let fields = [
            (CONCEPT_MUNICIPALITY, address.other_designation.as_ref()),
            (CONCEPT_CITY, address.city.as_ref()),
            (CONCEPT_POSTCODE, address.zip_or_postal_code.as_ref()),
            (CONCEPT_COUNTRY, address.country.as_ref()),
            (CONCEPT_ADDRESS_TYPE, address.address_type.as_ref()),
        ];
        for (concept, value) in fields {
            add_value(section, concept, self.optional_text(value)?);
        }
        Ok(())
    }

    /// Phone numbers and email addresses go to dossier metadata, keyed by equipment type.
    fn add_contact_details(&self, dossier: &mut Dossier, contact: &Xtn) -> DossierResult<()> {
        let Some(equipment) =
            self.optional_text(contact.telecommunication_equipment_type.as_ref())?
        else {
            return Ok(());
        };

        match equipment.as_str() {
            "CP" => {
                if let Some(number) = self.phone_number(contact)? {
                    dossier.add_metadata(METADATA_CLIENT_MOBILE_PHONE_NUMBER, number);
                }
            }
            "PH" => {
                if let Some(number) = self.phone_number(contact)? {
                    dossier.add_metadata(METADATA_CLIENT_PHONE_NUMBER, number);
                }
            }
            "X.400" => {
                let use_code =
                    self.optional_text(contact.telecommunication_use_code.as_ref())?;
                if use_code.as_deref() == Some("NET") {
                    if let Some(email) = self.optional_text(contact.email_address.as_ref())? {
                        dossier.add_metadata(METADATA_CLIENT_EMAIL_ADDRESS, email);
                    }
                }
            }
            other => tracing::debug!(equipment_type = other, "ignoring contact details"),
        }
        Ok(())
    }

    /// Composes a number from its parts, falling back to the unformatted and then the plain
    /// telephone number.
    fn phone_number(&self, contact: &Xtn) -> DossierResult<Option<String>> {
        let Some(local) = self.optional_text(contact.local_number.as_ref())? else {
            return match self.optional_text(contact.unformatted_telephone_number.as_ref())? {
                Some(number) => Ok(Some(number)),
                None => self.optional_text(contact.telephone_number.as_ref()),
            };
        };

        let country = self.optional_text(contact.country_code.as_ref())?;
        let mut area = self.optional_text(contact.area_city_code.as_ref())?;
        if country.is_some() {
            area = area
                .map(|code| code.strip_prefix('0').unwrap_or(&code).to_string())
                .filter(|code| !code.is_empty());
        }

        let mut number = match (country, area) {
            (Some(country), Some(area)) => format!("{country} {area}{local}"),
            (Some(country), None) => format!("{country} {local}"),
            (None, Some(area)) => format!("{area}{local}"),
            (None, None) => local,
        };

        if let Some(extension) = self.optional_text(contact.extension.as_ref())? {
            match self.optional_text(contact.extension_prefix.as_ref())? {
                Some(prefix) => number.push_str(&format!(" {prefix}{extension}")),
                None => number.push_str(&format!(" {extension}")),
            }
        }
        Ok(Some(number))
    }
}
