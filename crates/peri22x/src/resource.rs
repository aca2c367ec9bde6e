//! The resource: sections plus attachments.

use crate::attachment::Attachment;
use crate::section::{Section, SectionType};
use crate::{xml, Peri22xResult};

/// A Peri22x resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    resource_type: String,
    sections: Vec<Section>,
    attachments: Vec<Attachment>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            sections: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The first section of the given type.
    pub fn section(&self, section_type: SectionType) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.section_type() == section_type)
    }

    /// All sections of the given type, in insertion order.
    pub fn sections_of(&self, section_type: SectionType) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(move |section| section.section_type() == section_type)
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Renders the resource as an indented, UTF-8 XML document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Peri22xError`] if the XML writer fails.
    pub fn to_xml(&self) -> Peri22xResult<String> {
        xml::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_looked_up_by_type() {
        let mut resource = Resource::new("hub/dossier");
        let mut first = Section::new(SectionType::Echo);
        first.add_value("peri22-dataelement-50021", "192");
        let mut second = Section::new(SectionType::Echo);
        second.add_value("peri22-dataelement-50021", "199");
        resource.add_section(first);
        resource.add_section(second);

        assert_eq!(resource.resource_type(), "hub/dossier");
        assert_eq!(
            resource
                .section(SectionType::Echo)
                .and_then(|s| s.value("peri22-dataelement-50021")),
            Some("192")
        );
        assert_eq!(resource.sections_of(SectionType::Echo).count(), 2);
        assert!(resource.section(SectionType::Intake).is_none());
    }

    #[test]
    fn attachments_keep_order() {
        let mut resource = Resource::new("hub/dossier");
        resource.add_attachment(Attachment::new(1, "application/pdf", "rapport-1.pdf"));
        resource.add_attachment(Attachment::new(2, "application/pdf", "rapport-2.pdf"));

        let ids: Vec<u32> = resource.attachments().iter().map(Attachment::id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
