//! XML rendering of a resource.

use crate::resource::Resource;
use crate::section::{Section, Value, SECTION_TIMESTAMP_FORMAT};
use crate::Peri22xResult;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const CDATA_END: &str = "]]>";

pub(crate) fn render(resource: &Resource) -> Peri22xResult<String> {
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("resource");
    root.push_attribute(("type", resource.resource_type()));
    xml.write_event(Event::Start(root))?;

    for section in resource.sections() {
        write_section(&mut xml, section)?;
    }

    if !resource.attachments().is_empty() {
        xml.write_event(Event::Start(BytesStart::new("attachments")))?;
        for attachment in resource.attachments() {
            let id = attachment.id().to_string();
            let mut element = BytesStart::new("attachment");
            element.push_attribute(("id", id.as_str()));
            element.push_attribute(("mimetype", attachment.mime_type()));
            element.push_attribute(("filename", attachment.filename()));
            xml.write_event(Event::Empty(element))?;
        }
        xml.write_event(Event::End(BytesEnd::new("attachments")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("resource")))?;
    Ok(String::from_utf8(xml.into_inner())?)
}

fn write_section(xml: &mut Writer<Vec<u8>>, section: &Section) -> Peri22xResult<()> {
    let create_stamp = section
        .create_stamp()
        .map(|stamp| stamp.format(SECTION_TIMESTAMP_FORMAT).to_string());
    let effect_stamp = section.effect_stamp().map(|stamp| {
        let local = stamp.format(SECTION_TIMESTAMP_FORMAT);
        match section.effect_offset() {
            Some(offset) => format!("{local} {offset}"),
            None => local.to_string(),
        }
    });

    let mut element = BytesStart::new("section");
    element.push_attribute(("type", section.section_type().as_str()));
    if let Some(stamp) = &create_stamp {
        element.push_attribute(("createstamp", stamp.as_str()));
    }
    if let Some(stamp) = &effect_stamp {
        element.push_attribute(("effectstamp", stamp.as_str()));
    }
    if let Some(id) = section.id() {
        element.push_attribute(("id", id));
    }
    xml.write_event(Event::Start(element))?;

    for value in section.values() {
        write_value(xml, value)?;
    }

    xml.write_event(Event::End(BytesEnd::new("section")))?;
    Ok(())
}

fn write_value(xml: &mut Writer<Vec<u8>>, value: &Value) -> Peri22xResult<()> {
    let mut element = BytesStart::new("value");
    element.push_attribute(("concept", value.concept()));
    if let Some(repeat) = value.repeat() {
        element.push_attribute(("repeat", repeat));
    }
    xml.write_event(Event::Start(element))?;

    if value.is_cdata() {
        // A CDATA block cannot contain its own terminator; split it over adjacent blocks.
        let mut rest = value.value();
        while let Some(position) = rest.find(CDATA_END) {
            let (head, tail) = rest.split_at(position + 2);
            xml.write_event(Event::CData(BytesCData::new(head)))?;
            rest = tail;
        }
        xml.write_event(Event::CData(BytesCData::new(rest)))?;
    } else {
        xml.write_event(Event::Text(BytesText::new(value.value())))?;
    }

    xml.write_event(Event::End(BytesEnd::new("value")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Attachment, Resource, Section, SectionType};
    use chrono::NaiveDate;

    fn stamp(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 1, 20)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn renders_sections_values_and_attachments() {
        let mut section = Section::new(SectionType::Intake);
        section.set_create_stamp(stamp(10, 10, 10));
        section.set_effect_stamp(stamp(9, 30, 0));
        section.add_value("peri22-dataelement-20010", "1");
        section.add_repeated_value("peri22-dataelement-60060", "180", "2");

        let mut resource = Resource::new("hub/dossier");
        resource.add_section(section);
        resource.add_attachment(Attachment::new(1, "application/pdf", "rapport.pdf"));

        let xml = resource.to_xml().unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<resource type="hub/dossier">"#));
        assert!(xml.contains(
            r#"<section type="intake" createstamp="2016-01-20 10:10:10" effectstamp="2016-01-20 09:30:00">"#
        ));
        assert!(xml.contains(r#"<value concept="peri22-dataelement-20010">1</value>"#));
        assert!(xml.contains(r#"<value concept="peri22-dataelement-60060" repeat="2">180</value>"#));
        assert!(xml.contains(
            r#"<attachment id="1" mimetype="application/pdf" filename="rapport.pdf"/>"#
        ));
        assert!(xml.trim_end().ends_with("</resource>"));
    }

    #[test]
    fn effect_stamp_keeps_its_offset() {
        let mut section = Section::new(SectionType::Echo);
        section.set_effect_stamp(stamp(9, 30, 0));
        section.set_effect_offset(chrono::FixedOffset::east_opt(3600).unwrap());
        section.add_value("peri22-dataelement-80946", "2016-01-20");

        let mut resource = Resource::new("hub/dossier");
        resource.add_section(section);
        let xml = resource.to_xml().unwrap();

        assert!(xml.contains(r#"<section type="echo" effectstamp="2016-01-20 09:30:00 +01:00">"#));
    }

    #[test]
    fn escapes_text_and_keeps_cdata_verbatim() {
        let mut section = Section::new(SectionType::Echo);
        section.set_id("1");
        section.add_value("peri22-dataelement-80946", "a < b & c");
        section.add_cdata_value("peri22x-echo-diagnose", "Line one\nLine <two>");

        let mut resource = Resource::new("hub/dossier");
        resource.add_section(section);
        let xml = resource.to_xml().unwrap();

        assert!(xml.contains(r#"<section type="echo" id="1">"#));
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(xml.contains("<![CDATA[Line one\nLine <two>]]>"));
        assert!(!xml.contains("<attachments>"));
    }

    #[test]
    fn splits_cdata_terminator() {
        let mut section = Section::new(SectionType::Echo);
        section.add_cdata_value("peri22x-echo-conclusie", "x]]>y");

        let mut resource = Resource::new("hub/dossier");
        resource.add_section(section);
        let xml = resource.to_xml().unwrap();

        assert!(xml.contains("<![CDATA[x]]]]><![CDATA[>y]]>"));
    }
}
