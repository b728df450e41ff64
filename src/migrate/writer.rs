//! SDK-style project XML writer
//!
//! Output has no XML declaration, two-space indentation and the platform's native line
//! endings.

use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;
use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use crate::project::{Choose, Import, ItemGroup, Property, PropertyGroup, Target, When, XmlElement, XmlNode};

use super::descriptor::{DescriptorItem, ProjectNode, SdkItemGroup, SdkProject, SdkPropertyGroup};

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Escape an attribute value. Apostrophes stay literal so MSBuild conditions read
/// naturally.
pub(crate) fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\r', "&#xD;")
        .replace('\n', "&#xA;")
}

/// Build a start tag whose attribute values are escaped with [`escape_attribute`].
pub(crate) fn start_tag<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escape_attribute(value).into_bytes()),
        });
    }
    start
}

/// `<name attr="..."/>`
pub(crate) fn write_empty<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
) -> Result<()> {
    writer.write_event(Event::Empty(start_tag(name, attributes)))?;
    Ok(())
}

/// `<name attr="...">text</name>`
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(start_tag(name, attributes)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write a document with a root element, converting to native line endings.
pub(crate) fn write_document(
    root: &str,
    attributes: &[(&str, &str)],
    body: impl FnOnce(&mut Writer<Vec<u8>>) -> Result<()>,
) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Start(start_tag(root, attributes)))?;
    body(&mut writer)?;
    writer.write_event(Event::End(BytesEnd::new(root)))?;

    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    if LINE_ENDING != "\n" {
        xml = xml.replace('\n', LINE_ENDING);
    }
    Ok(xml)
}

/// Render an SDK-style project.
pub fn write_project(project: &SdkProject) -> Result<String> {
    write_document("Project", &[("Sdk", project.sdk.as_str())], |writer| {
        for node in &project.nodes {
            match node {
                ProjectNode::PropertyGroup(group) => write_sdk_property_group(writer, group)?,
                ProjectNode::ItemGroup(group) => write_sdk_item_group(writer, group)?,
                ProjectNode::Choose(choose) => write_choose(writer, choose)?,
                ProjectNode::Import(import) => write_import(writer, import)?,
                ProjectNode::Target(target) => write_target(writer, target)?,
            }
        }
        Ok(())
    })
}

fn group_attributes<'a>(condition: &'a Option<String>, label: &'a Option<String>) -> Vec<(&'static str, &'a str)> {
    let mut attributes = Vec::new();
    if let Some(ref label) = label {
        attributes.push(("Label", label.as_str()));
    }
    if let Some(ref condition) = condition {
        attributes.push(("Condition", condition.as_str()));
    }
    attributes
}

fn write_properties<W: Write>(writer: &mut Writer<W>, properties: &[Property]) -> Result<()> {
    for property in properties {
        let attributes: Vec<(&str, &str)> = property
            .condition
            .as_deref()
            .map(|c| vec![("Condition", c)])
            .unwrap_or_default();
        if property.value.is_empty() {
            write_empty(writer, &property.name, &attributes)?;
        } else {
            write_text_element(writer, &property.name, &attributes, &property.value)?;
        }
    }
    Ok(())
}

fn write_sdk_property_group<W: Write>(writer: &mut Writer<W>, group: &SdkPropertyGroup) -> Result<()> {
    let attributes = group_attributes(&group.condition, &group.label);
    writer.write_event(Event::Start(start_tag("PropertyGroup", &attributes)))?;
    write_properties(writer, &group.properties)?;
    writer.write_event(Event::End(BytesEnd::new("PropertyGroup")))?;
    Ok(())
}

fn write_sdk_item_group<W: Write>(writer: &mut Writer<W>, group: &SdkItemGroup) -> Result<()> {
    let attributes = group_attributes(&group.condition, &group.label);
    writer.write_event(Event::Start(start_tag("ItemGroup", &attributes)))?;
    for item in &group.items {
        write_item(writer, item)?;
    }
    writer.write_event(Event::End(BytesEnd::new("ItemGroup")))?;
    Ok(())
}

pub(crate) fn write_item<W: Write>(writer: &mut Writer<W>, item: &DescriptorItem) -> Result<()> {
    let as_attributes = item.attribute_metadata();
    let is_attribute = |name: &str| as_attributes.iter().any(|a| a.eq_ignore_ascii_case(name));

    let mut attributes: Vec<(&str, &str)> = vec![(item.spec.attribute_name(), item.spec.value())];
    if let Some(ref exclude) = item.exclude {
        attributes.push(("Exclude", exclude.as_str()));
    }
    for (name, value) in item.metadata.iter().filter(|(n, _)| is_attribute(n)) {
        attributes.push((name.as_str(), value.as_str()));
    }
    if let Some(ref condition) = item.condition {
        attributes.push(("Condition", condition.as_str()));
    }

    let children: Vec<&(String, String)> = item.metadata.iter().filter(|(n, _)| !is_attribute(n)).collect();
    if children.is_empty() {
        return write_empty(writer, &item.item_type, &attributes);
    }

    writer.write_event(Event::Start(start_tag(&item.item_type, &attributes)))?;
    for (name, value) in children {
        write_text_element(writer, name, &[], value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(item.item_type.as_str())))?;
    Ok(())
}

fn write_legacy_property_group<W: Write>(writer: &mut Writer<W>, group: &PropertyGroup) -> Result<()> {
    let attributes = group_attributes(&group.condition, &group.label);
    writer.write_event(Event::Start(start_tag("PropertyGroup", &attributes)))?;
    write_properties(writer, &group.properties)?;
    writer.write_event(Event::End(BytesEnd::new("PropertyGroup")))?;
    Ok(())
}

fn write_legacy_item_group<W: Write>(writer: &mut Writer<W>, group: &ItemGroup) -> Result<()> {
    let attributes = group_attributes(&group.condition, &group.label);
    writer.write_event(Event::Start(start_tag("ItemGroup", &attributes)))?;
    for item in &group.items {
        let spec = match (&item.update, &item.remove) {
            (Some(update), _) => DescriptorItem::update(&item.item_type, update),
            (None, Some(remove)) if item.include.is_empty() => DescriptorItem::remove(&item.item_type, remove),
            _ => DescriptorItem::include(&item.item_type, &item.include),
        };
        let mut descriptor = spec.with_condition(item.condition.clone());
        descriptor.exclude = item.exclude.clone();
        descriptor.metadata = item.metadata.clone();
        write_item(writer, &descriptor)?;
    }
    writer.write_event(Event::End(BytesEnd::new("ItemGroup")))?;
    Ok(())
}

fn write_when<W: Write>(writer: &mut Writer<W>, name: &str, when: &When) -> Result<()> {
    let attributes: Vec<(&str, &str)> = when
        .condition
        .as_deref()
        .map(|c| vec![("Condition", c)])
        .unwrap_or_default();
    writer.write_event(Event::Start(start_tag(name, &attributes)))?;
    for group in &when.property_groups {
        write_legacy_property_group(writer, group)?;
    }
    for group in &when.item_groups {
        write_legacy_item_group(writer, group)?;
    }
    for nested in &when.chooses {
        write_choose(writer, nested)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_choose<W: Write>(writer: &mut Writer<W>, choose: &Choose) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Choose")))?;
    for when in &choose.whens {
        write_when(writer, "When", when)?;
    }
    if let Some(ref otherwise) = choose.otherwise {
        write_when(writer, "Otherwise", otherwise)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Choose")))?;
    Ok(())
}

fn write_import<W: Write>(writer: &mut Writer<W>, import: &Import) -> Result<()> {
    let mut attributes = vec![("Project", import.project.as_str())];
    if let Some(ref sdk) = import.sdk {
        attributes.push(("Sdk", sdk.as_str()));
    }
    if let Some(ref condition) = import.condition {
        attributes.push(("Condition", condition.as_str()));
    }
    if let Some(ref label) = import.label {
        attributes.push(("Label", label.as_str()));
    }
    write_empty(writer, "Import", &attributes)
}

fn write_target<W: Write>(writer: &mut Writer<W>, target: &Target) -> Result<()> {
    let mut attributes = vec![("Name", target.name.as_str())];
    let optional = [
        ("BeforeTargets", &target.before_targets),
        ("AfterTargets", &target.after_targets),
        ("DependsOnTargets", &target.depends_on_targets),
        ("Condition", &target.condition),
    ];
    for (name, value) in optional {
        if let Some(ref value) = value {
            attributes.push((name, value.as_str()));
        }
    }
    for (name, value) in &target.other_attributes {
        attributes.push((name.as_str(), value.as_str()));
    }

    if target.children.is_empty() {
        return write_empty(writer, "Target", &attributes);
    }
    writer.write_event(Event::Start(start_tag("Target", &attributes)))?;
    for child in &target.children {
        write_xml_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Target")))?;
    Ok(())
}

/// Write a carried-through node. Whitespace-only text is dropped; the writer indents.
fn write_xml_node<W: Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(element) => write_xml_element(writer, element),
        XmlNode::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(trimmed))))?;
            }
            Ok(())
        }
        XmlNode::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
            Ok(())
        }
    }
}

fn write_xml_element<W: Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let attributes: Vec<(&str, &str)> = element
        .attributes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let has_content = element.children.iter().any(|c| match c {
        XmlNode::Text(t) => !t.trim().is_empty(),
        _ => true,
    });
    if !has_content {
        return write_empty(writer, &element.name, &attributes);
    }

    // A lone text child stays on the element's line
    if let [XmlNode::Text(text)] = element.children.as_slice() {
        return write_text_element(writer, &element.name, &attributes, text.trim());
    }

    writer.write_event(Event::Start(start_tag(&element.name, &attributes)))?;
    for child in &element.children {
        write_xml_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
