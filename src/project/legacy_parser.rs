//! Loader for legacy project files
//!
//! Builds an [`EvaluatedProject`] from a `.csproj`/`.vbproj`/`.fsproj` (or any MSBuild
//! project) file. Evaluation is deliberately shallow: unconditional properties are
//! applied in order, and conditions of the simple `'<expr>' == '<literal>'` /
//! `'<expr>' != '<literal>'` forms are evaluated so defaulted properties such as
//! `Configuration` resolve.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use encoding_rs::{Encoding, WINDOWS_1252};
use regex::Regex;
use roxmltree::{Document, Node};

use crate::error::MigrateError;

use super::evaluated::{
    expand_with, Choose, ElementRef, EvaluatedProject, Import, Item, ItemGroup, Property, PropertyGroup,
    Target, When, XmlElement, XmlNode,
};
use super::packages_config::find_packages_config;

static SIMPLE_CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*'([^']*)'\s*(==|!=)\s*'([^']*)'\s*$").expect("valid condition regex")
});

/// Item attributes that are not metadata
const ITEM_ATTRIBUTES: &[&str] = &["Include", "Update", "Remove", "Exclude", "Condition"];

/// Read a file as a string, honoring a BOM, then UTF-8, then Windows-1252 as fallback
pub(crate) fn read_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;

    if let Some((encoding, bom_len)) = Encoding::for_bom(&bytes) {
        let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "File contains invalid characters",
            ));
        }
        return Ok(decoded.into_owned());
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}

/// Load a project file from disk, including its `packages.config`.
pub fn load_project(path: &Path) -> Result<EvaluatedProject> {
    let content = read_with_encoding_fallback(path).map_err(|e| MigrateError::ProjectReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut project = parse_project_str(&content, path)?;
    project.packages_config = find_packages_config(&project)?;
    Ok(project)
}

/// Parse project XML that was already read into memory. `path` is used for
/// reserved properties and error messages only.
pub fn parse_project_str(content: &str, path: &Path) -> Result<EvaluatedProject> {
    let doc = Document::parse(content).map_err(|e| MigrateError::ProjectParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let root = doc.root_element();
    let mut project = EvaluatedProject {
        path: path.to_path_buf(),
        sdk: root.attribute("Sdk").map(str::to_string),
        tools_version: root.attribute("ToolsVersion").map(str::to_string),
        ..Default::default()
    };

    for node in root.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "PropertyGroup" => {
                project.layout.push(ElementRef::PropertyGroup(project.property_groups.len()));
                project.property_groups.push(parse_property_group(&node));
            }
            "ItemGroup" => {
                project.layout.push(ElementRef::ItemGroup(project.item_groups.len()));
                project.item_groups.push(parse_item_group(&node));
            }
            "Import" => {
                project.layout.push(ElementRef::Import(project.imports.len()));
                project.imports.push(parse_import(&node));
            }
            "Target" => {
                project.layout.push(ElementRef::Target(project.targets.len()));
                project.targets.push(parse_target(&node));
            }
            "Choose" => {
                project.layout.push(ElementRef::Choose(project.chooses.len()));
                project.chooses.push(parse_choose(&node));
            }
            "Sdk" => {
                if project.sdk.is_none() {
                    project.sdk = node.attribute("Name").map(str::to_string);
                }
            }
            _ => {}
        }
    }

    project.evaluated = evaluate_properties(&project);
    Ok(project)
}

fn optional_attribute(node: &Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_property_group(node: &Node) -> PropertyGroup {
    let properties = node
        .children()
        .filter(Node::is_element)
        .map(|child| Property {
            name: child.tag_name().name().to_string(),
            value: child.text().unwrap_or_default().to_string(),
            condition: optional_attribute(&child, "Condition"),
        })
        .collect();

    PropertyGroup {
        condition: optional_attribute(node, "Condition"),
        label: optional_attribute(node, "Label"),
        properties,
    }
}

fn parse_item_group(node: &Node) -> ItemGroup {
    ItemGroup {
        condition: optional_attribute(node, "Condition"),
        label: optional_attribute(node, "Label"),
        items: node
            .children()
            .filter(Node::is_element)
            .map(|n| parse_item(&n))
            .collect(),
    }
}

fn parse_item(node: &Node) -> Item {
    let mut metadata: Vec<(String, String)> = node
        .attributes()
        .filter(|a| !ITEM_ATTRIBUTES.contains(&a.name()))
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect();

    // Metadata can also be written as child elements
    metadata.extend(node.children().filter(Node::is_element).map(|child| {
        (
            child.tag_name().name().to_string(),
            child.text().unwrap_or_default().trim().to_string(),
        )
    }));

    Item {
        item_type: node.tag_name().name().to_string(),
        include: node.attribute("Include").unwrap_or_default().to_string(),
        update: node.attribute("Update").map(str::to_string),
        remove: node.attribute("Remove").map(str::to_string),
        exclude: optional_attribute(node, "Exclude"),
        condition: optional_attribute(node, "Condition"),
        metadata,
    }
}

fn parse_import(node: &Node) -> Import {
    Import {
        project: node.attribute("Project").unwrap_or_default().to_string(),
        condition: optional_attribute(node, "Condition"),
        label: optional_attribute(node, "Label"),
        sdk: optional_attribute(node, "Sdk"),
    }
}

fn parse_target(node: &Node) -> Target {
    let mut target = Target {
        name: node.attribute("Name").unwrap_or_default().to_string(),
        ..Default::default()
    };

    for attr in node.attributes() {
        let value = attr.value().to_string();
        match attr.name() {
            "Name" => {}
            "BeforeTargets" => target.before_targets = Some(value),
            "AfterTargets" => target.after_targets = Some(value),
            "DependsOnTargets" => target.depends_on_targets = Some(value),
            "Condition" => target.condition = Some(value),
            other => target.other_attributes.push((other.to_string(), value)),
        }
    }

    target.children = parse_children(node);
    target
}

/// Convert element children to the generic tree, dropping whitespace-only text.
fn parse_children(node: &Node) -> Vec<XmlNode> {
    node.children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(parse_element(&child)))
            } else if child.is_comment() {
                child.text().map(|t| XmlNode::Comment(t.to_string()))
            } else if child.is_text() {
                child
                    .text()
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| XmlNode::Text(t.to_string()))
            } else {
                None
            }
        })
        .collect()
}

fn parse_element(node: &Node) -> XmlElement {
    XmlElement {
        name: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        children: parse_children(node),
    }
}

fn parse_choose(node: &Node) -> Choose {
    let mut choose = Choose::default();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "When" => choose.whens.push(parse_when(&child)),
            "Otherwise" => choose.otherwise = Some(parse_when(&child)),
            _ => {}
        }
    }
    choose
}

fn parse_when(node: &Node) -> When {
    let mut when = When {
        condition: optional_attribute(node, "Condition"),
        ..Default::default()
    };
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "PropertyGroup" => when.property_groups.push(parse_property_group(&child)),
            "ItemGroup" => when.item_groups.push(parse_item_group(&child)),
            "Choose" => when.chooses.push(parse_choose(&child)),
            _ => {}
        }
    }
    when
}

/// Evaluate global properties from top-level property groups, in order.
fn evaluate_properties(project: &EvaluatedProject) -> HashMap<String, String> {
    let mut props: HashMap<String, String> = HashMap::new();

    for group in &project.property_groups {
        if let Some(ref condition) = group.condition {
            if evaluate_condition(condition, &props) != Some(true) {
                continue;
            }
        }
        for property in &group.properties {
            if let Some(ref condition) = property.condition {
                if evaluate_condition(condition, &props) != Some(true) {
                    continue;
                }
            }
            let value = expand_with(property.value.trim(), |name| {
                props.get(&name.to_ascii_lowercase()).cloned()
            });
            props.insert(property.name.to_ascii_lowercase(), value);
        }
    }

    props
}

/// Evaluate a simple equality condition. Returns `None` for unsupported forms.
pub(crate) fn evaluate_condition(condition: &str, props: &HashMap<String, String>) -> Option<bool> {
    let caps = SIMPLE_CONDITION_RE.captures(condition)?;
    let left = expand_with(&caps[1], |name| props.get(&name.to_ascii_lowercase()).cloned());
    let right = &caps[3];
    let equal = left.trim().eq_ignore_ascii_case(right.trim());
    Some(if &caps[2] == "==" { equal } else { !equal })
}
