//! Evaluated view of a legacy project file
//!
//! The view keeps the document order of property groups, item groups, imports,
//! targets and `Choose` blocks. It is built once per project by the loader and only
//! read afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::model::PackageReference;

static PROPERTY_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\(([A-Za-z_][\w.\-]*)\)").expect("valid property regex"));

/// A single property assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyGroup {
    pub condition: Option<String>,
    pub label: Option<String>,
    pub properties: Vec<Property>,
}

impl PropertyGroup {
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

/// An item such as `<Compile Include="Program.cs" />`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pub item_type: String,
    pub include: String,
    pub update: Option<String>,
    pub remove: Option<String>,
    pub exclude: Option<String>,
    pub condition: Option<String>,
    /// Metadata in document order (child elements and extra attributes)
    pub metadata: Vec<(String, String)>,
}

impl Item {
    pub fn new(item_type: impl Into<String>, include: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            include: include.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive metadata lookup
    pub fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_type(&self, item_type: &str) -> bool {
        self.item_type.eq_ignore_ascii_case(item_type)
    }

    /// Short description used in reports: `Compile Include="Program.cs"`
    pub fn describe(&self) -> String {
        if let Some(ref update) = self.update {
            format!("{} Update=\"{}\"", self.item_type, update)
        } else if let Some(ref remove) = self.remove {
            format!("{} Remove=\"{}\"", self.item_type, remove)
        } else {
            format!("{} Include=\"{}\"", self.item_type, self.include)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemGroup {
    pub condition: Option<String>,
    pub label: Option<String>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Import {
    pub project: String,
    pub condition: Option<String>,
    pub label: Option<String>,
    pub sdk: Option<String>,
}

/// Generic XML node, used to carry target bodies through unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub before_targets: Option<String>,
    pub after_targets: Option<String>,
    pub depends_on_targets: Option<String>,
    pub condition: Option<String>,
    /// Attributes other than the ones above (Inputs, Outputs, Returns, ...)
    pub other_attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Target {
    /// True when the target has no tasks (comments and whitespace only).
    pub fn is_empty(&self) -> bool {
        !self
            .children
            .iter()
            .any(|c| matches!(c, XmlNode::Element(_)))
    }
}

/// One `When` (or the `Otherwise`) branch of a `Choose` block
#[derive(Debug, Clone, Default)]
pub struct When {
    /// `None` for `Otherwise`
    pub condition: Option<String>,
    pub property_groups: Vec<PropertyGroup>,
    pub item_groups: Vec<ItemGroup>,
    pub chooses: Vec<Choose>,
}

#[derive(Debug, Clone, Default)]
pub struct Choose {
    pub whens: Vec<When>,
    pub otherwise: Option<When>,
}

impl Choose {
    fn branches(&self) -> impl Iterator<Item = &When> {
        self.whens.iter().chain(self.otherwise.iter())
    }
}

/// Position of a top-level element, as an index into its list on [`EvaluatedProject`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    PropertyGroup(usize),
    ItemGroup(usize),
    Import(usize),
    Target(usize),
    Choose(usize),
}

impl ElementRef {
    /// Property and item groups; the elements a migrated project is built around
    pub fn is_group(&self) -> bool {
        matches!(self, ElementRef::PropertyGroup(_) | ElementRef::ItemGroup(_))
    }
}

/// Immutable evaluated view of a legacy project
#[derive(Debug, Clone, Default)]
pub struct EvaluatedProject {
    pub path: PathBuf,
    /// `Sdk` attribute on the root, or `<Sdk Name="..."/>` element
    pub sdk: Option<String>,
    pub tools_version: Option<String>,
    pub property_groups: Vec<PropertyGroup>,
    pub item_groups: Vec<ItemGroup>,
    pub imports: Vec<Import>,
    pub targets: Vec<Target>,
    pub chooses: Vec<Choose>,
    /// Top-level elements in document order. Empty for views not built by the loader.
    pub layout: Vec<ElementRef>,
    /// Entries of a `packages.config` next to the project
    pub packages_config: Vec<PackageReference>,
    /// Global properties after evaluation, keyed by lowercase name
    pub(crate) evaluated: HashMap<String, String>,
}

impl EvaluatedProject {
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// File stem, e.g. `MyApp` for `MyApp.csproj`
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Project")
    }

    /// Lowercase extension without the dot, e.g. `csproj`
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Already uses an SDK (root attribute, `<Sdk>` element, or an `Sdk` import).
    pub fn is_sdk_style(&self) -> bool {
        self.sdk.is_some() || self.imports.iter().any(|i| i.sdk.is_some())
    }

    /// A project with no property groups and no item groups cannot be migrated.
    pub fn is_empty(&self) -> bool {
        self.property_groups.is_empty() && self.item_groups.is_empty() && self.chooses.is_empty()
    }

    /// Document order of the top-level elements. Views without a recorded layout list
    /// groups first, then `Choose` blocks, imports and targets.
    pub fn layout(&self) -> Vec<ElementRef> {
        if !self.layout.is_empty() {
            return self.layout.clone();
        }
        (0..self.property_groups.len())
            .map(ElementRef::PropertyGroup)
            .chain((0..self.item_groups.len()).map(ElementRef::ItemGroup))
            .chain((0..self.chooses.len()).map(ElementRef::Choose))
            .chain((0..self.imports.len()).map(ElementRef::Import))
            .chain((0..self.targets.len()).map(ElementRef::Target))
            .collect()
    }

    /// Evaluated value of a global property (case-insensitive). Reserved
    /// `MSBuildProject*` properties are derived from the path.
    pub fn property(&self, name: &str) -> Option<String> {
        if let Some(value) = self.evaluated.get(&name.to_ascii_lowercase()) {
            return Some(value.clone());
        }
        match name.to_ascii_lowercase().as_str() {
            "msbuildprojectname" => Some(self.name().to_string()),
            "msbuildprojectdirectory" | "msbuildthisfiledirectory" => {
                Some(self.project_dir().to_string_lossy().into_owned())
            }
            "msbuildprojectfile" | "msbuildthisfile" => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    /// Expand `$(Name)` references; undefined properties expand to the empty string,
    /// as MSBuild does.
    pub fn expand(&self, expression: &str) -> String {
        expand_with(expression, |name| self.property(name))
    }

    /// True when every `$(...)` reference in the expression is defined.
    pub fn can_expand(&self, expression: &str) -> bool {
        PROPERTY_REF_RE
            .captures_iter(expression)
            .all(|c| self.property(&c[1]).is_some())
    }

    /// All items, including those nested in `Choose` branches, in document order
    /// (top-level groups first).
    pub fn all_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.item_groups.iter().flat_map(|g| &g.items).collect();
        fn collect<'a>(choose: &'a Choose, out: &mut Vec<&'a Item>) {
            for branch in choose.branches() {
                out.extend(branch.item_groups.iter().flat_map(|g| &g.items));
                for nested in &branch.chooses {
                    collect(nested, out);
                }
            }
        }
        for choose in &self.chooses {
            collect(choose, &mut items);
        }
        items
    }

    /// Top-level items of the given type
    pub fn items_of_type<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.item_groups
            .iter()
            .flat_map(|g| &g.items)
            .filter(move |i| i.is_type(item_type))
    }

    /// Every declaration of a property, with the condition of the declaration or its
    /// group. Includes declarations inside `Choose` branches.
    pub fn property_declarations(&self, name: &str) -> Vec<(String, Option<String>)> {
        let mut found = Vec::new();
        fn scan(groups: &[PropertyGroup], name: &str, out: &mut Vec<(String, Option<String>)>) {
            for group in groups {
                for property in &group.properties {
                    if property.name.eq_ignore_ascii_case(name) {
                        let condition = property.condition.clone().or(group.condition.clone());
                        out.push((property.value.trim().to_string(), condition));
                    }
                }
            }
        }
        fn scan_choose(choose: &Choose, name: &str, out: &mut Vec<(String, Option<String>)>) {
            for branch in choose.branches() {
                let before = out.len();
                scan(&branch.property_groups, name, out);
                for entry in out.iter_mut().skip(before) {
                    if entry.1.is_none() {
                        entry.1 = branch.condition.clone();
                    }
                }
                for nested in &branch.chooses {
                    scan_choose(nested, name, out);
                }
            }
        }
        scan(&self.property_groups, name, &mut found);
        for choose in &self.chooses {
            scan_choose(choose, name, &mut found);
        }
        found
    }
}

/// Expand `$(Name)` references using `lookup`; unknown names expand to "".
pub fn expand_with(expression: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    if !expression.contains("$(") {
        return expression.to_string();
    }
    PROPERTY_REF_RE
        .replace_all(expression, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with(props: &[(&str, &str)]) -> EvaluatedProject {
        EvaluatedProject {
            path: PathBuf::from("/src/App/App.csproj"),
            evaluated: props
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_expand_known_and_unknown() {
        let project = project_with(&[("Configuration", "Release")]);
        assert_eq!(project.expand(r"bin\$(Configuration)\"), r"bin\Release\");
        assert_eq!(project.expand("$(Missing)x"), "x");
        assert!(!project.can_expand("$(Missing)"));
        assert!(project.can_expand("$(MSBuildProjectName).xml"));
    }

    #[test]
    fn test_reserved_properties() {
        let project = project_with(&[]);
        assert_eq!(project.property("MSBuildProjectName").as_deref(), Some("App"));
        assert_eq!(project.extension(), "csproj");
    }

    #[test]
    fn test_item_metadata_lookup_is_case_insensitive() {
        let item = Item::new("Compile", "Form1.cs").with_metadata("SubType", "Form");
        assert_eq!(item.metadata("subtype"), Some("Form"));
        assert_eq!(item.describe(), "Compile Include=\"Form1.cs\"");
    }
}
