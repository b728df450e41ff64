//! In-memory SDK-style project tree produced by migration and consumed by the writer

use crate::project::{Choose, Import, Property, Target};

/// `Include`, `Update` or `Remove` form of an emitted item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSpec {
    Include(String),
    Update(String),
    Remove(String),
}

impl ItemSpec {
    pub fn attribute_name(&self) -> &'static str {
        match self {
            ItemSpec::Include(_) => "Include",
            ItemSpec::Update(_) => "Update",
            ItemSpec::Remove(_) => "Remove",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ItemSpec::Include(v) | ItemSpec::Update(v) | ItemSpec::Remove(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorItem {
    pub item_type: String,
    pub spec: ItemSpec,
    pub exclude: Option<String>,
    pub condition: Option<String>,
    /// Written as child elements, except where [`DescriptorItem::attribute_metadata`] says otherwise
    pub metadata: Vec<(String, String)>,
}

impl DescriptorItem {
    pub fn include(item_type: impl Into<String>, include: impl Into<String>) -> Self {
        Self::with_spec(item_type, ItemSpec::Include(include.into()))
    }

    pub fn update(item_type: impl Into<String>, update: impl Into<String>) -> Self {
        Self::with_spec(item_type, ItemSpec::Update(update.into()))
    }

    pub fn remove(item_type: impl Into<String>, remove: impl Into<String>) -> Self {
        Self::with_spec(item_type, ItemSpec::Remove(remove.into()))
    }

    fn with_spec(item_type: impl Into<String>, spec: ItemSpec) -> Self {
        Self {
            item_type: item_type.into(),
            spec,
            exclude: None,
            condition: None,
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((name.into(), value.into()));
        self
    }

    pub fn with_condition(mut self, condition: Option<String>) -> Self {
        self.condition = condition;
        self
    }

    /// Package items keep `Version` and friends on the element, as SDK projects do.
    pub fn attribute_metadata(&self) -> &'static [&'static str] {
        if self.item_type.eq_ignore_ascii_case("PackageReference")
            || self.item_type.eq_ignore_ascii_case("PackageVersion")
            || self.item_type.eq_ignore_ascii_case("GlobalPackageReference")
        {
            &["Version", "VersionOverride"]
        } else {
            &[]
        }
    }

    pub fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_metadata(&mut self, name: &str, value: Option<String>) {
        self.metadata.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        if let Some(value) = value {
            self.metadata.push((name.to_string(), value));
        }
    }

    pub fn is_type(&self, item_type: &str) -> bool {
        self.item_type.eq_ignore_ascii_case(item_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkPropertyGroup {
    pub condition: Option<String>,
    pub label: Option<String>,
    pub properties: Vec<Property>,
}

impl SdkPropertyGroup {
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .properties
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self.properties.push(Property {
                name: name.to_string(),
                value,
                condition: None,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkItemGroup {
    pub condition: Option<String>,
    pub label: Option<String>,
    pub items: Vec<DescriptorItem>,
}

/// Top-level children of the emitted `<Project>`, in output order
#[derive(Debug, Clone)]
pub enum ProjectNode {
    PropertyGroup(SdkPropertyGroup),
    ItemGroup(SdkItemGroup),
    Choose(Choose),
    Import(Import),
    Target(Target),
}

/// An SDK-style project ready to be written
#[derive(Debug, Clone, Default)]
pub struct SdkProject {
    pub sdk: String,
    pub nodes: Vec<ProjectNode>,
}

impl SdkProject {
    pub fn new(sdk: impl Into<String>) -> Self {
        Self {
            sdk: sdk.into(),
            nodes: Vec::new(),
        }
    }

    pub fn property_groups(&self) -> impl Iterator<Item = &SdkPropertyGroup> {
        self.nodes.iter().filter_map(|n| match n {
            ProjectNode::PropertyGroup(g) => Some(g),
            _ => None,
        })
    }

    pub fn item_groups(&self) -> impl Iterator<Item = &SdkItemGroup> {
        self.nodes.iter().filter_map(|n| match n {
            ProjectNode::ItemGroup(g) => Some(g),
            _ => None,
        })
    }

    pub fn item_groups_mut(&mut self) -> impl Iterator<Item = &mut SdkItemGroup> {
        self.nodes.iter_mut().filter_map(|n| match n {
            ProjectNode::ItemGroup(g) => Some(g),
            _ => None,
        })
    }

    /// Every emitted item of the given type, across all top-level item groups
    pub fn items_of_type<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a DescriptorItem> + 'a {
        self.item_groups()
            .flat_map(|g| &g.items)
            .filter(move |i| i.is_type(item_type))
    }

    /// Value of an unconditional property
    pub fn property(&self, name: &str) -> Option<&str> {
        self.property_groups()
            .filter(|g| g.condition.is_none())
            .find_map(|g| g.get(name))
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.nodes.iter().filter_map(|n| match n {
            ProjectNode::Target(t) => Some(t),
            _ => None,
        })
    }

    /// Drop item groups left empty by post-processing.
    pub fn prune_empty_groups(&mut self) {
        self.nodes.retain(|n| match n {
            ProjectNode::ItemGroup(g) => !g.items.is_empty(),
            ProjectNode::PropertyGroup(g) => !g.properties.is_empty(),
            _ => true,
        });
    }
}
