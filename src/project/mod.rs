//! Legacy project loading

mod evaluated;
mod legacy_parser;
mod packages_config;

pub use evaluated::{
    expand_with, Choose, ElementRef, EvaluatedProject, Import, Item, ItemGroup, Property, PropertyGroup,
    Target, When, XmlElement, XmlNode,
};
pub use legacy_parser::{load_project, parse_project_str};
pub use packages_config::{
    find_packages_config, packages_config_path, parse_packages_config, parse_packages_config_str,
};
