//! Condition rewriting for multi-targeted projects

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::project::{Choose, ItemGroup, PropertyGroup, When};

static TFV_CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)'\$\(TargetFrameworkVersion\)'\s*(==|!=)\s*'([^']*)'")
        .expect("valid framework condition regex")
});

/// Rewrite `'$(TargetFrameworkVersion)' == 'v4.5'` comparisons into
/// `'$(TargetFramework)' == 'net45'` using `to_moniker`. Other text is untouched.
pub fn rewrite_condition(condition: &str, to_moniker: &dyn Fn(&str) -> String) -> String {
    TFV_CONDITION_RE
        .replace_all(condition, |caps: &Captures| {
            format!("'$(TargetFramework)' {} '{}'", &caps[1], to_moniker(&caps[2]))
        })
        .into_owned()
}

pub fn mentions_framework_version(condition: &str) -> bool {
    TFV_CONDITION_RE.is_match(condition)
}

fn rewrite_option(condition: &mut Option<String>, to_moniker: &dyn Fn(&str) -> String) {
    if let Some(c) = condition.as_mut() {
        *c = rewrite_condition(c, to_moniker);
    }
}

pub fn rewrite_property_group(group: &mut PropertyGroup, to_moniker: &dyn Fn(&str) -> String) {
    rewrite_option(&mut group.condition, to_moniker);
    for property in &mut group.properties {
        rewrite_option(&mut property.condition, to_moniker);
    }
}

pub fn rewrite_item_group(group: &mut ItemGroup, to_moniker: &dyn Fn(&str) -> String) {
    rewrite_option(&mut group.condition, to_moniker);
    for item in &mut group.items {
        rewrite_option(&mut item.condition, to_moniker);
    }
}

fn rewrite_when(when: &mut When, to_moniker: &dyn Fn(&str) -> String) {
    rewrite_option(&mut when.condition, to_moniker);
    for group in &mut when.property_groups {
        rewrite_property_group(group, to_moniker);
    }
    for group in &mut when.item_groups {
        rewrite_item_group(group, to_moniker);
    }
    for nested in &mut when.chooses {
        rewrite_choose(nested, to_moniker);
    }
}

/// Rewrite every condition in a `Choose` tree.
pub fn rewrite_choose(choose: &mut Choose, to_moniker: &dyn Fn(&str) -> String) {
    for when in &mut choose.whens {
        rewrite_when(when, to_moniker);
    }
    if let Some(ref mut otherwise) = choose.otherwise {
        rewrite_when(otherwise, to_moniker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moniker(version: &str) -> String {
        format!("net{}", version.trim_start_matches('v').replace('.', ""))
    }

    #[test]
    fn test_rewrites_framework_version_comparison() {
        assert_eq!(
            rewrite_condition("'$(TargetFrameworkVersion)' == 'v4.5'", &moniker),
            "'$(TargetFramework)' == 'net45'"
        );
        assert_eq!(
            rewrite_condition(
                "'$(Configuration)' == 'Debug' And '$(TargetFrameworkVersion)'!='v4.7.2'",
                &moniker
            ),
            "'$(Configuration)' == 'Debug' And '$(TargetFramework)' != 'net472'"
        );
    }

    #[test]
    fn test_other_conditions_untouched() {
        let condition = "'$(Configuration)|$(Platform)' == 'Debug|AnyCPU'";
        assert_eq!(rewrite_condition(condition, &moniker), condition);
        assert!(!mentions_framework_version(condition));
    }

    #[test]
    fn test_choose_tree() {
        let mut choose = Choose {
            whens: vec![When {
                condition: Some("'$(TargetFrameworkVersion)' == 'v4.0'".to_string()),
                ..Default::default()
            }],
            otherwise: None,
        };
        rewrite_choose(&mut choose, &moniker);
        assert_eq!(
            choose.whens[0].condition.as_deref(),
            Some("'$(TargetFramework)' == 'net40'")
        );
    }
}
