//! Adapts raw content type descriptors into the models the generator emits.
//!
//! This is where directives are applied and the schema is checked for the
//! conflicts a generator cannot resolve on its own: duplicate aliases, type
//! name collisions, dangling or cyclic mixins, and clashing property accessors.

use std::collections::{HashMap, HashSet};

use heck::ToUpperCamelCase;
use livemodels_common::Alias;

use crate::descriptor::{ContentKind, ContentTypeDescriptor};
use crate::error::SchemaError;

/// A property as it appears on a generated type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyModel {
    /// Property alias in the schema.
    pub alias: String,
    /// Accessor name on the generated type.
    pub name: String,
    /// Editor alias, used by generators to pick a value converter.
    pub editor: String,
    /// Value type of the accessor.
    pub value_type: String,
}

/// A content type as it appears in generated code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeModel {
    /// The content type alias the generated type is registered under.
    pub alias: Alias,
    /// Kind of published item.
    pub kind: ContentKind,
    /// Name of the generated type.
    pub type_name: String,
    /// Properties declared directly on this content type.
    pub properties: Vec<PropertyModel>,
    /// Generated type names of the direct mixins.
    pub mixins: Vec<String>,
    /// Whether another content type mixes this one in.
    pub is_mixin: bool,
}

/// Builds the type models for every non-ignored content type.
///
/// The result is sorted by alias so generation does not depend on the order in
/// which the provider listed the content types.
pub fn build_type_models(schema: &[ContentTypeDescriptor]) -> Result<Vec<TypeModel>, SchemaError> {
    let mut by_alias: HashMap<&str, &ContentTypeDescriptor> = HashMap::new();
    for ct in schema {
        if ct.alias.as_str().trim().is_empty() {
            return Err(SchemaError::EmptyAlias);
        }
        if let Some(existing) = by_alias.insert(ct.alias.key(), ct) {
            return Err(SchemaError::AliasConflict {
                first: existing.alias.to_string(),
                second: ct.alias.to_string(),
            });
        }
    }

    let active: HashMap<&str, &ContentTypeDescriptor> = by_alias
        .into_iter()
        .filter(|(_, ct)| !ct.directives.ignore)
        .collect();

    let mut type_names: HashMap<&str, String> = HashMap::new();
    let mut claimed: HashMap<String, &Alias> = HashMap::new();
    for (key, ct) in sorted(&active) {
        let name = type_name_for(ct);
        if let Some(first) = claimed.insert(name.clone(), &ct.alias) {
            return Err(SchemaError::TypeNameCollision {
                type_name: name,
                first: first.to_string(),
                second: ct.alias.to_string(),
            });
        }
        type_names.insert(key, name);
    }

    let mut used_as_mixin: HashSet<&str> = HashSet::new();
    for (_, ct) in sorted(&active) {
        for mixin in &ct.mixins {
            if !active.contains_key(mixin.key()) {
                return Err(SchemaError::UnknownMixin {
                    content_type: ct.alias.to_string(),
                    mixin: mixin.to_string(),
                });
            }
            used_as_mixin.insert(mixin.key());
        }
    }
    check_mixin_cycles(&active)?;

    let mut models = Vec::with_capacity(active.len());
    for (key, ct) in sorted(&active) {
        check_property_names(ct, &active)?;
        models.push(TypeModel {
            alias: ct.alias.clone(),
            kind: ct.kind,
            type_name: type_names[key].clone(),
            properties: own_properties(ct),
            mixins: ct
                .mixins
                .iter()
                .map(|m| type_names[m.key()].clone())
                .collect(),
            is_mixin: used_as_mixin.contains(key),
        });
    }
    Ok(models)
}

fn sorted<'a>(
    active: &HashMap<&'a str, &'a ContentTypeDescriptor>,
) -> Vec<(&'a str, &'a ContentTypeDescriptor)> {
    let mut entries: Vec<_> = active.iter().map(|(k, v)| (*k, *v)).collect();
    entries.sort_by_key(|(k, _)| *k);
    entries
}

fn type_name_for(ct: &ContentTypeDescriptor) -> String {
    match &ct.directives.rename {
        Some(name) => name.clone(),
        None => ct.alias.as_str().to_upper_camel_case(),
    }
}

fn own_properties(ct: &ContentTypeDescriptor) -> Vec<PropertyModel> {
    ct.properties
        .iter()
        .filter(|p| !p.directives.ignore)
        .map(|p| PropertyModel {
            alias: p.alias.clone(),
            name: p
                .directives
                .rename
                .clone()
                .unwrap_or_else(|| p.alias.to_upper_camel_case()),
            editor: p.editor.clone(),
            value_type: p.value_type.clone(),
        })
        .collect()
}

fn check_mixin_cycles(active: &HashMap<&str, &ContentTypeDescriptor>) -> Result<(), SchemaError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        key: &'a str,
        active: &HashMap<&'a str, &'a ContentTypeDescriptor>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), SchemaError> {
        match marks.get(key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                return Err(SchemaError::MixinCycle(active[key].alias.to_string()))
            }
            None => {}
        }
        marks.insert(key, Mark::Visiting);
        let ct: &'a ContentTypeDescriptor = active[key];
        for mixin in &ct.mixins {
            visit(mixin.key(), active, marks)?;
        }
        marks.insert(key, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for (key, _) in sorted(active) {
        visit(key, active, &mut marks)?;
    }
    Ok(())
}

/// Checks that the accessors a type ends up with (its own plus every
/// transitively mixed-in property) have distinct names. The same property
/// reached through two mixin paths is not a clash.
fn check_property_names(
    ct: &ContentTypeDescriptor,
    active: &HashMap<&str, &ContentTypeDescriptor>,
) -> Result<(), SchemaError> {
    let mut seen: HashMap<String, (&str, String)> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![ct.alias.key()];

    while let Some(key) = stack.pop() {
        if !visited.insert(key) {
            continue;
        }
        let current = active[key];
        for prop in own_properties(current) {
            let origin = (key, prop.alias.clone());
            match seen.get(&prop.name) {
                Some(existing) if *existing != origin => {
                    return Err(SchemaError::DuplicateProperty {
                        content_type: ct.alias.to_string(),
                        property: prop.name,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(prop.name, origin);
                }
            }
        }
        stack.extend(current.mixins.iter().map(|m| m.key()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Directives, PropertyDescriptor};

    fn content(alias: &str) -> ContentTypeDescriptor {
        ContentTypeDescriptor::new(alias, ContentKind::Content)
    }

    fn prop(alias: &str) -> PropertyDescriptor {
        PropertyDescriptor::new(alias, "textbox", "String")
    }

    #[test]
    fn names_types_and_properties_from_aliases() {
        let models = build_type_models(&[content("blogPost").with_property(prop("bodyText"))])
            .unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].type_name, "BlogPost");
        assert_eq!(models[0].properties[0].name, "BodyText");
        assert_eq!(models[0].properties[0].alias, "bodyText");
    }

    #[test]
    fn output_sorted_by_alias() {
        let models = build_type_models(&[content("zebra"), content("apple")]).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.type_name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra"]);
    }

    #[test]
    fn rename_and_ignore_directives() {
        let mut hidden = prop("internalNotes");
        hidden.directives = Directives::ignored();
        let mut renamed = prop("title");
        renamed.directives = Directives::renamed("Heading");

        let schema = vec![
            content("page")
                .with_directives(Directives::renamed("WebPage"))
                .with_property(hidden)
                .with_property(renamed),
            content("legacy").with_directives(Directives::ignored()),
        ];
        let models = build_type_models(&schema).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].type_name, "WebPage");
        assert_eq!(models[0].properties.len(), 1);
        assert_eq!(models[0].properties[0].name, "Heading");
    }

    #[test]
    fn case_insensitive_alias_conflict() {
        let err = build_type_models(&[content("page"), content("Page")]).unwrap_err();
        match err {
            SchemaError::AliasConflict { first, second } => {
                assert_eq!(first, "page");
                assert_eq!(second, "Page");
            }
            other => panic!("expected alias conflict, got {other}"),
        }
    }

    #[test]
    fn type_name_collision() {
        let err = build_type_models(&[content("blog-post"), content("blogPost")]).unwrap_err();
        assert!(matches!(err, SchemaError::TypeNameCollision { ref type_name, .. } if type_name == "BlogPost"));
    }

    #[test]
    fn empty_alias_rejected() {
        let err = build_type_models(&[content("  ")]).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyAlias));
    }

    #[test]
    fn mixins_resolve_to_type_names() {
        let schema = vec![
            content("seo").with_property(prop("metaTitle")),
            content("article").with_mixin("SEO").with_property(prop("body")),
        ];
        let models = build_type_models(&schema).unwrap();
        let article = models.iter().find(|m| m.alias.key() == "article").unwrap();
        let seo = models.iter().find(|m| m.alias.key() == "seo").unwrap();
        assert_eq!(article.mixins, vec!["Seo".to_string()]);
        assert!(seo.is_mixin);
        assert!(!article.is_mixin);
    }

    #[test]
    fn unknown_mixin_rejected() {
        let err = build_type_models(&[content("article").with_mixin("seo")]).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownMixin { .. }));
    }

    #[test]
    fn ignored_mixin_is_unknown() {
        let schema = vec![
            content("seo").with_directives(Directives::ignored()),
            content("article").with_mixin("seo"),
        ];
        let err = build_type_models(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownMixin { .. }));
    }

    #[test]
    fn mixin_cycle_rejected() {
        let schema = vec![content("a").with_mixin("b"), content("b").with_mixin("a")];
        let err = build_type_models(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::MixinCycle(_)));
    }

    #[test]
    fn property_clash_with_mixin() {
        let schema = vec![
            content("seo").with_property(prop("title")),
            content("article").with_mixin("seo").with_property(prop("title")),
        ];
        let err = build_type_models(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateProperty { ref property, .. } if property == "Title"));
    }

    #[test]
    fn diamond_mixin_is_not_a_clash() {
        let schema = vec![
            content("base").with_property(prop("title")),
            content("left").with_mixin("base"),
            content("right").with_mixin("base"),
            content("leaf").with_mixin("left").with_mixin("right"),
        ];
        assert!(build_type_models(&schema).is_ok());
    }
}
