//! The schema digest used as the cache key for live model builds.
//!
//! The digest covers every companion source and every content type definition.
//! It does not depend on the order in which the provider lists content types
//! or the order in which companion files were read.

use livemodels_common::{ContentHash, ContentHasher};
use livemodels_schema::{CompanionSources, ContentTypeDescriptor, Directives};

const COMPANIONS_TAG: u8 = 0xC0;
const SCHEMA_TAG: u8 = 0x5C;

/// Computes digests over companion sources plus schema.
pub struct SchemaHasher;

impl SchemaHasher {
    /// Digests the companion sources and schema snapshot.
    pub fn digest(companions: &CompanionSources, schema: &[ContentTypeDescriptor]) -> ContentHash {
        let mut hasher = ContentHasher::new();

        hasher.write_tag(COMPANIONS_TAG);
        hasher.write_bytes(&(companions.len() as u64).to_le_bytes());
        for (path, text) in companions.iter() {
            hasher.write_str(&path.to_string_lossy()).write_str(text);
        }

        let mut types: Vec<&ContentTypeDescriptor> = schema.iter().collect();
        types.sort_by(|a, b| {
            (a.alias.key(), a.alias.as_str()).cmp(&(b.alias.key(), b.alias.as_str()))
        });

        hasher.write_tag(SCHEMA_TAG);
        hasher.write_bytes(&(types.len() as u64).to_le_bytes());
        for ct in types {
            hash_content_type(&mut hasher, ct);
        }

        hasher.finish()
    }
}

fn hash_content_type(hasher: &mut ContentHasher, ct: &ContentTypeDescriptor) {
    hasher.write_str(ct.alias.as_str()).write_tag(ct.kind.tag());
    hash_directives(hasher, &ct.directives);

    hasher.write_bytes(&(ct.properties.len() as u64).to_le_bytes());
    for prop in &ct.properties {
        hasher
            .write_str(&prop.alias)
            .write_str(&prop.editor)
            .write_str(&prop.value_type);
        hash_directives(hasher, &prop.directives);
    }

    hasher.write_bytes(&(ct.mixins.len() as u64).to_le_bytes());
    for mixin in &ct.mixins {
        hasher.write_str(mixin.as_str());
    }
}

fn hash_directives(hasher: &mut ContentHasher, directives: &Directives) {
    hasher.write_tag(u8::from(directives.ignore));
    match &directives.rename {
        Some(name) => hasher.write_tag(1).write_str(name),
        None => hasher.write_tag(0),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use livemodels_schema::{ContentKind, PropertyDescriptor};

    fn schema() -> Vec<ContentTypeDescriptor> {
        vec![
            ContentTypeDescriptor::new("home", ContentKind::Content)
                .with_property(PropertyDescriptor::new("title", "textbox", "String")),
            ContentTypeDescriptor::new("seo", ContentKind::Element)
                .with_property(PropertyDescriptor::new("metaTitle", "textbox", "String")),
            ContentTypeDescriptor::new("article", ContentKind::Content).with_mixin("seo"),
        ]
    }

    fn companions() -> CompanionSources {
        [("home.rs", "impl Home {}"), ("util.rs", "fn helper() {}")]
            .into_iter()
            .collect()
    }

    fn digest_of(schema: &[ContentTypeDescriptor]) -> ContentHash {
        SchemaHasher::digest(&companions(), schema)
    }

    #[test]
    fn stable_for_identical_inputs() {
        assert_eq!(digest_of(&schema()), digest_of(&schema()));
    }

    #[test]
    fn independent_of_schema_order() {
        let mut reversed = schema();
        reversed.reverse();
        assert_eq!(digest_of(&schema()), digest_of(&reversed));
    }

    #[test]
    fn independent_of_order_of_case_variant_aliases() {
        let variants = vec![
            ContentTypeDescriptor::new("page", ContentKind::Content),
            ContentTypeDescriptor::new("Page", ContentKind::Element),
        ];
        let mut reversed = variants.clone();
        reversed.reverse();
        assert_eq!(digest_of(&variants), digest_of(&reversed));
    }

    #[test]
    fn independent_of_companion_insertion_order() {
        let a: CompanionSources = [("a.rs", "a"), ("b.rs", "b")].into_iter().collect();
        let b: CompanionSources = [("b.rs", "b"), ("a.rs", "a")].into_iter().collect();
        assert_eq!(
            SchemaHasher::digest(&a, &schema()),
            SchemaHasher::digest(&b, &schema())
        );
    }

    #[test]
    fn companion_text_change_changes_digest() {
        let mut changed = companions();
        changed.insert("util.rs", "fn helper() { 1 }");
        assert_ne!(
            SchemaHasher::digest(&companions(), &schema()),
            SchemaHasher::digest(&changed, &schema())
        );
    }

    #[test]
    fn companion_added_changes_digest() {
        let mut changed = companions();
        changed.insert("extra.rs", "");
        assert_ne!(
            SchemaHasher::digest(&companions(), &schema()),
            SchemaHasher::digest(&changed, &schema())
        );
    }

    #[test]
    fn every_definition_field_is_covered() {
        let base = digest_of(&schema());
        let mutations: Vec<Box<dyn Fn(&mut Vec<ContentTypeDescriptor>)>> = vec![
            Box::new(|s| s[0].alias = "Home".into()),
            Box::new(|s| s[0].kind = ContentKind::Element),
            Box::new(|s| s[0].properties[0].alias = "heading".to_string()),
            Box::new(|s| s[0].properties[0].editor = "richtext".to_string()),
            Box::new(|s| s[0].properties[0].value_type = "Html".to_string()),
            Box::new(|s| s[0].properties[0].directives = Directives::ignored()),
            Box::new(|s| s[0].properties[0].directives = Directives::renamed("Heading")),
            Box::new(|s| s[0].directives = Directives::ignored()),
            Box::new(|s| s[0].directives = Directives::renamed("Start")),
            Box::new(|s| s[2].mixins.clear()),
            Box::new(|s| {
                s[0].properties
                    .push(PropertyDescriptor::new("body", "richtext", "Html"))
            }),
            Box::new(|s| s.push(ContentTypeDescriptor::new("news", ContentKind::Content))),
            Box::new(|s| {
                s.remove(1);
            }),
        ];
        for (i, mutate) in mutations.iter().enumerate() {
            let mut changed = schema();
            mutate(&mut changed);
            assert_ne!(base, digest_of(&changed), "mutation {i} did not change digest");
        }
    }
}
