use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_site_content")
        .depends_on(&["0001_seo_data"])
        .operation(
            CreateTable::new("site_posts")
                .add_field(Field::new("id", FieldType::Integer).primary_key())
                .add_field(Field::new("post_type", FieldType::Text).not_null().default("'post'"))
                .add_field(Field::new("slug", FieldType::Text).not_null())
                .add_field(Field::new("permalink", FieldType::Text).not_null())
                .add_field(Field::new("permalink_normalized", FieldType::Text).not_null())
                .add_field(Field::new("status", FieldType::Text).not_null())
                .add_field(Field::new("title", FieldType::Text).not_null().default("''"))
                .add_field(Field::new("published_at", FieldType::Text)),
        )
        .operation(AddIndex::new(
            "site_posts",
            Index::new("idx_site_posts_slug").column("slug"),
        ))
        .operation(AddIndex::new(
            "site_posts",
            Index::new("idx_site_posts_permalink").column("permalink_normalized"),
        ))
        .operation(
            CreateTable::new("site_taxonomies")
                .add_field(Field::new("name", FieldType::Text).primary_key())
                .add_field(Field::new("is_public", FieldType::Integer).not_null().default("1"))
                .add_field(Field::new("position", FieldType::Integer).not_null().default("0")),
        )
        .operation(
            CreateTable::new("site_terms")
                .add_field(Field::new("id", FieldType::Integer).primary_key())
                .add_field(Field::new("taxonomy", FieldType::Text).not_null())
                .add_field(Field::new("slug", FieldType::Text).not_null())
                .add_field(Field::new("name", FieldType::Text).not_null()),
        )
        .operation(AddIndex::new(
            "site_terms",
            Index::new("idx_site_terms_taxonomy_slug")
                .column("taxonomy")
                .column("slug")
                .unique(),
        ))
        .operation(
            CreateTable::new("site_attachments")
                .add_field(Field::new("id", FieldType::Integer).primary_key())
                .add_field(Field::new("url", FieldType::Text).not_null())
                .add_field(Field::new("url_normalized", FieldType::Text).not_null())
                .add_field(Field::new("title", FieldType::Text).not_null().default("''")),
        )
        .operation(AddIndex::new(
            "site_attachments",
            Index::new("idx_site_attachments_url").column("url_normalized"),
        ))
}
