use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_seo_data")
        // storage_meta - format version bookkeeping
        .operation(
            CreateTable::new("storage_meta")
                .add_field(Field::new("key", FieldType::Text).primary_key())
                .add_field(Field::new("value", FieldType::Text).not_null()),
        )
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "INSERT OR IGNORE INTO storage_meta (key, value) VALUES ('format_version', '1')",
        ))
        // seo_data - one row per normalized URL
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS seo_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_url TEXT NOT NULL,
    page_url_normalized TEXT NOT NULL,
    post_id INTEGER,
    page_title TEXT,
    meta_description TEXT,
    canonical_url TEXT,
    page_schema TEXT,
    original_title TEXT,
    original_description TEXT,
    original_canonical TEXT,
    original_schema TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "seo_data",
            Index::new("idx_seo_data_url_normalized")
                .column("page_url_normalized")
                .unique(),
        ))
        .operation(AddIndex::new(
            "seo_data",
            Index::new("idx_seo_data_post_id").column("post_id"),
        ))
        .operation(AddIndex::new(
            "seo_data",
            Index::new("idx_seo_data_updated_at").column("updated_at"),
        ))
        // activity_log - append-only, trimmed to a maximum row count
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    level TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
)"#,
        ))
        .operation(AddIndex::new(
            "activity_log",
            Index::new("idx_activity_log_created_at").column("created_at"),
        ))
        .operation(AddIndex::new(
            "activity_log",
            Index::new("idx_activity_log_level").column("level"),
        ))
        // site_options - singleton settings and homepage backups
        .operation(
            CreateTable::new("site_options")
                .add_field(Field::new("name", FieldType::Text).primary_key())
                .add_field(Field::new("value", FieldType::Text).not_null())
                .add_field(Field::new("updated_at", FieldType::Text).not_null()),
        )
        // entity_meta - legacy per-post and per-term metadata
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS entity_meta (
    scope TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    meta_key TEXT NOT NULL,
    meta_value TEXT NOT NULL,
    PRIMARY KEY (scope, entity_id, meta_key)
)"#,
        ))
}
