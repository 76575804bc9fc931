//! Diesel row types.

use diesel::prelude::*;

use crate::schema;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::seo_data)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SeoDataRecord {
    pub id: i64,
    pub page_url: String,
    pub page_url_normalized: String,
    pub post_id: Option<i64>,
    pub page_title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub page_schema: Option<String>,
    pub original_title: Option<String>,
    pub original_description: Option<String>,
    pub original_canonical: Option<String>,
    pub original_schema: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::seo_data)]
pub struct NewSeoData<'a> {
    pub page_url: &'a str,
    pub page_url_normalized: &'a str,
    pub post_id: Option<i64>,
    pub page_title: Option<&'a str>,
    pub meta_description: Option<&'a str>,
    pub canonical_url: Option<&'a str>,
    pub page_schema: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Partial update of a SEO row. Outer `None` leaves the column untouched.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = schema::seo_data)]
pub struct SeoDataChangeset {
    pub page_url: Option<String>,
    pub post_id: Option<Option<i64>>,
    pub page_title: Option<Option<String>>,
    pub meta_description: Option<Option<String>>,
    pub canonical_url: Option<Option<String>>,
    pub page_schema: Option<Option<String>>,
    pub original_title: Option<Option<String>>,
    pub original_description: Option<Option<String>>,
    pub original_canonical: Option<Option<String>>,
    pub original_schema: Option<Option<String>>,
    pub updated_at: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::activity_log)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActivityLogRecord {
    pub id: i64,
    pub level: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::activity_log)]
pub struct NewActivityLog<'a> {
    pub level: &'a str,
    pub message: &'a str,
    pub created_at: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::site_posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SitePostRecord {
    pub id: i64,
    pub post_type: String,
    pub slug: String,
    pub permalink: String,
    pub permalink_normalized: String,
    pub status: String,
    pub title: String,
    pub published_at: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::site_posts)]
pub struct NewSitePost<'a> {
    pub id: i64,
    pub post_type: &'a str,
    pub slug: &'a str,
    pub permalink: &'a str,
    pub permalink_normalized: &'a str,
    pub status: &'a str,
    pub title: &'a str,
    pub published_at: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::site_terms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SiteTermRecord {
    pub id: i64,
    pub taxonomy: String,
    pub slug: String,
    pub name: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::site_attachments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SiteAttachmentRecord {
    pub id: i64,
    pub url: String,
    pub url_normalized: String,
    pub title: String,
}
