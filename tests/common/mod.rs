//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use clickrank::config::Settings;
use clickrank::models::{Attachment, Post, SiteExport, Taxonomy, Term};
use clickrank::App;
use tempfile::TempDir;

pub fn post(id: i64, slug: &str) -> Post {
    Post {
        id,
        post_type: "post".into(),
        slug: slug.into(),
        permalink: format!("https://example.com/{slug}/"),
        status: "publish".into(),
        title: slug.into(),
        published_at: None,
    }
}

pub fn export() -> SiteExport {
    SiteExport {
        posts: vec![post(1, "hello"), post(2, "about")],
        taxonomies: vec![Taxonomy {
            name: "category".into(),
            public: true,
        }],
        terms: vec![Term {
            id: 10,
            taxonomy: "category".into(),
            slug: "news".into(),
            name: "News".into(),
        }],
        attachments: vec![Attachment {
            id: 50,
            url: "https://example.com/wp-content/uploads/a.png".into(),
            title: "A".into(),
        }],
    }
}

pub fn settings(dir: &TempDir) -> Settings {
    Settings {
        site_url: "https://example.com".into(),
        api_key: Some("secret".into()),
        retry_backoff: Duration::from_millis(5),
        ..Settings::with_data_dir(dir.path().to_path_buf())
    }
}

/// Bootstrapped app over a fresh database with the test site imported.
pub async fn app_with(settings: Settings) -> App {
    let app = App::bootstrap(settings).await.unwrap();
    app.site.import(&export()).await.unwrap();
    app
}
