//! Shared output helpers for CLI commands.

use console::style;

use crate::models::SeoRecord;
use crate::services::Outcome;

/// Print a successful apply or revert.
pub fn print_outcome(outcome: &Outcome) {
    println!("{} {}", style("✓").green(), outcome.message);
    println!("  Content: {}", outcome.content);
    if !outcome.fields.is_empty() {
        println!("  Fields: {}", outcome.fields.join(", "));
    }
    if let Some(count) = outcome.count {
        println!("  Images: {}", count);
    }
    if let Some(id) = outcome.url_record_id {
        println!("  URL record: {}", id);
    }
    if outcome.url_table_only {
        println!("  {}", style("URL table only").dim());
    }
}

/// Print one SEO table row with its backups.
pub fn print_record(record: &SeoRecord) {
    println!("{} {}", style("→").cyan(), record.url);
    println!("  Normalized: {}", record.url_normalized);
    if let Some(id) = record.resolved_entity_id {
        println!("  Post ID: {}", id);
    }
    print_field("Title", record.title.as_deref(), record.original_title.as_deref());
    print_field(
        "Description",
        record.description.as_deref(),
        record.original_description.as_deref(),
    );
    print_field(
        "Canonical",
        record.canonical_url.as_deref(),
        record.original_canonical.as_deref(),
    );
    print_field("Schema", record.schema.as_deref(), record.original_schema.as_deref());
    println!("  Updated: {}", record.updated_at.to_rfc3339());
}

fn print_field(label: &str, current: Option<&str>, original: Option<&str>) {
    let Some(current) = current.filter(|v| !v.is_empty()) else {
        return;
    };
    println!("  {}: {}", label, truncate(current, 100));
    if let Some(original) = original.filter(|v| !v.is_empty()) {
        println!("    {} {}", style("was:").dim(), truncate(original, 100));
    }
}

/// Shorten to `max` characters with an ellipsis.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
