//! URL slugs for catalog items and articles

use crate::db::Database;
use crate::error::Result;

/// Lowercases, keeps alphanumerics, collapses everything else into
/// single dashes
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Slug unique within `table`, suffixing a counter on collision.
/// `exclude_id` keeps a row's own slug valid while it is renamed.
pub async fn unique_slug(
    db: &Database,
    table: &str,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<String> {
    let base = slugify(name);
    let mut candidate = base.clone();
    let mut counter = 1u32;
    loop {
        let query = format!("SELECT id FROM {} WHERE slug = ? AND id <> ?", table);
        let taken: Option<(i64,)> = sqlx::query_as(&query)
            .bind(&candidate)
            .bind(exclude_id.unwrap_or(-1))
            .fetch_optional(db.pool())
            .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
        counter += 1;
        candidate = format!("{}-{}", base, counter);
    }
}
