/// Inline SQL migrations for the forum-harvest schema.
///
/// One statement per entry; the position in the list is the version.
pub const MIGRATIONS: &[&str] = &[
    // Migration 1: scraped records, partitioned by forum
    r#"
CREATE TABLE IF NOT EXISTS records (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    forum      TEXT NOT NULL,
    payload    TEXT NOT NULL,
    scraped_at INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_records_forum ON records(forum, id);"#,
];
