// crates/db/src/queries/mod.rs
// Record queries for the forum-harvest SQLite database.

mod records;
