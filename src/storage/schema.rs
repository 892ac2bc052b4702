//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Pagescope database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawl job; the page profile is flattened into columns
CREATE TABLE IF NOT EXISTS crawl_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    url TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'queued',
    attempt INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT,
    error_message TEXT,
    html_version TEXT NOT NULL DEFAULT '',
    page_title TEXT NOT NULL DEFAULT '',
    h1_count INTEGER NOT NULL DEFAULT 0,
    h2_count INTEGER NOT NULL DEFAULT 0,
    h3_count INTEGER NOT NULL DEFAULT 0,
    h4_count INTEGER NOT NULL DEFAULT 0,
    h5_count INTEGER NOT NULL DEFAULT 0,
    h6_count INTEGER NOT NULL DEFAULT 0,
    internal_links INTEGER NOT NULL DEFAULT 0,
    external_links INTEGER NOT NULL DEFAULT 0,
    broken_links INTEGER NOT NULL DEFAULT 0,
    has_login_form INTEGER NOT NULL DEFAULT 0,
    meta_title TEXT NOT NULL DEFAULT '',
    meta_description TEXT NOT NULL DEFAULT '',
    canonical TEXT NOT NULL DEFAULT '',
    images_missing_alt TEXT NOT NULL DEFAULT '[]',
    has_jsonld INTEGER NOT NULL DEFAULT 0,
    has_microdata INTEGER NOT NULL DEFAULT 0,
    has_rdfa INTEGER NOT NULL DEFAULT 0,
    jsonld_snippet TEXT NOT NULL DEFAULT '',
    microdata_snippet TEXT NOT NULL DEFAULT '',
    rdfa_snippet TEXT NOT NULL DEFAULT '',
    inbound_internal_links INTEGER NOT NULL DEFAULT 0,
    is_orphan INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_crawl_jobs_user ON crawl_jobs(user_id);
CREATE INDEX IF NOT EXISTS idx_crawl_jobs_status ON crawl_jobs(status);

-- Links that failed their health check
CREATE TABLE IF NOT EXISTS broken_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_job_id INTEGER NOT NULL REFERENCES crawl_jobs(id),
    url TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    error TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_broken_links_job ON broken_links(crawl_job_id);

-- Internal links discovered on each job's page
CREATE TABLE IF NOT EXISTS internal_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_job_id INTEGER NOT NULL REFERENCES crawl_jobs(id),
    to_url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_internal_links_from ON internal_links(from_job_id);
CREATE INDEX IF NOT EXISTS idx_internal_links_to ON internal_links(to_url);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
