//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{BrokenLinkInfo, PageProfile};
use crate::state::JobStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{BrokenLinkRecord, CrawlJob, JobQuery};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

/// Columns selected for every `CrawlJob`, in `job_from_row` order
const JOB_COLUMNS: &str = "id, user_id, url, status, attempt, created_at, started_at,
    completed_at, error_message, html_version, page_title, h1_count, h2_count, h3_count,
    h4_count, h5_count, h6_count, internal_links, external_links, broken_links,
    has_login_form, meta_title, meta_description, canonical, images_missing_alt,
    has_jsonld, has_microdata, has_rdfa, jsonld_snippet, microdata_snippet, rdfa_snippet,
    inbound_internal_links, is_orphan";

/// Timestamps are fixed-width RFC 3339 so that text ordering is time ordering
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, message.into())
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlJob> {
    let status: String = row.get(3)?;
    let status = JobStatus::from_db_string(&status)
        .ok_or_else(|| conversion_error(3, format!("unknown job status '{}'", status)))?;

    let missing_alt: String = row.get(24)?;
    let images_missing_alt: Vec<String> = serde_json::from_str(&missing_alt)
        .map_err(|e| conversion_error(24, format!("invalid images_missing_alt: {}", e)))?;

    Ok(CrawlJob {
        id: row.get(0)?,
        user_id: row.get(1)?,
        url: row.get(2)?,
        status,
        attempt: row.get(4)?,
        created_at: row.get(5)?,
        started_at: row.get(6)?,
        completed_at: row.get(7)?,
        error_message: row.get(8)?,
        profile: PageProfile {
            html_version: row.get(9)?,
            page_title: row.get(10)?,
            h1_count: row.get(11)?,
            h2_count: row.get(12)?,
            h3_count: row.get(13)?,
            h4_count: row.get(14)?,
            h5_count: row.get(15)?,
            h6_count: row.get(16)?,
            internal_links: row.get(17)?,
            external_links: row.get(18)?,
            has_login_form: row.get(20)?,
            meta_title: row.get(21)?,
            meta_description: row.get(22)?,
            canonical: row.get(23)?,
            images_missing_alt,
            has_jsonld: row.get(25)?,
            has_microdata: row.get(26)?,
            has_rdfa: row.get(27)?,
            jsonld_snippet: row.get(28)?,
            microdata_snippet: row.get(29)?,
            rdfa_snippet: row.get(30)?,
        },
        broken_links: row.get(19)?,
        inbound_internal_links: row.get(31)?,
        is_orphan: row.get(32)?,
    })
}

/// Writes the profile of a running attempt, returning the number of rows changed
fn write_completion(
    conn: &Connection,
    id: i64,
    attempt: i64,
    profile: &PageProfile,
    broken_links: u32,
) -> StorageResult<usize> {
    let missing_alt = serde_json::to_string(&profile.images_missing_alt)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let updated = conn.execute(
        "UPDATE crawl_jobs SET
            status = ?1, completed_at = ?2, error_message = NULL,
            html_version = ?3, page_title = ?4,
            h1_count = ?5, h2_count = ?6, h3_count = ?7,
            h4_count = ?8, h5_count = ?9, h6_count = ?10,
            internal_links = ?11, external_links = ?12, broken_links = ?13,
            has_login_form = ?14, meta_title = ?15, meta_description = ?16,
            canonical = ?17, images_missing_alt = ?18,
            has_jsonld = ?19, has_microdata = ?20, has_rdfa = ?21,
            jsonld_snippet = ?22, microdata_snippet = ?23, rdfa_snippet = ?24
         WHERE id = ?25 AND attempt = ?26 AND status = ?27",
        params![
            JobStatus::Completed.to_db_string(),
            now(),
            profile.html_version,
            profile.page_title,
            profile.h1_count,
            profile.h2_count,
            profile.h3_count,
            profile.h4_count,
            profile.h5_count,
            profile.h6_count,
            profile.internal_links,
            profile.external_links,
            broken_links,
            profile.has_login_form,
            profile.meta_title,
            profile.meta_description,
            profile.canonical,
            missing_alt,
            profile.has_jsonld,
            profile.has_microdata,
            profile.has_rdfa,
            profile.jsonld_snippet,
            profile.microdata_snippet,
            profile.rdfa_snippet,
            id,
            attempt,
            JobStatus::Running.to_db_string(),
        ],
    )?;

    Ok(updated)
}

fn write_broken_link(
    conn: &Connection,
    job_id: i64,
    url: &str,
    status_code: u16,
    error: Option<&str>,
) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO broken_links (crawl_job_id, url, status_code, error, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![job_id, url, status_code, error, now()],
    )?;
    Ok(())
}

fn write_edges(conn: &Connection, job_id: i64, to_urls: &[String]) -> StorageResult<()> {
    conn.execute(
        "DELETE FROM internal_links WHERE from_job_id = ?1",
        params![job_id],
    )?;
    let mut stmt = conn.prepare("INSERT INTO internal_links (from_job_id, to_url) VALUES (?1, ?2)")?;
    for url in to_urls {
        stmt.execute(params![job_id, url])?;
    }
    Ok(())
}

/// Escapes `%`, `_` and `\` so user text matches literally in `LIKE ... ESCAPE '\'`
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and initializes the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_jobs(&self, sql: &str, values: &[Value]) -> StorageResult<Vec<CrawlJob>> {
        let mut stmt = self.conn.prepare(sql)?;
        let jobs = stmt
            .query_map(params_from_iter(values.iter()), job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

impl Storage for SqliteStorage {
    // ===== Job Management =====

    fn create_job(&mut self, owner: i64, url: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO crawl_jobs (user_id, url, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![owner, url, JobStatus::Queued.to_db_string(), now()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_job(&self, id: i64, owner: i64) -> StorageResult<CrawlJob> {
        let sql = format!(
            "SELECT {} FROM crawl_jobs WHERE id = ?1 AND user_id = ?2",
            JOB_COLUMNS
        );
        self.query_jobs(&sql, &[Value::Integer(id), Value::Integer(owner)])?
            .into_iter()
            .next()
            .ok_or(StorageError::JobNotFound(id))
    }

    fn list_jobs(&self, owner: i64, query: &JobQuery) -> StorageResult<(Vec<CrawlJob>, u64)> {
        let mut filter = String::from("user_id = ?");
        let mut values = vec![Value::Integer(owner)];

        if let Some(status) = query.status {
            filter.push_str(" AND status = ?");
            values.push(Value::Text(status.to_db_string().to_string()));
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            filter.push_str(" AND (url LIKE ? ESCAPE '\\' OR page_title LIKE ? ESCAPE '\\')");
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM crawl_jobs WHERE {}", filter),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        // Sort column and direction come from enums, never from user text
        let sql = format!(
            "SELECT {} FROM crawl_jobs WHERE {} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
            JOB_COLUMNS,
            filter,
            query.sort_by.column(),
            query.order.keyword(),
            query.order.keyword()
        );
        values.push(Value::Integer(i64::from(query.limit())));
        values.push(Value::Integer(query.offset() as i64));

        let jobs = self.query_jobs(&sql, &values)?;
        Ok((jobs, total as u64))
    }

    fn list_jobs_for_user(&self, owner: i64) -> StorageResult<Vec<CrawlJob>> {
        let sql = format!(
            "SELECT {} FROM crawl_jobs WHERE user_id = ?1 ORDER BY id ASC",
            JOB_COLUMNS
        );
        self.query_jobs(&sql, &[Value::Integer(owner)])
    }

    fn mark_running(&mut self, id: i64) -> StorageResult<i64> {
        let updated = self.conn.execute(
            "UPDATE crawl_jobs
             SET status = ?1, started_at = ?2, completed_at = NULL, error_message = NULL,
                 attempt = attempt + 1
             WHERE id = ?3",
            params![JobStatus::Running.to_db_string(), now(), id],
        )?;
        if updated == 0 {
            return Err(StorageError::JobNotFound(id));
        }

        let attempt = self.conn.query_row(
            "SELECT attempt FROM crawl_jobs WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(attempt)
    }

    fn complete_job(
        &mut self,
        id: i64,
        attempt: i64,
        profile: &PageProfile,
        broken_links: u32,
    ) -> StorageResult<bool> {
        Ok(write_completion(&self.conn, id, attempt, profile, broken_links)? > 0)
    }

    fn complete_crawl(
        &mut self,
        id: i64,
        attempt: i64,
        profile: &PageProfile,
        broken: &[BrokenLinkInfo],
        internal_targets: &[String],
    ) -> StorageResult<bool> {
        let tx = self.conn.transaction()?;

        if write_completion(&tx, id, attempt, profile, broken.len() as u32)? == 0 {
            return Ok(false);
        }
        for link in broken {
            write_broken_link(&tx, id, &link.url, link.status_code, link.error.as_deref())?;
        }
        write_edges(&tx, id, internal_targets)?;

        tx.commit()?;
        Ok(true)
    }

    fn fail_job(
        &mut self,
        id: i64,
        attempt: i64,
        status: JobStatus,
        message: Option<&str>,
    ) -> StorageResult<bool> {
        let updated = self.conn.execute(
            "UPDATE crawl_jobs SET status = ?1, error_message = ?2, completed_at = ?3
             WHERE id = ?4 AND attempt = ?5 AND status = ?6",
            params![
                status.to_db_string(),
                message,
                now(),
                id,
                attempt,
                JobStatus::Running.to_db_string(),
            ],
        )?;
        Ok(updated > 0)
    }

    fn reset_job(&mut self, id: i64) -> StorageResult<()> {
        // Graph fields (inbound count, orphan flag) describe other jobs' links
        // and survive a reset
        self.conn.execute(
            "UPDATE crawl_jobs SET
                status = ?1, error_message = NULL, started_at = NULL, completed_at = NULL,
                html_version = '', page_title = '',
                h1_count = 0, h2_count = 0, h3_count = 0, h4_count = 0, h5_count = 0, h6_count = 0,
                internal_links = 0, external_links = 0, broken_links = 0,
                has_login_form = 0, meta_title = '', meta_description = '', canonical = '',
                images_missing_alt = '[]', has_jsonld = 0, has_microdata = 0, has_rdfa = 0,
                jsonld_snippet = '', microdata_snippet = '', rdfa_snippet = ''
             WHERE id = ?2",
            params![JobStatus::Queued.to_db_string(), id],
        )?;
        Ok(())
    }

    fn delete_jobs(&mut self, ids: &[i64], owner: i64) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut deleted = 0;

        for &id in ids {
            let owned: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM crawl_jobs WHERE id = ?1 AND user_id = ?2)",
                params![id, owner],
                |row| row.get(0),
            )?;
            if !owned {
                continue;
            }

            tx.execute("DELETE FROM broken_links WHERE crawl_job_id = ?1", params![id])?;
            tx.execute("DELETE FROM internal_links WHERE from_job_id = ?1", params![id])?;
            deleted += tx.execute("DELETE FROM crawl_jobs WHERE id = ?1", params![id])?;
        }

        tx.commit()?;
        Ok(deleted)
    }

    fn update_link_stats(&mut self, id: i64, inbound: u64, is_orphan: bool) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE crawl_jobs SET inbound_internal_links = ?1, is_orphan = ?2 WHERE id = ?3",
            params![inbound as i64, is_orphan, id],
        )?;
        Ok(())
    }

    // ===== Broken Links =====

    fn insert_broken_link(
        &mut self,
        job_id: i64,
        url: &str,
        status_code: u16,
        error: Option<&str>,
    ) -> StorageResult<()> {
        write_broken_link(&self.conn, job_id, url, status_code, error)
    }

    fn get_broken_links(&self, job_id: i64) -> StorageResult<Vec<BrokenLinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, crawl_job_id, url, status_code, error, created_at
             FROM broken_links WHERE crawl_job_id = ?1 ORDER BY id ASC",
        )?;

        let links = stmt
            .query_map(params![job_id], |row| {
                Ok(BrokenLinkRecord {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    url: row.get(2)?,
                    status_code: row.get(3)?,
                    error: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn delete_broken_links(&mut self, job_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM broken_links WHERE crawl_job_id = ?1",
            params![job_id],
        )?;
        Ok(())
    }

    // ===== Internal Link Graph =====

    fn replace_internal_links(&mut self, job_id: i64, to_urls: &[String]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        write_edges(&tx, job_id, to_urls)?;
        tx.commit()?;
        Ok(())
    }

    fn count_inbound(&self, url: &str, excluding_job: i64, owner: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM internal_links l
             JOIN crawl_jobs j ON j.id = l.from_job_id
             WHERE l.to_url = ?1 AND l.from_job_id != ?2 AND j.user_id = ?3",
            params![url, excluding_job, owner],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
