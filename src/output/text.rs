//! Plain-text rendering of jobs for the terminal
//!
//! Produces the listing table and the per-job report printed by the CLI.

use crate::storage::{BrokenLinkRecord, CrawlJob};

/// Widest URL shown in the listing before it is shortened
const URL_COLUMN_WIDTH: usize = 48;

/// Formats one page of jobs as a fixed-width table
pub fn format_job_table(jobs: &[CrawlJob], total: u64, page: u32, limit: u32) -> String {
    let mut out = String::new();

    if jobs.is_empty() {
        out.push_str("No jobs found.\n");
        return out;
    }

    out.push_str(&format!(
        "{:>6}  {:<10}  {:<width$}  {:>5}  {:>5}  {:>6}  {}\n",
        "ID",
        "STATUS",
        "URL",
        "INT",
        "EXT",
        "BROKEN",
        "TITLE",
        width = URL_COLUMN_WIDTH
    ));

    for job in jobs {
        out.push_str(&format!(
            "{:>6}  {:<10}  {:<width$}  {:>5}  {:>5}  {:>6}  {}\n",
            job.id,
            job.status.to_db_string(),
            shorten(&job.url, URL_COLUMN_WIDTH),
            job.profile.internal_links,
            job.profile.external_links,
            job.broken_links,
            job.profile.page_title,
            width = URL_COLUMN_WIDTH
        ));
    }

    let pages = total.div_ceil(u64::from(limit.max(1)));
    out.push_str(&format!(
        "\nPage {} of {} ({} jobs)\n",
        page,
        pages.max(1),
        total
    ));

    out
}

/// Formats the full report for one job
pub fn format_job_details(job: &CrawlJob, broken: &[BrokenLinkRecord]) -> String {
    let mut out = String::new();
    let profile = &job.profile;

    out.push_str(&format!("Job {}: {}\n", job.id, job.url));
    out.push_str(&format!("  Status:        {}\n", job.status));
    out.push_str(&format!("  Created:       {}\n", job.created_at));
    if let Some(started) = &job.started_at {
        out.push_str(&format!("  Started:       {}\n", started));
    }
    if let Some(completed) = &job.completed_at {
        out.push_str(&format!("  Completed:     {}\n", completed));
    }
    if let Some(error) = &job.error_message {
        out.push_str(&format!("  Error:         {}\n", error));
    }
    out.push_str(&format!(
        "  Inbound links: {}{}\n",
        job.inbound_internal_links,
        if job.is_orphan { " (orphan)" } else { "" }
    ));

    if job.status != crate::state::JobStatus::Completed {
        return out;
    }

    out.push_str("\nPage\n");
    out.push_str(&format!("  HTML version:  {}\n", profile.html_version));
    out.push_str(&format!("  Title:         {}\n", profile.page_title));
    out.push_str(&format!("  Meta title:    {}\n", profile.meta_title));
    out.push_str(&format!("  Description:   {}\n", profile.meta_description));
    out.push_str(&format!("  Canonical:     {}\n", profile.canonical));
    out.push_str(&format!(
        "  Login form:    {}\n",
        if profile.has_login_form { "yes" } else { "no" }
    ));

    let headings = profile
        .heading_counts()
        .iter()
        .enumerate()
        .map(|(i, count)| format!("h{}={}", i + 1, count))
        .collect::<Vec<_>>()
        .join(" ");
    out.push_str(&format!("  Headings:      {}\n", headings));

    out.push_str("\nLinks\n");
    out.push_str(&format!("  Internal:      {}\n", profile.internal_links));
    out.push_str(&format!("  External:      {}\n", profile.external_links));
    out.push_str(&format!("  Broken:        {}\n", job.broken_links));
    for link in broken {
        match &link.error {
            Some(error) => out.push_str(&format!("    [{}] {} ({})\n", link.status_code, link.url, error)),
            None => out.push_str(&format!("    [{}] {}\n", link.status_code, link.url)),
        }
    }

    if !profile.images_missing_alt.is_empty() {
        out.push_str(&format!(
            "\nImages missing alt text ({})\n",
            profile.images_missing_alt.len()
        ));
        for src in &profile.images_missing_alt {
            out.push_str(&format!("    {}\n", src));
        }
    }

    out.push_str("\nStructured data\n");
    for (label, present, snippet) in [
        ("JSON-LD", profile.has_jsonld, &profile.jsonld_snippet),
        ("Microdata", profile.has_microdata, &profile.microdata_snippet),
        ("RDFa", profile.has_rdfa, &profile.rdfa_snippet),
    ] {
        if present {
            out.push_str(&format!("  {}: {}\n", label, snippet));
        } else {
            out.push_str(&format!("  {}: none\n", label));
        }
    }

    out
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
