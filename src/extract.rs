use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExtractionError;

const EDGE_LINE_MIN_REPEATS: usize = 3;
const EDGE_LINE_MAX_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionBackend {
    PlainText,
    Pdftotext,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageCleanup {
    pub header_lines_removed: usize,
    pub footer_lines_removed: usize,
    pub dehyphenation_merges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub backend: ExtractionBackend,
    pub page_count: usize,
    pub cleanup: PageCleanup,
    pub text: String,
}

/// Reads `.txt`/`.md` directly and converts `.pdf` through `pdftotext`. Pages are
/// stripped of repeated running headers/footers and hyphenated line breaks.
pub fn extract_text(path: &Path) -> Result<ExtractedText, ExtractionError> {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (backend, raw) = match extension.as_str() {
        "txt" | "text" | "md" => (
            ExtractionBackend::PlainText,
            fs::read_to_string(path).map_err(|source| ExtractionError::Io {
                path: path.to_path_buf(),
                source,
            })?,
        ),
        "pdf" => (ExtractionBackend::Pdftotext, run_pdftotext(path)?),
        _ => return Err(ExtractionError::UnsupportedFormat(path.to_path_buf())),
    };

    let mut pages = split_pages(&raw);
    let cleanup = clean_pages(&mut pages);
    let text = pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<&str>>()
        .join("\n\n");

    if non_whitespace_char_count(&text) == 0 {
        return Err(ExtractionError::EmptyExtraction(path.to_path_buf()));
    }

    info!(
        path = %path.display(),
        pages = pages.len(),
        headers_removed = cleanup.header_lines_removed,
        footers_removed = cleanup.footer_lines_removed,
        dehyphenated = cleanup.dehyphenation_merges,
        "extracted document text"
    );

    Ok(ExtractedText {
        backend,
        page_count: pages.len(),
        cleanup,
        text,
    })
}

pub fn command_available(program: &str) -> bool {
    Command::new(program).arg("-v").output().is_ok()
}

fn run_pdftotext(path: &Path) -> Result<String, ExtractionError> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg("1")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|source| ExtractionError::ToolFailed {
            tool: "pdftotext",
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractionError::ToolFailed {
            tool: "pdftotext",
            path: path.to_path_buf(),
            message: format!("exit status {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn split_pages(raw: &str) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|page| page.replace('\u{0000}', ""))
        .collect::<Vec<String>>();
    while pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn clean_pages(pages: &mut [String]) -> PageCleanup {
    let headers = repeated_edge_lines(pages, Edge::Top);
    let footers = repeated_edge_lines(pages, Edge::Bottom);
    let mut cleanup = PageCleanup::default();

    for page in pages.iter_mut() {
        let mut lines = page.lines().map(str::to_string).collect::<Vec<String>>();

        if let Some(index) = lines.iter().position(|line| !line.trim().is_empty()) {
            if headers.contains(&edge_key(&lines[index])) {
                lines.remove(index);
                cleanup.header_lines_removed += 1;
            }
        }
        if let Some(index) = lines.iter().rposition(|line| !line.trim().is_empty()) {
            if footers.contains(&edge_key(&lines[index])) {
                lines.remove(index);
                cleanup.footer_lines_removed += 1;
            }
        }

        let (joined, merges) = join_hyphenated_lines(lines);
        cleanup.dehyphenation_merges += merges;
        *page = joined.join("\n");
    }

    debug!(?cleanup, "page cleanup");
    cleanup
}

#[derive(Clone, Copy)]
enum Edge {
    Top,
    Bottom,
}

/// Edge lines seen on at least three pages are treated as running headers/footers.
fn repeated_edge_lines(pages: &[String], edge: Edge) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for page in pages {
        let mut lines = page.lines().map(str::trim).filter(|line| !line.is_empty());
        let candidate = match edge {
            Edge::Top => lines.next(),
            Edge::Bottom => lines.next_back(),
        };
        let Some(candidate) = candidate else {
            continue;
        };

        let key = edge_key(candidate);
        if key.is_empty() || key.len() > EDGE_LINE_MAX_CHARS {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count >= EDGE_LINE_MIN_REPEATS)
        .map(|(key, _)| key)
        .collect()
}

fn edge_key(line: &str) -> String {
    line.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn join_hyphenated_lines(lines: Vec<String>) -> (Vec<String>, usize) {
    let mut joined = Vec::<String>::with_capacity(lines.len());
    let mut merges = 0usize;
    let mut iter = lines.into_iter().peekable();

    while let Some(current) = iter.next() {
        let mergeable = iter
            .peek()
            .is_some_and(|next| is_hyphenated_break(&current, next));
        if mergeable {
            if let Some(next) = iter.next() {
                joined.push(format!(
                    "{}{}",
                    current.trim_end().trim_end_matches('-'),
                    next.trim_start()
                ));
                merges += 1;
                continue;
            }
        }
        joined.push(current);
    }

    (joined, merges)
}

/// `agree-` followed by `ment` on the next line, but not `non-` + `Refundable`.
fn is_hyphenated_break(current: &str, next: &str) -> bool {
    let left = current.trim_end();
    let Some(stem) = left.strip_suffix('-') else {
        return false;
    };
    let continues_lowercase = next
        .trim_start()
        .chars()
        .next()
        .is_some_and(|character| character.is_ascii_lowercase());
    continues_lowercase
        && stem
            .chars()
            .last()
            .is_some_and(|character| character.is_ascii_alphabetic())
}

fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}
