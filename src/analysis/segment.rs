use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::error::AnalysisError;

const ACCEPT_MIN_SEGMENTS: usize = 3;
const SCORE_MIN_BODY_CHARS: usize = 20;
const NUMBERED_MIN_BODY_CHARS: usize = 10;
const NUMBERED_RETRY_BODY_CHARS: usize = 50;
const LINE_MIN_BODY_CHARS: usize = 20;
const HEADED_MIN_BODY_CHARS: usize = 20;
const PARAGRAPH_MIN_CHARS: usize = 50;
const SHORT_TITLE_CHARS: usize = 50;
const FALLBACK_TITLE_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSegment {
    pub number: Option<String>,
    pub title: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Segmentation {
    pub method: &'static str,
    pub segments: Vec<RawSegment>,
}

pub trait SegmentStrategy {
    fn name(&self) -> &'static str;
    fn segment(&self, text: &str) -> Vec<RawSegment>;
}

/// Segments whose body is long enough to be a real clause.
pub fn segmentation_score(segments: &[RawSegment]) -> usize {
    segments
        .iter()
        .filter(|segment| segment.body.chars().count() > SCORE_MIN_BODY_CHARS)
        .count()
}

pub struct ClauseSegmenter {
    numbering_spacing: Regex,
    strategies: Vec<Box<dyn SegmentStrategy>>,
}

impl ClauseSegmenter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numbering_spacing: Regex::new(r"(?m)^([ \t]*\d+)[ \t]*\.[ \t]*([A-Z])")
                .context("failed to compile numbering-spacing regex")?,
            strategies: vec![
                Box::new(NumberedStrategy::new()?),
                Box::new(HeadedStrategy::section()?),
                Box::new(HeadedStrategy::article()?),
                Box::new(ParagraphStrategy),
            ],
        })
    }

    pub fn segment(&self, text: &str) -> Result<Segmentation, AnalysisError> {
        let prepared = self.numbering_spacing.replace_all(text, "$1. $2");

        let mut best: Option<(usize, Segmentation)> = None;
        for strategy in &self.strategies {
            let segments = strategy.segment(&prepared);
            tracing::debug!(
                strategy = strategy.name(),
                segments = segments.len(),
                "segmentation attempt"
            );
            if segments.len() >= ACCEPT_MIN_SEGMENTS {
                return Ok(Segmentation {
                    method: strategy.name(),
                    segments,
                });
            }
            if segments.is_empty() {
                continue;
            }

            let score = segmentation_score(&segments);
            let improves = match &best {
                Some((best_score, _)) => score > *best_score,
                None => true,
            };
            if improves {
                best = Some((
                    score,
                    Segmentation {
                        method: strategy.name(),
                        segments,
                    },
                ));
            }
        }

        best.map(|(_, segmentation)| segmentation)
            .ok_or(AnalysisError::Segmentation)
    }
}

/// `1. TITLE: body` clauses, with a line-by-line fallback for loosely formatted
/// numbering.
pub struct NumberedStrategy {
    heading: Regex,
    schedule: Regex,
    line_heading: Regex,
    capital_title: Regex,
    closing_line: Regex,
}

impl NumberedStrategy {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(
                r"(?m)^[ \t]*(\d{1,2})\.[ \t]*([A-Z][A-Z ()&/,'\-]*(?:[A-Z]\b|\)))[ \t]*[:.]?",
            )
            .context("failed to compile numbered-heading regex")?,
            schedule: Regex::new(r"(?m)^[ \t]*SCHEDULE").context("failed to compile schedule regex")?,
            line_heading: Regex::new(r"^[ \t]*(\d{1,2})\.[ \t]*([A-Z].*)$")
                .context("failed to compile numbered-line regex")?,
            capital_title: Regex::new(r"^([A-Z][A-Z ()&/,'\-]*(?:[A-Z]\b|\)))[ \t]*[:.]?[ \t]*(.*)$")
                .context("failed to compile capital-title regex")?,
            closing_line: Regex::new(r"^(?:SCHEDULE|WITNESS|IN WITNESS)")
                .context("failed to compile closing-line regex")?,
        })
    }

    fn segment_by_headings(&self, text: &str) -> Vec<RawSegment> {
        let headings = self.heading.captures_iter(text).collect::<Vec<_>>();
        let mut segments = Vec::new();

        for (index, captures) in headings.iter().enumerate() {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let mut title = captures.get(2).map(|value| value.as_str());
            let mut body_start = whole.end();
            if let Some(matched) = captures.get(2) {
                let keep = title_len_without_spill(matched.as_str(), &text[matched.end()..]);
                if keep < matched.as_str().len() {
                    title = Some(&matched.as_str()[..keep]);
                    body_start = matched.start() + keep;
                }
            }
            let end = headings
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map(|next| next.start())
                .unwrap_or(text.len());

            let mut region = &text[body_start..end];
            if let Some(schedule) = self.schedule.find(region) {
                region = &region[..schedule.start()];
            }

            let body = region.trim();
            if body.chars().count() <= NUMBERED_MIN_BODY_CHARS {
                continue;
            }

            segments.push(RawSegment {
                number: captures.get(1).map(|value| value.as_str().to_string()),
                title: title.map(|value| value.trim().to_string()),
                body: body.to_string(),
            });
        }

        segments
    }

    fn segment_by_lines(&self, text: &str) -> Vec<RawSegment> {
        let mut segments = Vec::new();
        let mut open: Option<(String, String, Vec<String>)> = None;

        for line in text.lines() {
            let stripped = line.trim();

            if let Some(captures) = self.line_heading.captures(line) {
                if let Some(previous) = open.take() {
                    push_line_segment(&mut segments, previous);
                }
                let number = captures
                    .get(1)
                    .map(|value| value.as_str().to_string())
                    .unwrap_or_default();
                let rest = captures.get(2).map(|value| value.as_str()).unwrap_or("");
                let (title, remainder) = self.split_line_title(rest);
                let mut body = Vec::new();
                if !remainder.is_empty() {
                    body.push(remainder);
                }
                open = Some((number, title, body));
                continue;
            }

            if self.closing_line.is_match(stripped) {
                if let Some(previous) = open.take() {
                    push_line_segment(&mut segments, previous);
                }
                continue;
            }

            if let Some((_, _, body)) = open.as_mut() {
                if !stripped.is_empty() {
                    body.push(stripped.to_string());
                }
            }
        }

        if let Some(previous) = open.take() {
            push_line_segment(&mut segments, previous);
        }

        segments
    }

    fn split_line_title(&self, rest: &str) -> (String, String) {
        if let Some(captures) = self.capital_title.captures(rest) {
            if let Some(matched) = captures.get(1) {
                let keep = title_len_without_spill(matched.as_str(), &rest[matched.end()..]);
                if keep < matched.as_str().len() {
                    return (
                        matched.as_str()[..keep].trim().to_string(),
                        rest[matched.start() + keep..].trim().to_string(),
                    );
                }
            }
            let title = captures.get(1).map(|value| value.as_str()).unwrap_or("");
            let remainder = captures.get(2).map(|value| value.as_str()).unwrap_or("");
            return (title.trim().to_string(), remainder.trim().to_string());
        }

        match title_delimiter(rest) {
            Some(position) => (
                rest[..position].trim().to_string(),
                rest[position + 1..].trim().to_string(),
            ),
            None => (rest.trim().to_string(), String::new()),
        }
    }
}

/// Length of a capitalised title once a trailing one-letter word (`I`, `A`) that runs
/// straight into a lower-case body word is handed back to the body.
fn title_len_without_spill(title: &str, following: &str) -> usize {
    let Some((head, last)) = title.rsplit_once(' ') else {
        return title.len();
    };
    let runs_into_body = following.starts_with([' ', '\t'])
        && following
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_lowercase);
    if last.len() == 1 && runs_into_body {
        head.trim_end().len()
    } else {
        title.len()
    }
}

/// Position of the `:` or sentence-ending `.` that closes an inline title. Decimal
/// points such as `$1,000.00` do not count.
fn title_delimiter(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((position, character)) = chars.next() {
        let next_is_break = chars
            .peek()
            .is_none_or(|(_, next)| next.is_whitespace());
        if character == ':' || (character == '.' && next_is_break) {
            return Some(position);
        }
    }
    None
}

fn push_line_segment(segments: &mut Vec<RawSegment>, open: (String, String, Vec<String>)) {
    let (number, title, body) = open;
    let body = body.join(" ").trim().to_string();
    if body.chars().count() <= LINE_MIN_BODY_CHARS {
        return;
    }
    segments.push(RawSegment {
        number: Some(number),
        title: (!title.is_empty()).then_some(title),
        body,
    });
}

impl SegmentStrategy for NumberedStrategy {
    fn name(&self) -> &'static str {
        "numbered"
    }

    fn segment(&self, text: &str) -> Vec<RawSegment> {
        let first = self.segment_by_headings(text);
        let needs_retry = first.is_empty()
            || first
                .iter()
                .all(|segment| segment.body.chars().count() < NUMBERED_RETRY_BODY_CHARS);
        if !needs_retry {
            return first;
        }

        let variant = self.segment_by_lines(text);
        if segmentation_score(&variant) < segmentation_score(&first) {
            first
        } else {
            variant
        }
    }
}

/// `Section n` / `Article n` headed documents. The header line carries the number and
/// an optional title; the body runs to the next header.
pub struct HeadedStrategy {
    name: &'static str,
    header: Regex,
}

impl HeadedStrategy {
    pub fn section() -> Result<Self> {
        Ok(Self {
            name: "section",
            header: Regex::new(r"(?im)^[ \t]*section[ \t]+(\d+(?:\.\d+)?)[ \t]*[\-:.]?[ \t]*(.*)$")
                .context("failed to compile section-header regex")?,
        })
    }

    pub fn article() -> Result<Self> {
        Ok(Self {
            name: "article",
            header: Regex::new(
                r"(?im)^[ \t]*article[ \t]+(\d+|[ivxlc]+)\b[ \t]*[\-:.]?[ \t]*(.*)$",
            )
            .context("failed to compile article-header regex")?,
        })
    }
}

impl SegmentStrategy for HeadedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn segment(&self, text: &str) -> Vec<RawSegment> {
        let headers = self.header.captures_iter(text).collect::<Vec<_>>();
        let mut segments = Vec::new();

        for (index, captures) in headers.iter().enumerate() {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let mut title = captures.get(2).map(|value| value.as_str());
            let mut body_start = whole.end();
            if let Some(matched) = captures.get(2) {
                let keep = title_len_without_spill(matched.as_str(), &text[matched.end()..]);
                if keep < matched.as_str().len() {
                    title = Some(&matched.as_str()[..keep]);
                    body_start = matched.start() + keep;
                }
            }
            let end = headers
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map(|next| next.start())
                .unwrap_or(text.len());

            let header_rest = captures.get(2).map(|value| value.as_str().trim()).unwrap_or("");
            let (title, inline_body) = match title_delimiter(header_rest) {
                Some(position) => (
                    header_rest[..position].trim(),
                    header_rest[position + 1..].trim(),
                ),
                None => (header_rest, ""),
            };

            let following = text[whole.end()..end].trim();
            let body = [inline_body, following]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<&str>>()
                .join("\n");
            if body.chars().count() <= HEADED_MIN_BODY_CHARS {
                continue;
            }

            segments.push(RawSegment {
                number: captures.get(1).map(|value| value.as_str().to_string()),
                title: (!title.is_empty()).then(|| title.to_string()),
                body,
            });
        }

        segments
    }
}

/// Blank-line delimited paragraphs; the last resort for unstructured text.
pub struct ParagraphStrategy;

impl SegmentStrategy for ParagraphStrategy {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn segment(&self, text: &str) -> Vec<RawSegment> {
        let mut segments = Vec::new();
        let mut current = Vec::<&str>::new();
        let mut paragraphs = Vec::<String>::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(current.join("\n"));
                    current.clear();
                }
                continue;
            }
            current.push(line.trim());
        }
        if !current.is_empty() {
            paragraphs.push(current.join("\n"));
        }

        for paragraph in paragraphs {
            if paragraph.chars().count() <= PARAGRAPH_MIN_CHARS {
                continue;
            }
            let ordinal = segments.len() + 1;
            let first_sentence = paragraph.split('.').next().unwrap_or("").trim();
            let title = if first_sentence.chars().count() < SHORT_TITLE_CHARS {
                first_sentence.to_string()
            } else {
                format!("Clause {ordinal}")
            };
            segments.push(RawSegment {
                number: None,
                title: Some(title),
                body: paragraph,
            });
        }

        segments
    }
}

/// Short titles are upper-cased for display; missing titles fall back to the first
/// words of the body.
pub fn display_title(title: Option<&str>, body: &str) -> String {
    match title.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) if value.chars().count() < SHORT_TITLE_CHARS => value.to_uppercase(),
        Some(value) => value.to_string(),
        None => body
            .split_whitespace()
            .take(FALLBACK_TITLE_WORDS)
            .collect::<Vec<&str>>()
            .join(" "),
    }
}

/// Builds document-scoped clause ids in segment order.
pub fn assign_clause_ids(document_name: &str, segments: &[RawSegment]) -> Vec<String> {
    let mut seen_numbers = HashSet::<&str>::new();
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let ordinal = index + 1;
            match segment.number.as_deref() {
                Some(number) if seen_numbers.insert(number) => {
                    format!("{document_name}_clause_{number}")
                }
                Some(number) => format!("{document_name}_clause_{number}_{ordinal}"),
                None => format!("{document_name}_clause_{ordinal}"),
            }
        })
        .collect()
}
