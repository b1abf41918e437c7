use anyhow::{Context, Result};
use regex::Regex;

/// Mojibake left behind by UTF-8 text decoded as Windows-1252, plus typographic
/// punctuation folded to ASCII. Longer sequences come first.
const ENCODING_FIXES: &[(&str, &str)] = &[
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€”", "-"),
    ("â€“", "-"),
    ("â€¢", "•"),
    ("â€¦", "..."),
    ("\u{201c}", "\""),
    ("\u{201d}", "\""),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{2026}", "..."),
    ("\u{00a0}", " "),
];

const BOILERPLATE_PATTERNS: &[&str] = &[
    r"^page\s+\d+(?:\s+of\s+\d+)?$",
    r"^\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}$",
    r"^[a-z\s]+\s+\d{4}$",
    r"^[\-_=*]{5,}$",
    r"^\[?signature\]?$",
    r"^confidential$",
    r"^draft$",
    r"^exhibit\s+[a-z0-9]+\s*:?$",
    r"^appendix\s+[a-z0-9]+\s*:?$",
];

const MIN_LINE_WORDS: usize = 3;
const MERGE_MAX_WORDS: usize = 10;
const MIN_ALPHA_RATIO: f64 = 0.2;
const TERMINAL_PUNCTUATION: &[char] = &['.', ':', ')', ';', '!', '?'];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Text(String),
    Break,
}

#[derive(Debug)]
pub struct TextNormalizer {
    protected: Regex,
    boilerplate: Vec<Regex>,
    numbered: Regex,
    financial: Regex,
    structural: Regex,
    dot_run: Regex,
    money_or_percent: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        let boilerplate = BOILERPLATE_PATTERNS
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){pattern}"))
                    .with_context(|| format!("failed to compile boilerplate regex {pattern}"))
            })
            .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            protected: Regex::new(
                r"(?i)\$\d|\d+(?:\.\d+)?%|\d+\s*(?:days?|months?|years?)\b|shall|must|liable|penalty|fee|terminate|breach|default",
            )
            .context("failed to compile protected-indicator regex")?,
            boilerplate,
            numbered: Regex::new(r"^\d+[.)]").context("failed to compile numbered-line regex")?,
            financial: Regex::new(r"(?i)\$|\d+(?:\.\d+)?%|\d+\s*(?:days?|months?)")
                .context("failed to compile financial-content regex")?,
            structural: Regex::new(r"(?i)^(?:section|article)\s+[0-9ivxlc]+|^SCHEDULE")
                .context("failed to compile structural-heading regex")?,
            dot_run: Regex::new(r"\.{3,}").context("failed to compile dot-run regex")?,
            money_or_percent: Regex::new(r"\$|\d+%")
                .context("failed to compile money/percent regex")?,
        })
    }

    /// Clean raw extracted text. The result is a fixpoint: normalizing it again
    /// returns it unchanged.
    pub fn normalize(&self, raw: &str) -> String {
        let fixed = fix_encoding(raw);
        let mut current = self.clean_once(&fixed);
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    pub fn is_protected(&self, line: &str) -> bool {
        self.protected.is_match(line)
    }

    pub fn is_boilerplate(&self, line: &str) -> bool {
        let text = line.trim();
        if self.is_protected(text) {
            return false;
        }

        let lowered = text.to_lowercase();
        if self
            .boilerplate
            .iter()
            .any(|pattern| pattern.is_match(&lowered))
        {
            return true;
        }

        if word_count(text) < MIN_LINE_WORDS && !self.numbered.is_match(text) && !is_all_caps(text)
        {
            return true;
        }

        alpha_ratio(text) < MIN_ALPHA_RATIO && !self.money_or_percent.is_match(text)
    }

    fn clean_once(&self, text: &str) -> String {
        let mut lines = Vec::<Line>::new();
        for raw_line in text.lines() {
            let trimmed = raw_line.trim();
            if trimmed.is_empty() {
                lines.push(Line::Break);
                continue;
            }

            let collapsed = trimmed.split_whitespace().collect::<Vec<&str>>().join(" ");
            let collapsed = self.dot_run.replace_all(&collapsed, "...").into_owned();
            if self.is_boilerplate(&collapsed) {
                continue;
            }
            lines.push(Line::Text(collapsed));
        }

        let mut lines = collapse_breaks(lines);
        loop {
            let (merged, merges) = self.merge_pass(lines);
            lines = merged;
            if merges == 0 {
                break;
            }
        }

        lines
            .into_iter()
            .map(|line| match line {
                Line::Text(text) => text,
                Line::Break => String::new(),
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn merge_pass(&self, lines: Vec<Line>) -> (Vec<Line>, usize) {
        let mut merged = Vec::<Line>::with_capacity(lines.len());
        let mut merges = 0usize;
        let mut iter = lines.into_iter().peekable();

        while let Some(line) = iter.next() {
            let Line::Text(current) = line else {
                merged.push(Line::Break);
                continue;
            };

            let joinable = match iter.peek() {
                Some(Line::Text(next)) => self.should_merge(&current, next),
                _ => false,
            };

            if joinable {
                if let Some(Line::Text(next)) = iter.next() {
                    merged.push(Line::Text(format!("{current} {next}")));
                    merges += 1;
                    continue;
                }
            }

            merged.push(Line::Text(current));
        }

        (merged, merges)
    }

    fn should_merge(&self, current: &str, next: &str) -> bool {
        word_count(current) < MERGE_MAX_WORDS
            && !current.ends_with(TERMINAL_PUNCTUATION)
            && !is_all_caps(current)
            && !self.financial.is_match(current)
            && !self.numbered.is_match(current)
            && !self.structural.is_match(current)
            && !is_all_caps(next)
            && !self.numbered.is_match(next)
            && !self.structural.is_match(next)
    }
}

fn fix_encoding(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
    for (bad, good) in ENCODING_FIXES {
        if text.contains(bad) {
            text = text.replace(bad, good);
        }
    }
    text
}

fn collapse_breaks(lines: Vec<Line>) -> Vec<Line> {
    let mut out = Vec::<Line>::with_capacity(lines.len());
    for line in lines {
        if line == Line::Break && matches!(out.last(), None | Some(Line::Break)) {
            continue;
        }
        out.push(line);
    }
    while out.last() == Some(&Line::Break) {
        out.pop();
    }
    out
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// At least one cased letter and no lowercase letters.
pub fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

fn alpha_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let alpha = text
        .chars()
        .filter(|character| character.is_ascii_alphabetic() || character.is_whitespace())
        .count();
    alpha as f64 / total as f64
}
