use anyhow::{Context, Result};
use regex::{Captures, Regex};

/// Legal terms and their everyday replacements. Multi-word phrases precede the single
/// words they contain.
const JARGON_REPLACEMENTS: &[(&str, &str)] = &[
    ("null and void", "completely cancelled"),
    ("pursuant to", "according to"),
    ("in lieu of", "instead of"),
    ("pro rata", "proportional"),
    ("force majeure", "uncontrollable events"),
    ("liable", "responsible"),
    ("liability", "responsibility"),
    ("breach", "break"),
    ("terminate", "end"),
    ("lessee", "tenant"),
    ("lessor", "landlord"),
    ("covenant", "promise"),
    ("indemnify", "protect from costs"),
    ("arbitration", "private dispute resolution"),
    ("whereas", "since"),
    ("thereof", "of it"),
    ("herein", "in this document"),
    ("notwithstanding", "despite"),
    ("forthwith", "immediately"),
    ("stipulate", "agree"),
    ("constitute", "make up"),
    ("deemed", "considered"),
    ("execute", "sign"),
    ("supersede", "replace"),
    ("void", "cancelled"),
];

#[derive(Debug)]
pub struct PlainLanguage {
    replacements: Vec<(Regex, &'static str)>,
}

impl PlainLanguage {
    pub fn new() -> Result<Self> {
        let replacements = JARGON_REPLACEMENTS
            .iter()
            .map(|(term, simple)| {
                let pattern = format!(r"(?i)\b{}\b", term.replace(' ', r"\s+"));
                Regex::new(&pattern)
                    .with_context(|| format!("failed to compile jargon regex {pattern}"))
                    .map(|regex| (regex, *simple))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { replacements })
    }

    /// Replaces jargon while keeping the casing style of the replaced word.
    pub fn simplify(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, simple) in &self.replacements {
            if !pattern.is_match(&result) {
                continue;
            }
            result = pattern
                .replace_all(&result, |captures: &Captures| {
                    let original = captures.get(0).map(|value| value.as_str()).unwrap_or("");
                    match_case(original, simple)
                })
                .into_owned();
        }
        result
    }
}

fn match_case(original: &str, simple: &str) -> String {
    if original.chars().any(char::is_uppercase) && !original.chars().any(char::is_lowercase) {
        return simple.to_uppercase();
    }
    if is_title_case(original) {
        return title_case(simple);
    }
    simple.to_string()
}

fn is_title_case(text: &str) -> bool {
    let mut any_word = false;
    for word in text.split_whitespace() {
        let mut letters = word.chars().filter(|character| character.is_alphabetic());
        match letters.next() {
            Some(first) if first.is_uppercase() => {}
            _ => return false,
        }
        if letters.any(char::is_uppercase) {
            return false;
        }
        any_word = true;
    }
    any_word
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                Some(first) => first.to_uppercase().chain(characters).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
