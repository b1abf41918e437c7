use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{RiskAssessment, RiskFactor, RiskLevel};

const HIGH_RISK_KEYWORDS: &[(&str, u32)] = &[
    ("penalty", 10),
    ("termination", 9),
    ("terminate", 9),
    ("liability", 8),
    ("damages", 8),
    ("indemnify", 8),
    ("default", 7),
    ("breach", 7),
    ("forfeit", 9),
    ("sue", 9),
    ("lawsuit", 10),
    ("eviction", 10),
    ("foreclosure", 10),
    ("non-refundable", 7),
    ("liquidated damages", 9),
    ("attorney fees", 8),
    ("personal guarantee", 8),
    ("immediate termination", 10),
    ("without notice", 8),
    ("collection agency", 8),
    ("credit report", 7),
];

const MEDIUM_RISK_KEYWORDS: &[(&str, u32)] = &[
    ("notice", 4),
    ("maintenance", 3),
    ("interest", 5),
    ("dispute", 5),
    ("arbitration", 5),
    ("modify", 4),
    ("amendment", 4),
    ("inspection", 4),
    ("compliance", 5),
    ("audit", 5),
    ("confidential", 4),
    ("assignment", 5),
    ("renewal", 4),
    ("late fee", 6),
    ("deposit", 3),
    ("insurance required", 5),
    ("background check", 4),
    ("security deposit", 4),
    ("approval required", 5),
];

const LOW_RISK_KEYWORDS: &[(&str, u32)] = &[
    ("signature", 1),
    ("effective date", 1),
    ("definitions", 1),
    ("contact", 1),
    ("address", 1),
    ("business hours", 1),
    ("acknowledgment", 1),
    ("governing law", 2),
    ("entire agreement", 2),
    ("severability", 2),
];

/// Per obligation type, thresholds from most to least severe.
const NUMERIC_RISK_THRESHOLDS: &[(&str, &[(f64, RiskLevel)])] = &[
    ("percentage", &[(10.0, RiskLevel::High), (5.0, RiskLevel::Medium)]),
    ("days", &[(30.0, RiskLevel::High), (7.0, RiskLevel::Medium)]),
    ("money", &[(1000.0, RiskLevel::High), (100.0, RiskLevel::Medium)]),
];

const HIGH_SCORE: u32 = 20;
const MEDIUM_SCORE: u32 = 10;
const CONFIDENCE_SCALE: f64 = 25.0;
const NUMERIC_BONUS_PER_PRIORITY: u32 = 3;
const CONDITIONAL_BONUS: u32 = 2;
const RATIONALE_MAX_FACTORS: usize = 5;

#[derive(Debug)]
pub struct RiskScorer {
    numeric_value: Regex,
}

impl RiskScorer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            numeric_value: Regex::new(r"\d[\d,]*(?:\.\d+)?")
                .context("failed to compile numeric-value regex")?,
        })
    }

    pub fn level_for_score(score: u32) -> RiskLevel {
        if score >= HIGH_SCORE {
            RiskLevel::High
        } else if score >= MEDIUM_SCORE {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn assess(
        &self,
        text: &str,
        numeric_obligations: &[String],
        conditional_language: &[String],
        external: Option<RiskLevel>,
    ) -> RiskAssessment {
        let lowered = text.to_lowercase();
        let mut score = 0u32;
        let mut factors = Vec::<RiskFactor>::new();

        for table in [HIGH_RISK_KEYWORDS, MEDIUM_RISK_KEYWORDS, LOW_RISK_KEYWORDS] {
            for (keyword, weight) in table {
                if lowered.contains(keyword) {
                    score += weight;
                    factors.push(RiskFactor::Keyword {
                        keyword: keyword.to_string(),
                        weight: *weight,
                    });
                }
            }
        }

        if let Some((obligation, value, tier)) = self.highest_numeric_tier(numeric_obligations) {
            let bonus = tier.priority() * NUMERIC_BONUS_PER_PRIORITY;
            score += bonus;
            factors.push(RiskFactor::Numeric {
                obligation,
                value,
                tier,
                bonus,
            });
        }

        if !conditional_language.is_empty() {
            let contribution = conditional_language.len() as u32 * CONDITIONAL_BONUS;
            score += contribution;
            factors.push(RiskFactor::Conditional {
                count: conditional_language.len(),
                contribution,
            });
        }

        let base = Self::level_for_score(score);
        let mut level = base;
        let mut overridden = false;
        if let Some(opinion) = external {
            if opinion.priority() > base.priority() {
                level = opinion;
                overridden = true;
                factors.push(RiskFactor::ExternalOverride { level: opinion });
            }
        }

        let rationale = build_rationale(score, &factors, overridden.then_some(level));
        let confidence = (f64::from(score) / CONFIDENCE_SCALE).min(1.0);

        RiskAssessment {
            score,
            factors,
            level,
            confidence,
            rationale,
        }
    }

    /// Only the single most severe tier across all obligations is kept; earlier
    /// obligations win ties.
    fn highest_numeric_tier(&self, obligations: &[String]) -> Option<(String, f64, RiskLevel)> {
        let mut highest: Option<(String, f64, RiskLevel)> = None;

        for obligation in obligations {
            let Some((kind, value_text)) = obligation.split_once(':') else {
                continue;
            };
            let kind = kind.trim();
            let Some(thresholds) = NUMERIC_RISK_THRESHOLDS
                .iter()
                .find(|(name, _)| *name == kind)
                .map(|(_, thresholds)| *thresholds)
            else {
                continue;
            };
            let Some(value) = self.parse_value(value_text) else {
                continue;
            };

            let Some(tier) = thresholds
                .iter()
                .find(|(threshold, _)| value >= *threshold)
                .map(|(_, tier)| *tier)
            else {
                continue;
            };

            let replaces = highest
                .as_ref()
                .is_none_or(|(_, _, current)| tier.priority() > current.priority());
            if replaces {
                highest = Some((kind.to_string(), value, tier));
            }
        }

        highest
    }

    fn parse_value(&self, text: &str) -> Option<f64> {
        let matched = self.numeric_value.find(text)?;
        matched.as_str().replace(',', "").parse::<f64>().ok()
    }
}

fn build_rationale(score: u32, factors: &[RiskFactor], raised_to: Option<RiskLevel>) -> String {
    let listed = factors
        .iter()
        .filter(|factor| !matches!(factor, RiskFactor::ExternalOverride { .. }))
        .take(RATIONALE_MAX_FACTORS)
        .map(|factor| factor.to_string())
        .collect::<Vec<String>>();

    let mut rationale = if listed.is_empty() {
        format!("Score: {score}. No risk indicators found")
    } else {
        format!("Score: {score}. Factors: {}", listed.join(", "))
    };
    if let Some(level) = raised_to {
        rationale.push_str(&format!("; external opinion raised level to {level}"));
    }
    rationale
}
