use std::time::Duration;

use super::*;

fn no_wait_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::ZERO,
    }
}

fn request(text: &str) -> SummaryRequest<'_> {
    SummaryRequest {
        text,
        clause_type: None,
        entities: &[],
        obligations: &[],
    }
}

struct Flaky {
    failures_left: usize,
}

impl ChunkSummarizer for Flaky {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn summarize_chunk(
        &mut self,
        request: &SummaryRequest<'_>,
    ) -> Result<ChunkResult, SummarizerError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SummarizerError::Transient("rate limited".to_string()));
        }
        Ok(ChunkResult {
            plain_english: format!("Summary of {}", request.text),
            user_impact: "You must comply.".to_string(),
            risk: RiskLevel::Low,
            confidence: None,
            reasoning: None,
        })
    }
}

#[test]
fn parse_accepts_fenced_json_with_surrounding_text() {
    let response = "Here you go:\n```json\n{\"plain_english\": \"You pay $500.\", \
\"user_impact\": \"Pay on time.\", \"risk\": \"high\", \"confidence\": 0.7}\n```";
    let parsed = parse_summary_response(response).expect("parse");
    assert_eq!(parsed.plain_english, "You pay $500.");
    assert_eq!(parsed.risk, RiskLevel::High);
    assert_eq!(parsed.confidence, Some(0.7));
    assert_eq!(parsed.reasoning, None);
}

#[test]
fn parse_maps_unknown_risk_label_to_medium() {
    let response = r#"{"plain_english": "x y z", "user_impact": "none", "risk": "severe"}"#;
    let parsed = parse_summary_response(response).expect("parse");
    assert_eq!(parsed.risk, RiskLevel::Medium);
}

#[test]
fn parse_rejects_missing_required_fields() {
    let response = r#"{"plain_english": "x", "risk": "Low"}"#;
    assert!(matches!(
        parse_summary_response(response),
        Err(SummarizerError::Parse(_))
    ));
    assert!(matches!(
        parse_summary_response("no json here"),
        Err(SummarizerError::Parse(_))
    ));
}

#[test]
fn backoff_doubles_from_initial_delay() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff_for(0), Duration::from_millis(1000));
    assert_eq!(policy.backoff_for(1), Duration::from_millis(2000));
    assert_eq!(policy.backoff_for(2), Duration::from_millis(4000));
}

#[test]
fn caller_retries_until_success() {
    let mut caller = ExternalCaller::new(
        Box::new(Flaky { failures_left: 2 }),
        no_wait_policy(3),
        Duration::ZERO,
    );
    let result = caller.call(&request("rent clause"));
    assert_eq!(
        result.map(|value| value.plain_english),
        Some("Summary of rent clause".to_string())
    );
    let stats = caller.stats();
    assert_eq!(stats.attempts, 3);
    assert_eq!(stats.failures, 0);
}

#[test]
fn caller_gives_up_after_max_attempts() {
    let mut caller = ExternalCaller::new(
        Box::new(Flaky { failures_left: 10 }),
        no_wait_policy(3),
        Duration::ZERO,
    );
    assert!(caller.call(&request("rent clause")).is_none());
    let stats = caller.stats();
    assert_eq!(stats.calls, 1);
    assert_eq!(stats.attempts, 3);
    assert_eq!(stats.failures, 1);
}

#[test]
fn prompt_carries_type_and_first_hints() {
    let entities = vec![
        "money: $500".to_string(),
        "money: $600".to_string(),
        "money: $700".to_string(),
        "money: $800".to_string(),
    ];
    let prompt = build_prompt(&SummaryRequest {
        text: "Tenant shall pay rent.",
        clause_type: Some(ClauseType::Payment),
        entities: &entities,
        obligations: &[],
    });
    assert!(prompt.contains("Clause type: payment"));
    assert!(prompt.contains("$700"));
    assert!(!prompt.contains("$800"));
    assert!(prompt.contains("Legal clause: \"Tenant shall pay rent.\""));
}

#[test]
fn heuristic_summary_mentions_entities_and_risk() {
    let mut summarizer = HeuristicSummarizer::new().expect("summarizer");
    let entities = vec!["money: $500".to_string(), "timeframe: 5 days".to_string()];
    let result = summarizer
        .summarize_chunk(&SummaryRequest {
            text: "Tenant shall pay $500 within 5 days.",
            clause_type: Some(ClauseType::Payment),
            entities: &entities,
            obligations: &[],
        })
        .expect("heuristic never fails");
    assert_eq!(
        result.plain_english,
        "This payment clause requires compliance with $500, 5 days."
    );
    assert_eq!(
        result.user_impact,
        "You must follow these low-risk requirements or face consequences."
    );
    assert_eq!(result.confidence, Some(0.8));
}
