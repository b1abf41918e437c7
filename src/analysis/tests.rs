use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::error::{AnalysisError, CombineError, SummarizerError};
use crate::model::{ChunkResult, ClauseType, DocumentKind, RiskLevel};
use crate::summarizer::{
    ChunkSummarizer, ExternalCaller, HeuristicSummarizer, RetryPolicy, SummaryRequest,
};

const LEASE_SCENARIO: &str = "1. PAYMENT: Tenant shall pay $500 within 5 days.\n\
2. TERMINATION: Either party may terminate with 30 days notice.";

fn single_attempt() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 1,
        initial_backoff: Duration::ZERO,
    }
}

fn heuristic_caller() -> ExternalCaller {
    ExternalCaller::new(
        Box::new(HeuristicSummarizer::new().expect("heuristic summarizer")),
        single_attempt(),
        Duration::ZERO,
    )
}

fn chunk(plain_english: &str, user_impact: &str, risk: RiskLevel) -> ChunkResult {
    ChunkResult {
        plain_english: plain_english.to_string(),
        user_impact: user_impact.to_string(),
        risk,
        confidence: None,
        reasoning: None,
    }
}

/// Replays canned responses in call order; `None` entries fail the call.
struct Scripted {
    responses: Vec<Option<ChunkResult>>,
    next: usize,
    seen_words: Rc<RefCell<Vec<usize>>>,
}

impl ChunkSummarizer for Scripted {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn summarize_chunk(
        &mut self,
        request: &SummaryRequest<'_>,
    ) -> Result<ChunkResult, SummarizerError> {
        self.seen_words.borrow_mut().push(word_count(request.text));
        let response = self.responses.get(self.next).cloned().flatten();
        self.next += 1;
        response.ok_or_else(|| SummarizerError::Transient("scripted failure".to_string()))
    }
}

fn scripted_caller(
    responses: Vec<Option<ChunkResult>>,
) -> (ExternalCaller, Rc<RefCell<Vec<usize>>>) {
    let seen_words = Rc::new(RefCell::new(Vec::new()));
    let caller = ExternalCaller::new(
        Box::new(Scripted {
            responses,
            next: 0,
            seen_words: Rc::clone(&seen_words),
        }),
        single_attempt(),
        Duration::ZERO,
    );
    (caller, seen_words)
}

/// One numbered clause of sixty ten-word sentences.
fn six_hundred_word_clause() -> String {
    let body = (1..=60)
        .map(|n| format!("The tenant shall pay the monthly rent amount of ${n}."))
        .collect::<Vec<String>>()
        .join(" ");
    format!("1. PAYMENT TERMS: {body}")
}

#[test]
fn normalize_drops_noise_but_keeps_protected_lines() {
    let normalizer = TextNormalizer::new().expect("normalizer");
    let cleaned = normalizer.normalize("Page 3 of 10\nLate fee: $50\nInit\n");
    assert_eq!(cleaned, "Late fee: $50");
}

#[test]
fn normalize_keeps_short_amount_rate_and_duration_lines() {
    let normalizer = TextNormalizer::new().expect("normalizer");
    for line in ["$40", "5% APR", "7 days", "12 months", "3 years"] {
        assert!(!normalizer.is_boilerplate(line), "{line} treated as noise");
    }

    let cleaned = normalizer.normalize("5% APR\n\n12 months\n\n3 years\n\nInit\n\n$40");
    assert_eq!(cleaned, "5% APR\n\n12 months\n\n3 years\n\n$40");

    let merged = normalizer.normalize("3 years\nThe tenant keeps the lease.");
    assert!(merged.contains("3 years"));
    assert!(merged.contains("The tenant keeps the lease."));
}

#[test]
fn normalize_repairs_mojibake_and_typographic_quotes() {
    let normalizer = TextNormalizer::new().expect("normalizer");
    let cleaned = normalizer.normalize("The tenantâ€™s deposit is \u{201c}refundable\u{201d}.");
    assert_eq!(cleaned, "The tenant's deposit is \"refundable\".");
}

#[test]
fn normalize_is_idempotent() {
    let normalizer = TextNormalizer::new().expect("normalizer");
    let raw = "RENTAL AGREEMENT\n\n\n1.  PAYMENT:   Tenant shall pay $1,200\non the first day\n\
of each month.\nPage 1 of 4\n-------\nThe landlord keeps\nthe roof in repair.\n\n\n\
2. DEPOSIT: A deposit of $600 is due at signing.";
    let once = normalizer.normalize(raw);
    let twice = normalizer.normalize(&once);
    assert_eq!(once, twice);
    assert!(!once.contains("Page 1 of 4"));
    assert!(once.contains("The landlord keeps the roof in repair."));
}

#[test]
fn normalize_drops_short_mixed_case_heading_lines() {
    let normalizer = TextNormalizer::new().expect("normalizer");
    assert_eq!(
        normalizer.normalize("Terms\nThe tenant agrees to keep the unit clean."),
        "The tenant agrees to keep the unit clean."
    );
    assert_eq!(
        normalizer.normalize("RENT\nTenant shall pay rent monthly."),
        "RENT\nTenant shall pay rent monthly."
    );
}

#[test]
fn normalize_keeps_paragraph_breaks_and_merges_within_paragraphs() {
    let normalizer = TextNormalizer::new().expect("normalizer");
    let cleaned = normalizer.normalize(
        "First paragraph line one continues\nhere without a stop.\n\n\n\n\
Second paragraph has its own words.\n\n",
    );
    assert_eq!(
        cleaned,
        "First paragraph line one continues here without a stop.\n\n\
Second paragraph has its own words."
    );
}

#[test]
fn numbered_document_yields_clauses_in_order() {
    let segmenter = ClauseSegmenter::new().expect("segmenter");
    let text = "1. PAYMENT: The tenant shall pay the monthly rent on the first day of each month.\n\
2. DEPOSIT: A security deposit equal to one month of rent is due at signing.\n\
3. MAINTENANCE: The tenant keeps the premises clean and reports any damage promptly.\n\
4. TERMINATION: Either party may end this lease with written notice to the other.";

    let segmentation = segmenter.segment(text).expect("segmentation");
    assert_eq!(segmentation.method, "numbered");
    assert_eq!(
        segmentation
            .segments
            .iter()
            .map(|segment| segment.number.as_deref().unwrap_or(""))
            .collect::<Vec<&str>>(),
        vec!["1", "2", "3", "4"]
    );
    assert_eq!(segmentation.segments[2].title.as_deref(), Some("MAINTENANCE"));
    assert_eq!(
        segmentation.segments[0].body,
        "The tenant shall pay the monthly rent on the first day of each month."
    );
}

#[test]
fn short_numbered_clauses_fall_back_to_line_variant() {
    let segmenter = ClauseSegmenter::new().expect("segmenter");
    let segmentation = segmenter.segment(LEASE_SCENARIO).expect("segmentation");
    assert_eq!(segmentation.method, "numbered");
    assert_eq!(segmentation.segments.len(), 2);
    assert_eq!(segmentation.segments[0].title.as_deref(), Some("PAYMENT"));
    assert_eq!(
        segmentation.segments[0].body,
        "Tenant shall pay $500 within 5 days."
    );
    assert_eq!(
        segmentation.segments[1].body,
        "Either party may terminate with 30 days notice."
    );
}

#[test]
fn numbered_titles_stop_before_one_letter_body_words() {
    let segmenter = ClauseSegmenter::new().expect("segmenter");
    let text = "1. RENT I agree to pay the monthly rent of $900 on the first day of each month.\n\
2. NOTICE A tenant must give sixty days of written notice before moving out.\n\
3. PETS (RESTRICTED): No animals may be kept on the premises without written consent.\n\
4. EXHIBIT A The schedule of fixtures is attached to this agreement in full.";

    let segmentation = segmenter.segment(text).expect("segmentation");
    assert_eq!(segmentation.method, "numbered");
    assert_eq!(
        segmentation
            .segments
            .iter()
            .map(|segment| segment.title.as_deref().unwrap_or(""))
            .collect::<Vec<&str>>(),
        vec!["RENT", "NOTICE", "PETS (RESTRICTED)", "EXHIBIT A"]
    );
    assert!(segmentation.segments[0].body.starts_with("I agree to pay"));
    assert!(segmentation.segments[1].body.starts_with("A tenant must"));
    assert!(segmentation.segments[2].body.starts_with("No animals"));

    let short = segmenter
        .segment("1. RENT I agree to pay $900 monthly.\n2. NOTICE A tenant gives 60 days notice.")
        .expect("segmentation");
    assert_eq!(short.segments.len(), 2);
    assert_eq!(short.segments[0].title.as_deref(), Some("RENT"));
    assert_eq!(short.segments[0].body, "I agree to pay $900 monthly.");
    assert_eq!(short.segments[1].title.as_deref(), Some("NOTICE"));
    assert_eq!(short.segments[1].body, "A tenant gives 60 days notice.");
}

#[test]
fn section_headed_document_uses_section_strategy() {
    let segmenter = ClauseSegmenter::new().expect("segmenter");
    let text = "Section 1: Rent\nThe tenant pays rent monthly on the first.\n\
Section 2: Repairs\nThe landlord repairs the heating system promptly.\n\
Section 3: Pets\nNo pets are allowed without written consent.";
    let segmentation = segmenter.segment(text).expect("segmentation");
    assert_eq!(segmentation.method, "section");
    assert_eq!(segmentation.segments.len(), 3);
    assert_eq!(segmentation.segments[1].number.as_deref(), Some("2"));
    assert_eq!(segmentation.segments[1].title.as_deref(), Some("Repairs"));
}

#[test]
fn unstructured_text_uses_paragraphs_with_sentence_titles() {
    let segmenter = ClauseSegmenter::new().expect("segmenter");
    let text = "Rent is due monthly. The tenant pays by bank transfer before the fifth.\n\n\
The landlord handles repairs. Requests go through the building office in writing.";
    let segmentation = segmenter.segment(text).expect("segmentation");
    assert_eq!(segmentation.method, "paragraph");
    assert_eq!(segmentation.segments.len(), 2);
    assert_eq!(segmentation.segments[0].number, None);
    assert_eq!(
        segmentation.segments[0].title.as_deref(),
        Some("Rent is due monthly")
    );
}

#[test]
fn segmentation_fails_when_no_strategy_finds_a_clause() {
    let segmenter = ClauseSegmenter::new().expect("segmenter");
    let result = segmenter.segment("Tenant shall pay rent.\n\nLandlord shall fix the roof.");
    assert!(matches!(result, Err(AnalysisError::Segmentation)));
}

#[test]
fn clause_ids_are_unique_for_repeated_numbers() {
    let segment = |number: Option<&str>| RawSegment {
        number: number.map(str::to_string),
        title: None,
        body: "body text long enough".to_string(),
    };
    let ids = assign_clause_ids(
        "lease",
        &[segment(Some("1")), segment(Some("2")), segment(Some("1")), segment(None)],
    );
    assert_eq!(
        ids,
        vec![
            "lease_clause_1".to_string(),
            "lease_clause_2".to_string(),
            "lease_clause_1_3".to_string(),
            "lease_clause_4".to_string(),
        ]
    );
}

#[test]
fn display_title_upper_cases_short_titles_and_falls_back_to_body() {
    assert_eq!(display_title(Some("Repairs"), "ignored"), "REPAIRS");
    assert_eq!(
        display_title(None, "The tenant shall keep the unit clean."),
        "The tenant shall keep the"
    );
}

#[test]
fn classification_uses_whole_words() {
    let features = FeatureExtractor::new().expect("features");
    assert_eq!(
        features.classify("Either party may terminate with 30 days notice."),
        ClauseType::Termination
    );
    assert_eq!(
        features.classify("Tenant shall pay $500 within 5 days."),
        ClauseType::Payment
    );
    assert_eq!(
        features.classify("The parties agree to cooperate in good faith."),
        ClauseType::General
    );
}

#[test]
fn features_collect_entities_obligations_and_conditionals() {
    let features = FeatureExtractor::new().expect("features");
    let extracted = features
        .extract("If rent is late, a late fee of $75 applies and 5% interest accrues after 10 days.");
    assert_eq!(
        extracted.numeric_obligations,
        vec![
            "percentage: 5%".to_string(),
            "money: $75".to_string(),
            "days: 10 days".to_string(),
            "late_fee: late fee of $75".to_string(),
            "interest_rate: 5% interest".to_string(),
        ]
    );
    assert!(extracted.entities.contains(&"money: $75".to_string()));
    assert_eq!(extracted.conditional_language, vec!["if".to_string()]);
    assert!(extracted.contains_financial);
    assert!(!extracted.contains_dates);
}

#[test]
fn fee_and_penalty_amounts_stop_before_sentence_punctuation() {
    let features = FeatureExtractor::new().expect("features");
    let text = "A late fee of $50. A penalty of $1,000. Repeat defaults add a penalty of 2.5% monthly.";

    let entities = features.entities(text);
    assert!(entities.contains(&"late_fees: late fee of $50".to_string()));
    assert!(entities.contains(&"penalties: penalty of $1,000".to_string()));
    assert!(entities.contains(&"penalties: penalty of 2.5%".to_string()));

    let obligations = features.numeric_obligations(text);
    assert_eq!(
        obligations
            .iter()
            .filter(|obligation| obligation.starts_with("late_fee: "))
            .cloned()
            .collect::<Vec<String>>(),
        vec![
            "late_fee: late fee of $50".to_string(),
            "late_fee: penalty of $1,000".to_string(),
            "late_fee: penalty of 2.5%".to_string(),
        ]
    );
    assert!(obligations.iter().all(|obligation| !obligation.ends_with('.')));
}

#[test]
fn heading_detection_accepts_structural_and_short_caps_lines() {
    let features = FeatureExtractor::new().expect("features");
    assert_eq!(
        features.extract_heading("Section 4 Utilities\nThe tenant pays utilities."),
        Some("Section 4 Utilities".to_string())
    );
    assert_eq!(
        features.extract_heading("\nLATE PAYMENT\nRent paid after the fifth is late."),
        Some("LATE PAYMENT".to_string())
    );
    assert_eq!(
        features.extract_heading("the tenant pays utilities monthly."),
        None
    );
}

#[test]
fn zero_signal_text_scores_low_with_no_confidence() {
    let scorer = RiskScorer::new().expect("scorer");
    let assessment = scorer.assess("The parties agree to cooperate in good faith.", &[], &[], None);
    assert_eq!(assessment.score, 0);
    assert_eq!(assessment.level, RiskLevel::Low);
    assert_eq!(assessment.confidence, 0.0);
    assert_eq!(assessment.rationale, "Score: 0. No risk indicators found");
}

#[test]
fn risk_score_grows_with_added_signals() {
    let scorer = RiskScorer::new().expect("scorer");
    let base = scorer.assess("Tenant shall pay rent.", &[], &[], None);
    let worse = scorer.assess("Tenant shall pay rent or a penalty applies.", &[], &[], None);
    let worst = scorer.assess(
        "Tenant shall pay rent or a penalty applies.",
        &["money: $2,000".to_string()],
        &["if".to_string()],
        None,
    );
    assert!(worse.score > base.score);
    assert!(worst.score > worse.score);
    assert!(worst.level.priority() >= worse.level.priority());
    assert_eq!(worst.score, 10 + 9 + 2);
    assert_eq!(worst.level, RiskLevel::High);
}

#[test]
fn score_thresholds_map_to_levels() {
    assert_eq!(RiskScorer::level_for_score(9), RiskLevel::Low);
    assert_eq!(RiskScorer::level_for_score(10), RiskLevel::Medium);
    assert_eq!(RiskScorer::level_for_score(19), RiskLevel::Medium);
    assert_eq!(RiskScorer::level_for_score(20), RiskLevel::High);
}

#[test]
fn external_opinion_only_raises_the_level() {
    let scorer = RiskScorer::new().expect("scorer");
    let raised = scorer.assess("The parties agree to cooperate.", &[], &[], Some(RiskLevel::High));
    assert_eq!(raised.level, RiskLevel::High);
    assert_eq!(raised.score, 0);
    assert!(raised.rationale.ends_with("external opinion raised level to High"));

    let kept = scorer.assess(
        "Immediate termination and a penalty apply.",
        &[],
        &[],
        Some(RiskLevel::Low),
    );
    assert_eq!(kept.level, RiskLevel::High);
}

#[test]
fn only_the_most_severe_numeric_tier_counts() {
    let scorer = RiskScorer::new().expect("scorer");
    let assessment = scorer.assess(
        "Amounts due.",
        &[
            "money: $150".to_string(),
            "days: 45 days".to_string(),
            "percentage: 12%".to_string(),
        ],
        &[],
        None,
    );
    assert_eq!(assessment.score, 9);
    let numeric = assessment
        .factors
        .iter()
        .filter(|factor| matches!(factor, crate::model::RiskFactor::Numeric { .. }))
        .count();
    assert_eq!(numeric, 1);
}

#[test]
fn short_text_is_a_single_chunk() {
    assert_eq!(
        chunk_text("  Tenant shall pay rent.  ", 200),
        vec!["Tenant shall pay rent.".to_string()]
    );
}

#[test]
fn chunks_never_exceed_the_word_limit() {
    let sentences = (1..=60)
        .map(|n| format!("Sentence number {n} has exactly seven words."))
        .collect::<Vec<String>>()
        .join(" ");
    let chunks = chunk_text(&sentences, 50);
    assert!(chunks.iter().all(|chunk| word_count(chunk) <= 50));
    assert_eq!(
        chunks.iter().map(|chunk| word_count(chunk)).sum::<usize>(),
        word_count(&sentences)
    );

    let run_on = vec!["word"; 450].join(" ");
    let windows = chunk_text(&run_on, 200);
    assert_eq!(
        windows.iter().map(|chunk| word_count(chunk)).collect::<Vec<usize>>(),
        vec![200, 200, 50]
    );
}

#[test]
fn long_sentence_tail_packs_with_the_next_sentence() {
    let text = format!("{}. Tenant shall pay.", vec!["word"; 250].join(" "));
    let chunks = chunk_text(&text, 200);
    assert_eq!(
        chunks.iter().map(|chunk| word_count(chunk)).collect::<Vec<usize>>(),
        vec![200, 53]
    );
    assert!(chunks[1].starts_with("word word"));
    assert!(chunks[1].ends_with("word. Tenant shall pay."));
}

#[test]
fn long_sentences_split_on_commas_first() {
    let sentence = format!("{}, {}", vec!["alpha"; 30].join(" "), vec!["beta"; 30].join(" "));
    let chunks = chunk_text(&sentence, 40);
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].ends_with("alpha,"));
    assert!(chunks[1].starts_with("beta"));
}

#[test]
fn combining_one_chunk_returns_it_unchanged() {
    let combiner = ChunkCombiner::new().expect("combiner");
    let only = chunk("You pay $500 each month.", "Pay on time.", RiskLevel::Medium);
    assert_eq!(combiner.combine(vec![only.clone()]), Ok(only));
    assert_eq!(combiner.combine(Vec::new()), Err(CombineError::EmptyInput));
}

#[test]
fn combining_never_loses_money_amounts() {
    let combiner = ChunkCombiner::new().expect("combiner");
    let combined = combiner
        .combine(vec![
            chunk("This clause requires payment of $500 monthly.", "You must pay.", RiskLevel::Low),
            chunk("This clause requires payment of $500 on time.", "Pay.", RiskLevel::Medium),
            chunk("This clause adds a payment fee of $75 when late.", "You will be charged $75.", RiskLevel::Low),
        ])
        .expect("combine");
    assert!(combined.plain_english.contains("$500"));
    assert!(combined.plain_english.contains("$75"));
    assert_eq!(combined.plain_english.matches("$500").count(), 1);
    assert_eq!(combined.risk, RiskLevel::Medium);
    assert_eq!(combined.user_impact, "You will be charged $75.");
    let confidence = combined.confidence.expect("confidence");
    assert!((confidence - 0.8).abs() < 1e-9);
    assert_eq!(combined.reasoning.as_deref(), Some("Combined from 3 sections"));
}

#[test]
fn dropped_chunk_amounts_are_restored_as_key_amounts() {
    let combiner = ChunkCombiner::new().expect("combiner");
    let combined = combiner
        .combine(vec![
            chunk("Rent payment is due monthly.", "Pay rent.", RiskLevel::Low),
            chunk("Payment of 30 days notice is needed.", "Give notice.", RiskLevel::Low),
        ])
        .expect("combine");
    assert_eq!(
        combined.plain_english,
        "Rent payment is due monthly. Key amounts: 30 days."
    );
}

#[test]
fn simplify_replaces_jargon_and_keeps_case_style() {
    let plain = PlainLanguage::new().expect("plain language");
    assert_eq!(
        plain.simplify("The Lessee shall not terminate. LIABLE parties pay."),
        "The Tenant shall not end. RESPONSIBLE parties pay."
    );
    assert_eq!(plain.simplify("This is null and void."), "This is completely cancelled.");
}

#[test]
fn document_kind_follows_name_and_content() {
    assert_eq!(
        detect_document_kind("lease.txt", "The LANDLORD and TENANT agree on rent."),
        DocumentKind::Rental
    );
    assert_eq!(
        detect_document_kind("acme_nda.txt", "This NON-DISCLOSURE agreement covers CONFIDENTIAL data."),
        DocumentKind::Nda
    );
    assert_eq!(
        detect_document_kind("notes.txt", "hello world"),
        DocumentKind::Unknown
    );
}

#[test]
fn completeness_without_entities_compares_summary_length() {
    let original = vec!["word"; 100].join(" ");
    assert_eq!(completeness_score(&original, "one two three four five", &[]), 0.5);
    assert_eq!(
        completeness_score("short clause", "a b c d e f g", &[]),
        1.0
    );
}

#[test]
fn completeness_with_entities_counts_preserved_values() {
    let entities = vec!["money: $500".to_string(), "timeframe: 30 days".to_string()];
    assert_eq!(
        completeness_score("ignored", "You pay $500 each month.", &entities),
        0.5
    );
}

#[test]
fn tiny_documents_are_rejected() {
    let analyzer = ClauseAnalyzer::new(AnalysisConfig::default()).expect("analyzer");
    let result = analyzer.analyze_document("short", "Too short.", &mut heuristic_caller());
    assert!(matches!(result, Err(AnalysisError::Input(_))));
}

#[test]
fn unsegmentable_documents_fail_segmentation() {
    let analyzer = ClauseAnalyzer::new(AnalysisConfig::default()).expect("analyzer");
    let result = analyzer.analyze_document(
        "fragments",
        "Tenant shall pay rent.\n\nLandlord shall fix the roof.\n\nBoth parties must sign here.",
        &mut heuristic_caller(),
    );
    assert!(matches!(result, Err(AnalysisError::Segmentation)));
}

#[test]
fn payment_and_termination_lease_end_to_end() {
    let analyzer = ClauseAnalyzer::new(AnalysisConfig::default()).expect("analyzer");
    let analysis = analyzer
        .analyze_document("lease", LEASE_SCENARIO, &mut heuristic_caller())
        .expect("analysis");

    assert_eq!(analysis.segmentation_method.as_deref(), Some("numbered"));
    assert_eq!(analysis.clauses.len(), 2);
    assert_eq!(analysis.counts.successful, 2);

    let payment = analysis.clause("lease_clause_1").expect("payment clause");
    assert_eq!(payment.heading.as_deref(), Some("PAYMENT"));
    assert_eq!(payment.clause_type, ClauseType::Payment);
    assert_eq!(
        payment.numeric_obligations,
        vec!["money: $500".to_string(), "days: 5 days".to_string()]
    );
    assert_eq!(payment.risk_level, RiskLevel::Low);
    assert_eq!(payment.risk_score, 6);
    assert!(payment.plain_english.contains("$500"));
    assert_eq!(payment.completeness_score, 1.0);

    let termination = analysis.clause("lease_clause_2").expect("termination clause");
    assert_eq!(termination.clause_type, ClauseType::Termination);
    assert_eq!(termination.numeric_obligations, vec!["days: 30 days".to_string()]);
    assert_eq!(termination.conditional_language, vec!["may".to_string()]);
    assert_eq!(termination.risk_score, 24);
    assert_eq!(termination.risk_level, RiskLevel::High);

    let summary = analysis.summary.as_ref().expect("summary");
    assert_eq!(summary.risk_distribution.high, 1);
    assert_eq!(summary.risk_distribution.low, 1);
    assert_eq!(summary.success_rate, 1.0);
}

#[test]
fn long_clause_is_summarized_in_three_chunks() {
    let analyzer = ClauseAnalyzer::new(AnalysisConfig::default()).expect("analyzer");
    let (mut caller, seen_words) = scripted_caller(vec![
        Some(chunk("You pay $100 per month.", "Pay rent.", RiskLevel::Low)),
        Some(chunk("You pay $200 per month.", "Pay rent.", RiskLevel::Low)),
        Some(chunk("You pay $300 per month.", "You must pay $300 or face eviction.", RiskLevel::High)),
    ]);

    let analysis = analyzer
        .analyze_document("lease", &six_hundred_word_clause(), &mut caller)
        .expect("analysis");

    assert_eq!(analysis.clauses.len(), 1);
    let clause = &analysis.clauses[0];
    assert_eq!(clause.id, "lease_clause_1");
    assert_eq!(clause.word_count, 600);
    assert_eq!(clause.processing.chunk_count, 3);
    assert_eq!(clause.processing.chunks_failed, 0);
    assert_eq!(*seen_words.borrow(), vec![200, 200, 200]);
    for amount in ["$100", "$200", "$300"] {
        assert!(clause.plain_english.contains(amount), "missing {amount}");
    }
    assert_eq!(clause.risk_level, RiskLevel::High);
    assert_eq!(clause.user_impact, "You must pay $300 or face eviction.");
    assert_eq!(caller.stats().calls, 3);
}

#[test]
fn failed_chunks_are_counted_without_failing_the_clause() {
    let analyzer = ClauseAnalyzer::new(AnalysisConfig::default()).expect("analyzer");
    let (mut caller, _) = scripted_caller(vec![
        Some(chunk("You pay $100 per month.", "Pay rent.", RiskLevel::Low)),
        None,
        Some(chunk("You pay $300 per month.", "Pay rent.", RiskLevel::Low)),
    ]);

    let analysis = analyzer
        .analyze_document("lease", &six_hundred_word_clause(), &mut caller)
        .expect("analysis");
    let clause = &analysis.clauses[0];
    assert_eq!(clause.processing.chunks_failed, 1);
    assert_eq!(caller.stats().failures, 1);
}

#[test]
fn clause_fails_when_every_chunk_call_fails() {
    let analyzer = ClauseAnalyzer::new(AnalysisConfig::default()).expect("analyzer");
    let (mut caller, _) = scripted_caller(Vec::new());

    let analysis = analyzer
        .analyze_document("lease", LEASE_SCENARIO, &mut caller)
        .expect("analysis");
    assert!(analysis.clauses.is_empty());
    assert_eq!(analysis.counts.failed, 2);
    assert_eq!(analysis.summary.as_ref().map(|summary| summary.success_rate), Some(0.0));
}
