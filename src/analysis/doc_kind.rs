use crate::model::DocumentKind;

const FILENAME_KEYWORD_SCORE: usize = 10;
const CONTENT_PATTERN_SCORE: usize = 15;
const STRUCTURE_INDICATOR_SCORE: usize = 2;

struct KindProfile {
    kind: DocumentKind,
    filename_keywords: &'static [&'static str],
    content_patterns: &'static [&'static str],
    structure_indicators: &'static [&'static str],
}

const KIND_PROFILES: &[KindProfile] = &[
    KindProfile {
        kind: DocumentKind::Rental,
        filename_keywords: &["rental", "lease"],
        content_patterns: &["RENTAL AGREEMENT", "LEASE AGREEMENT", "LESSOR", "LESSEE"],
        structure_indicators: &["LESSOR", "LESSEE", "RENT", "DEPOSIT", "TENANT", "LANDLORD"],
    },
    KindProfile {
        kind: DocumentKind::Loan,
        filename_keywords: &["loan", "credit"],
        content_patterns: &["LOAN AGREEMENT", "BORROWER", "LENDER"],
        structure_indicators: &["BORROWER", "LENDER", "INTEREST", "REPAYMENT", "PRINCIPAL"],
    },
    KindProfile {
        kind: DocumentKind::TermsOfService,
        filename_keywords: &["tos", "terms"],
        content_patterns: &["TERMS OF SERVICE", "TERMS AND CONDITIONS"],
        structure_indicators: &["USER", "SERVICE", "PRIVACY", "TERMS", "CONDITIONS"],
    },
    KindProfile {
        kind: DocumentKind::Nda,
        filename_keywords: &["nda", "confidential"],
        content_patterns: &["NON-DISCLOSURE", "CONFIDENTIAL"],
        structure_indicators: &[
            "CONFIDENTIAL",
            "DISCLOSURE",
            "RECEIVING PARTY",
            "DISCLOSING PARTY",
        ],
    },
    KindProfile {
        kind: DocumentKind::Employment,
        filename_keywords: &["employment", "job"],
        content_patterns: &["EMPLOYMENT AGREEMENT", "EMPLOYEE", "EMPLOYER"],
        structure_indicators: &["EMPLOYEE", "EMPLOYER", "COMPENSATION", "TERMINATION"],
    },
    KindProfile {
        kind: DocumentKind::Vendor,
        filename_keywords: &["vendor", "supplier"],
        content_patterns: &["VENDOR AGREEMENT", "SUPPLIER"],
        structure_indicators: &["VENDOR", "SUPPLIER", "SERVICES", "PAYMENT"],
    },
    KindProfile {
        kind: DocumentKind::Insurance,
        filename_keywords: &["insurance", "policy"],
        content_patterns: &["INSURANCE POLICY", "COVERAGE"],
        structure_indicators: &["POLICY", "COVERAGE", "PREMIUM", "CLAIM"],
    },
    KindProfile {
        kind: DocumentKind::Consent,
        filename_keywords: &["consent", "medical"],
        content_patterns: &["CONSENT TO TREAT", "MEDICAL CARE"],
        structure_indicators: &["CONSENT", "GUARDIAN", "MEDICAL", "TREATMENT"],
    },
];

/// Keyword scoring over the file name and upper-cased content. The first profile
/// wins ties; an all-zero score is `Unknown`.
pub fn detect_document_kind(document_name: &str, text: &str) -> DocumentKind {
    let upper = text.to_uppercase();
    let name = document_name.to_lowercase();

    let mut best = DocumentKind::Unknown;
    let mut best_score = 0usize;
    for profile in KIND_PROFILES {
        let score = kind_score(profile, &name, &upper);
        if score > best_score {
            best = profile.kind;
            best_score = score;
        }
    }
    best
}

fn kind_score(profile: &KindProfile, name: &str, upper: &str) -> usize {
    let filename = profile
        .filename_keywords
        .iter()
        .filter(|keyword| name.contains(*keyword))
        .count()
        * FILENAME_KEYWORD_SCORE;
    let content = profile
        .content_patterns
        .iter()
        .filter(|pattern| upper.contains(*pattern))
        .count()
        * CONTENT_PATTERN_SCORE;
    let structure = profile
        .structure_indicators
        .iter()
        .map(|indicator| upper.matches(indicator).count())
        .sum::<usize>()
        * STRUCTURE_INDICATOR_SCORE;

    filename + content + structure
}
