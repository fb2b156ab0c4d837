use serde::{Deserialize, Serialize};

use crate::error::{PriceMatchError, Result};

// ---------------------------------------------------------------------------
// Scorers
// ---------------------------------------------------------------------------

/// String similarity functions, all scaled to 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScorerKind {
    /// Split on whitespace, sort tokens, rejoin, then compare with `ratio`.
    #[default]
    TokenSort,
    /// Normalized InDel similarity on the raw strings.
    Ratio,
    Levenshtein,
    JaroWinkler,
}

const ALL_SCORERS: &[ScorerKind] = &[
    ScorerKind::TokenSort,
    ScorerKind::Ratio,
    ScorerKind::Levenshtein,
    ScorerKind::JaroWinkler,
];

impl ScorerKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::TokenSort => "token-sort",
            Self::Ratio => "ratio",
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro-winkler",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        let wanted = key.trim().to_lowercase().replace('_', "-");
        ALL_SCORERS
            .iter()
            .find(|s| s.key() == wanted)
            .copied()
            .ok_or_else(|| PriceMatchError::UnknownScorer(key.to_string()))
    }

    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Self::TokenSort => token_sort_ratio(a, b),
            Self::Ratio => ratio(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b) * 100.0,
            Self::JaroWinkler => strsim::jaro_winkler(a, b) * 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring functions
// ---------------------------------------------------------------------------

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// `100 * (1 - indel_distance / (len_a + len_b))`, where the InDel distance
/// counts insertions and deletions only. Two empty strings score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let distance = total - 2 * lcs_len(&a, &b);
    100.0 * (1.0 - distance as f64 / total as f64)
}

pub fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

// ---------------------------------------------------------------------------
// best_match
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub code: &'a str,
    pub score: f64,
}

/// Highest-scoring candidate for `query`. Ties go to the earliest candidate;
/// an empty candidate list yields `None`.
pub fn best_match<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    scorer: ScorerKind,
) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;
    for candidate in candidates {
        let code = candidate.as_ref();
        let score = scorer.score(query, code);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Candidate { code, score });
        }
    }
    best
}
