use serde::{Deserialize, Serialize};

/// Label words that suggest an element submits or advances a form.
pub const ACTION_SYNONYMS: &[&str] = &[
    "sign in",
    "login",
    "submit",
    "continue",
    "next",
    "authorize",
    "enter",
    "start",
    "proceed",
];

/// Id/class fragments that suggest a submit control.
pub const IDENTIFIER_KEYWORDS: &[&str] = &["login", "signin", "submit"];

pub const SUBMIT_TYPE_WEIGHT: i32 = 5;
pub const SYNONYM_WEIGHT: i32 = 3;
pub const IDENTIFIER_WEIGHT: i32 = 2;

/// What the resolver read off one candidate element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSignals {
    pub input_type: Option<String>,
    pub text: Option<String>,
    pub aria_label: Option<String>,
    pub value: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
}

impl CandidateSignals {
    fn label_haystacks(&self) -> impl Iterator<Item = String> + '_ {
        [&self.text, &self.aria_label, &self.value]
            .into_iter()
            .flatten()
            .map(|s| s.to_lowercase())
    }

    fn identifier_haystacks(&self) -> impl Iterator<Item = String> + '_ {
        [&self.id, &self.class]
            .into_iter()
            .flatten()
            .map(|s| s.to_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// `type="submit"`
    SubmitType,
    /// Text, aria-label or value contains the phrase
    LabelContains(&'static str),
    /// Id or class contains the fragment
    IdentifierContains(&'static str),
}

impl Signal {
    pub fn matches(&self, candidate: &CandidateSignals) -> bool {
        match self {
            Signal::SubmitType => candidate
                .input_type
                .as_deref()
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("submit")),
            Signal::LabelContains(phrase) => {
                candidate.label_haystacks().any(|h| h.contains(phrase))
            }
            Signal::IdentifierContains(fragment) => {
                candidate.identifier_haystacks().any(|h| h.contains(fragment))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRule {
    pub signal: Signal,
    pub weight: i32,
}

/// Weight table for the scored-match strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTable {
    pub rules: Vec<ScoreRule>,
}

impl Default for ScoreTable {
    fn default() -> Self {
        let mut rules = vec![ScoreRule {
            signal: Signal::SubmitType,
            weight: SUBMIT_TYPE_WEIGHT,
        }];
        rules.extend(ACTION_SYNONYMS.iter().map(|s| ScoreRule {
            signal: Signal::LabelContains(s),
            weight: SYNONYM_WEIGHT,
        }));
        rules.extend(IDENTIFIER_KEYWORDS.iter().map(|k| ScoreRule {
            signal: Signal::IdentifierContains(k),
            weight: IDENTIFIER_WEIGHT,
        }));
        ScoreTable { rules }
    }
}

impl ScoreTable {
    pub fn score(&self, candidate: &CandidateSignals) -> i32 {
        self.rules
            .iter()
            .filter(|r| r.signal.matches(candidate))
            .map(|r| r.weight)
            .sum()
    }

    /// Index of the highest positive score; the earliest wins ties.
    pub fn best<'a, I>(&self, candidates: I) -> Option<(usize, i32)>
    where
        I: IntoIterator<Item = &'a CandidateSignals>,
    {
        let mut best: Option<(usize, i32)> = None;
        for (i, c) in candidates.into_iter().enumerate() {
            let s = self.score(c);
            if s > 0 && best.is_none_or(|(_, b)| s > b) {
                best = Some((i, s));
            }
        }
        best
    }
}

/// XPath that pre-filters clickable elements whose text mentions a synonym.
pub fn synonym_xpath() -> String {
    let lower = "translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')";
    let predicates: Vec<String> = ACTION_SYNONYMS
        .iter()
        .map(|s| format!("contains({}, '{}')", lower, s))
        .collect();
    format!(
        "//*[self::button or self::a or @role='button'][{}]",
        predicates.join(" or ")
    )
}
