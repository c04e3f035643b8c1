//! Curated mathematical-term lexicon
//!
//! The lexicon is data, not code: the built-in term list can be extended from
//! configuration, and the matching rule lives in [`MathLexicon::score_token`].
//!
//! Matching rule:
//! - terms containing CJK ideographs match anywhere inside a token
//!   (`"加法"` matches `"加法运算"`)
//! - Latin terms match as case-insensitive prefixes of a token
//!   (`"fraction"` matches `"Fractions"`)
//!
//! A token scores the highest weight among the terms it matches, so nested
//! terms (`"乘法"` inside `"乘法口诀"`) are not counted twice.

use super::entities::DifficultyHint;
use crate::core::string::contains_cjk;
use serde::{Deserialize, Serialize};

/// A single lexicon entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconTerm {
    pub term: String,
    pub weight: f32,
    #[serde(default)]
    pub level: Option<DifficultyHint>,
}

impl LexiconTerm {
    pub fn new(term: impl Into<String>, weight: f32, level: Option<DifficultyHint>) -> Self {
        Self {
            term: term.into().to_lowercase(),
            weight,
            level,
        }
    }

    fn matches(&self, token_lower: &str) -> bool {
        if contains_cjk(&self.term) {
            token_lower.contains(&self.term)
        } else {
            token_lower.starts_with(&self.term)
        }
    }
}

/// Score of a single token against the lexicon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenScore {
    pub weight: f32,
    pub level: Option<DifficultyHint>,
}

use DifficultyHint::{Advanced, Elementary, Intermediate};

/// (term, weight, level) for the built-in lexicon
const BUILTIN_TERMS: &[(&str, f32, Option<DifficultyHint>)] = &[
    // Arithmetic
    ("加法", 1.0, Some(Elementary)),
    ("减法", 1.0, Some(Elementary)),
    ("乘法", 1.0, Some(Elementary)),
    ("除法", 1.0, Some(Elementary)),
    ("乘法口诀", 1.0, Some(Elementary)),
    ("四则运算", 1.0, Some(Elementary)),
    ("分数", 1.0, Some(Elementary)),
    ("小数", 1.0, Some(Elementary)),
    ("百分数", 1.0, Some(Elementary)),
    ("倍数", 1.0, Some(Elementary)),
    ("因数", 1.0, Some(Elementary)),
    ("质数", 1.0, Some(Elementary)),
    ("约分", 1.0, Some(Elementary)),
    ("通分", 1.0, Some(Elementary)),
    ("addition", 1.0, Some(Elementary)),
    ("subtraction", 1.0, Some(Elementary)),
    ("multiplication", 1.0, Some(Elementary)),
    ("division", 1.0, Some(Elementary)),
    ("fraction", 1.0, Some(Elementary)),
    ("decimal", 1.0, Some(Elementary)),
    ("percent", 1.0, Some(Elementary)),
    ("arithmetic", 1.0, Some(Elementary)),
    ("prime", 1.0, Some(Elementary)),
    // Geometry
    ("几何", 1.0, Some(Intermediate)),
    ("三角形", 1.0, Some(Elementary)),
    ("正方形", 1.0, Some(Elementary)),
    ("长方形", 1.0, Some(Elementary)),
    ("平行四边形", 1.0, Some(Elementary)),
    ("圆", 0.6, Some(Elementary)),
    ("面积", 1.0, Some(Elementary)),
    ("周长", 1.0, Some(Elementary)),
    ("体积", 1.0, Some(Elementary)),
    ("角", 0.4, Some(Elementary)),
    ("对称", 1.0, Some(Elementary)),
    ("勾股定理", 1.0, Some(Intermediate)),
    ("坐标", 1.0, Some(Intermediate)),
    ("geometry", 1.0, Some(Intermediate)),
    ("triangle", 1.0, Some(Elementary)),
    ("circle", 1.0, Some(Elementary)),
    ("perimeter", 1.0, Some(Elementary)),
    ("area", 0.6, Some(Elementary)),
    ("volume", 0.6, Some(Elementary)),
    ("angle", 1.0, Some(Elementary)),
    ("symmetry", 1.0, Some(Elementary)),
    ("pythagor", 1.0, Some(Intermediate)),
    ("coordinate", 1.0, Some(Intermediate)),
    // Algebra, statistics
    ("方程", 1.0, Some(Intermediate)),
    ("代数", 1.0, Some(Intermediate)),
    ("函数", 1.0, Some(Intermediate)),
    ("不等式", 1.0, Some(Intermediate)),
    ("比例", 1.0, Some(Elementary)),
    ("概率", 1.0, Some(Intermediate)),
    ("统计", 1.0, Some(Intermediate)),
    ("数列", 1.0, Some(Intermediate)),
    ("equation", 1.0, Some(Intermediate)),
    ("algebra", 1.0, Some(Intermediate)),
    ("function", 0.6, Some(Intermediate)),
    ("inequalit", 1.0, Some(Intermediate)),
    ("ratio", 1.0, Some(Elementary)),
    ("probabilit", 1.0, Some(Intermediate)),
    ("statistic", 1.0, Some(Intermediate)),
    ("sequence", 0.6, Some(Intermediate)),
    // Advanced
    ("微积分", 1.0, Some(Advanced)),
    ("导数", 1.0, Some(Advanced)),
    ("积分", 1.0, Some(Advanced)),
    ("极限", 1.0, Some(Advanced)),
    ("矩阵", 1.0, Some(Advanced)),
    ("向量", 1.0, Some(Advanced)),
    ("对数", 1.0, Some(Advanced)),
    ("指数", 0.6, Some(Advanced)),
    ("calculus", 1.0, Some(Advanced)),
    ("derivative", 1.0, Some(Advanced)),
    ("integral", 1.0, Some(Advanced)),
    ("matri", 1.0, Some(Advanced)),
    ("vector", 1.0, Some(Advanced)),
    ("logarithm", 1.0, Some(Advanced)),
    ("exponent", 0.6, Some(Advanced)),
    // Generic, too weak to qualify on their own
    ("数学", 0.5, None),
    ("运算", 0.5, None),
    ("计算", 0.5, None),
    ("数字", 0.5, None),
    ("图形", 0.5, None),
    ("定理", 0.5, None),
    ("math", 0.5, None),
    ("number", 0.5, None),
    ("theorem", 0.5, None),
    ("sum", 0.4, None),
];

/// Example topics offered as suggestions after a rejected input
pub const EXAMPLE_TOPICS_CJK: &[&str] = &["加法运算", "分数的认识", "三角形的面积", "勾股定理"];
pub const EXAMPLE_TOPICS_LATIN: &[&str] = &[
    "adding fractions",
    "area of a triangle",
    "Pythagorean theorem",
    "linear equations",
];

/// Mathematical-term lexicon used by the concept validator
#[derive(Debug, Clone)]
pub struct MathLexicon {
    terms: Vec<LexiconTerm>,
}

impl MathLexicon {
    /// The built-in bilingual (Chinese/English) lexicon
    pub fn builtin() -> Self {
        Self {
            terms: BUILTIN_TERMS
                .iter()
                .map(|(term, weight, level)| LexiconTerm::new(*term, *weight, *level))
                .collect(),
        }
    }

    /// An empty lexicon (only the arithmetic heuristic applies)
    pub fn empty() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add or replace a term
    pub fn with_term(mut self, term: LexiconTerm) -> Self {
        self.terms.retain(|t| t.term != term.term);
        self.terms.push(term);
        self
    }

    /// Add several terms (configuration extension point)
    pub fn extend(mut self, terms: impl IntoIterator<Item = LexiconTerm>) -> Self {
        for term in terms {
            self = self.with_term(term);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Score a single token; `None` if nothing matched
    pub fn score_token(&self, token: &str) -> Option<TokenScore> {
        let lower = token.to_lowercase();
        let mut best: Option<TokenScore> = None;

        for term in self.terms.iter().filter(|t| t.matches(&lower)) {
            let better = match best {
                None => true,
                Some(current) => {
                    term.weight > current.weight
                        || (term.weight == current.weight && term.level > current.level)
                }
            };
            if better {
                best = Some(TokenScore {
                    weight: term.weight,
                    level: term.level,
                });
            }
        }

        if best.is_none() && is_arithmetic_expression(token) {
            best = Some(TokenScore {
                weight: 1.0,
                level: None,
            });
        }

        best
    }
}

impl Default for MathLexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A token made only of digits, operators and spaces, with at least one of
/// each digit and operator (`3+5`, `12×4=48`).
fn is_arithmetic_expression(token: &str) -> bool {
    const OPERATORS: &[char] = &['+', '-', '*', '/', '×', '÷', '=', '^', '%', '(', ')'];
    let mut has_digit = false;
    let mut has_operator = false;

    for c in token.chars() {
        if c.is_ascii_digit() {
            has_digit = true;
        } else if OPERATORS.contains(&c) {
            has_operator = true;
        } else if !c.is_whitespace() {
            return false;
        }
    }

    has_digit && has_operator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_terms_match_as_substring() {
        let lexicon = MathLexicon::builtin();
        let score = lexicon.score_token("加法运算").unwrap();
        assert_eq!(score.weight, 1.0);
        assert_eq!(score.level, Some(DifficultyHint::Elementary));
    }

    #[test]
    fn test_latin_terms_match_as_prefix() {
        let lexicon = MathLexicon::builtin();
        assert!(lexicon.score_token("Fractions").is_some());
        assert!(lexicon.score_token("pythagorean").is_some());
        // "sum" is a prefix rule, not a substring rule
        assert!(lexicon.score_token("assume").is_none());
    }

    #[test]
    fn test_nested_terms_take_max_weight() {
        let lexicon = MathLexicon::builtin();
        let score = lexicon.score_token("乘法口诀").unwrap();
        assert_eq!(score.weight, 1.0);
    }

    #[test]
    fn test_weather_does_not_match() {
        let lexicon = MathLexicon::builtin();
        assert!(lexicon.score_token("今天天气").is_none());
    }

    #[test]
    fn test_arithmetic_expression_heuristic() {
        let lexicon = MathLexicon::empty();
        assert!(lexicon.score_token("3+5=8").is_some());
        assert!(lexicon.score_token("12×4").is_some());
        assert!(lexicon.score_token("2024").is_none());
        assert!(lexicon.score_token("+-").is_none());
        assert!(lexicon.score_token("a+b").is_none());
    }

    #[test]
    fn test_with_term_replaces_existing() {
        let lexicon = MathLexicon::empty()
            .with_term(LexiconTerm::new("拓扑", 0.5, None))
            .with_term(LexiconTerm::new("拓扑", 1.0, Some(DifficultyHint::Advanced)));
        assert_eq!(lexicon.len(), 1);
        assert_eq!(lexicon.score_token("拓扑学").unwrap().weight, 1.0);
    }
}
