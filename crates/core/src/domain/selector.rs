// Selector classification and wildcard matching

use serde::{Deserialize, Serialize};

const GLOB_CHARS: [char; 2] = ['*', '?'];

/// Returns true if `selector` contains a glob character (`*` or `?`)
pub fn is_wildcard(selector: &str) -> bool {
    selector.contains(GLOB_CHARS)
}

/// Retrieval strategy derived from a caller's selector list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "selectors", rename_all = "snake_case")]
pub enum SelectorPlan {
    /// No selectors: every record in the domain
    All,
    /// Only literal names: one exact-match query per name
    Exact(Vec<String>),
    /// At least one glob: fetch everything once, filter per pattern
    Wildcard(Vec<String>),
}

impl SelectorPlan {
    /// Classify `selectors`, keeping caller order
    pub fn classify<S: AsRef<str>>(selectors: &[S]) -> Self {
        if selectors.is_empty() {
            return SelectorPlan::All;
        }

        let selectors: Vec<String> = selectors.iter().map(|s| s.as_ref().to_string()).collect();
        if selectors.iter().any(|s| is_wildcard(s)) {
            SelectorPlan::Wildcard(selectors)
        } else {
            SelectorPlan::Exact(selectors)
        }
    }

    pub fn selectors(&self) -> &[String] {
        match self {
            SelectorPlan::All => &[],
            SelectorPlan::Exact(s) | SelectorPlan::Wildcard(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SelectorPlan::All => "all",
            SelectorPlan::Exact(_) => "exact",
            SelectorPlan::Wildcard(_) => "wildcard",
        }
    }
}

/// Case-insensitive glob match: `*` is any run (including empty), `?` is
/// exactly one character. Every other character matches itself.
pub fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(SelectorPlan::classify(&empty), SelectorPlan::All);
    }

    #[test]
    fn test_classify_exact() {
        let plan = SelectorPlan::classify(&["GPO-1", "NoSuchGPO"]);
        assert_eq!(
            plan,
            SelectorPlan::Exact(vec!["GPO-1".to_string(), "NoSuchGPO".to_string()])
        );
    }

    #[test]
    fn test_classify_any_wildcard_wins() {
        let plan = SelectorPlan::classify(&["GPO-1", "PROD-?"]);
        assert_eq!(plan.kind(), "wildcard");
        assert_eq!(plan.selectors(), ["GPO-1", "PROD-?"]);
    }

    #[test]
    fn test_plan_wire_shape() {
        let json = serde_json::to_value(SelectorPlan::Exact(vec!["A".into()])).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "exact", "selectors": ["A"]}));

        let all = serde_json::to_value(SelectorPlan::All).unwrap();
        assert_eq!(all, serde_json::json!({"kind": "all"}));
    }

    #[test]
    fn test_glob_star() {
        assert!(glob_matches("PROD-*", "PROD-A"));
        assert!(glob_matches("PROD-*", "PROD-"));
        assert!(!glob_matches("PROD-*", "DEV-A"));
        assert!(glob_matches("*Policy", "Default Domain Policy"));
        assert!(glob_matches("*", ""));
        assert!(glob_matches("a*b*c", "axxbyyc"));
        assert!(!glob_matches("a*b*c", "axxbyy"));
    }

    #[test]
    fn test_glob_question_mark() {
        assert!(glob_matches("PROD-?", "PROD-B"));
        assert!(!glob_matches("PROD-?", "PROD-AB"));
        assert!(!glob_matches("?", ""));
    }

    #[test]
    fn test_glob_is_case_insensitive() {
        assert!(glob_matches("prod-*", "PROD-A"));
        assert!(glob_matches("Default*", "DEFAULT DOMAIN POLICY"));
    }

    #[test]
    fn test_glob_literal() {
        assert!(glob_matches("GPO-1", "gpo-1"));
        assert!(!glob_matches("GPO-1", "GPO-10"));
    }

    #[test]
    fn test_glob_brackets_are_literal() {
        assert!(glob_matches("[PROD]*", "[PROD] Baseline"));
        assert!(!glob_matches("[PROD]*", "P-Baseline"));
    }
}
