/// 觀影分級類別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingCategory {
    AllAges,
    Twelve,
    Fifteen,
    Adult,
}

impl RatingCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RatingCategory::AllAges => "all-ages",
            RatingCategory::Twelve => "12+",
            RatingCategory::Fifteen => "15+",
            RatingCategory::Adult => "18+",
        }
    }

    /// Classify a provider rating string. Rules are checked in order and the
    /// first match wins, so an all-ages marker beats any age number.
    pub fn classify(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        let tokens: Vec<String> = raw
            .split(|c: char| c.is_whitespace() || matches!(c, '/' | ',' | '(' | ')'))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_uppercase())
            .collect();
        let has_token = |candidates: &[&str]| tokens.iter().any(|t| candidates.contains(&t.as_str()));

        if raw.contains("전체") || lower.contains("all ages") || has_token(&["G", "TV-G", "TV-Y", "U"]) {
            return Some(RatingCategory::AllAges);
        }
        if raw.contains("12") || has_token(&["PG-13"]) {
            return Some(RatingCategory::Twelve);
        }
        if raw.contains("15") {
            return Some(RatingCategory::Fifteen);
        }
        if ["청소년", "청불", "제한상영"].iter().any(|m| raw.contains(m))
            || lower.contains("adult")
            || raw.contains("19")
            || raw.contains("18")
            || has_token(&["R", "NC-17", "X", "TV-MA"])
        {
            return Some(RatingCategory::Adult);
        }
        None
    }
}

/// Map a free-text rating to its category label, or pass it through trimmed.
pub fn normalize_rating(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return String::new(),
    };

    match RatingCategory::classify(raw) {
        Some(category) => category.label().to_string(),
        None => raw.to_string(),
    }
}
