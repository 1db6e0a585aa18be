use regex::Regex;
use std::sync::LazyLock;
use strsim::jaro_winkler;

static HIGHLIGHT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!H[SE]").expect("highlight marker pattern"));

/// 移除 KMDB 搜尋結果中的 `!HS` / `!HE` 標記
pub fn clean_title(title: &str) -> String {
    HIGHLIGHT_MARKER.replace_all(title, "").trim().to_string()
}

/// Marker-free, whitespace-free, lowercased form used for comparisons.
pub fn normalize_title(title: &str) -> String {
    clean_title(title)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when either normalized title contains the other.
pub fn titles_match(query: &str, candidate: &str) -> bool {
    let query = normalize_title(query);
    let candidate = normalize_title(candidate);
    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    query.contains(&candidate) || candidate.contains(&query)
}

/// Score in `[0, 1]`: 1.0 for equal normalized titles, 0.9 when one contains
/// the other, otherwise Jaro-Winkler similarity scaled below containment.
pub fn match_score(query: &str, candidate: &str) -> f64 {
    let query = normalize_title(query);
    let candidate = normalize_title(candidate);
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        1.0
    } else if query.contains(&candidate) || candidate.contains(&query) {
        0.9
    } else {
        jaro_winkler(&query, &candidate) * 0.85
    }
}

/// Index of the best candidate. Each candidate is scored on all of its names
/// (e.g. local and English title); ties keep the earliest result.
pub fn best_candidate<'a, I, N>(query: &str, candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = N>,
    N: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;

    for (index, names) in candidates.into_iter().enumerate() {
        let score = names
            .into_iter()
            .map(|name| match_score(query, name))
            .fold(0.0, f64::max);

        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }

    best.map(|(index, _)| index)
}
