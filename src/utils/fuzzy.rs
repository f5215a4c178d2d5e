// Fuzzy matching for "did you mean" suggestions on stage, status and mode names

/// Levenshtein distance (single-character insertions, deletions, substitutions)
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows of the edit matrix
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Candidates within `max_distance` of `search` (case-insensitive), closest first.
/// A candidate that starts with `search` counts as a match at distance 1.
pub fn find_near_matches<S: AsRef<str>>(search: &str, candidates: &[S], max_distance: usize) -> Vec<(String, usize)> {
    let search_lower = search.to_lowercase();
    let mut matches: Vec<(String, usize)> = candidates
        .iter()
        .filter_map(|c| {
            let candidate = c.as_ref();
            let lower = candidate.to_lowercase();
            let distance = levenshtein_distance(&search_lower, &lower);
            if distance <= max_distance {
                Some((candidate.to_string(), distance))
            } else if !search_lower.is_empty() && lower.starts_with(&search_lower) {
                Some((candidate.to_string(), 1))
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    matches.dedup_by(|a, b| a.0 == b.0);
    matches.truncate(5);
    matches
}

/// Best single suggestion, if any candidate is close enough
pub fn suggest<S: AsRef<str>>(search: &str, candidates: &[S]) -> Option<String> {
    find_near_matches(search, candidates, 3)
        .into_iter()
        .next()
        .map(|(name, _)| name)
}
