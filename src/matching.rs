use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Scores how well `candidate` matches a user-typed `query`, from 0 (no
/// match) to 100 (the query appears in the candidate as typed).
pub trait Similarity: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> u8;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> u8 + Send + Sync,
{
    fn score(&self, query: &str, candidate: &str) -> u8 {
        self(query, candidate)
    }
}

/// Default scorer for typed queries.
///
/// Takes the better of two scores: Skim subsequence matching (dropped
/// letters, abbreviations) and a partial edit-distance ratio (swapped or
/// mistyped letters).
pub struct FuzzySimilarity {
    matcher: SkimMatcherV2,
}

impl Default for FuzzySimilarity {
    fn default() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }
}

impl FuzzySimilarity {
    /// Skim score normalised against the query's own best score.
    fn subsequence_score(&self, query: &str, candidate: &str) -> u8 {
        let ceiling = match self.matcher.fuzzy_match(query, query) {
            Some(best) if best > 0 => best,
            _ => return 0,
        };

        match self.matcher.fuzzy_match(candidate, query) {
            Some(raw) if raw > 0 => ((raw * 100) / ceiling).clamp(0, 100) as u8,
            _ => 0,
        }
    }
}

/// Best normalised Levenshtein similarity between the query and any
/// same-length window of a longer candidate. A shorter candidate is compared
/// whole, so a one-letter name cannot match every query containing it.
fn partial_ratio(query: &str, candidate: &str) -> u8 {
    let query: Vec<char> = query.to_lowercase().chars().collect();
    let candidate: Vec<char> = candidate.to_lowercase().chars().collect();
    if query.is_empty() || candidate.is_empty() {
        return 0;
    }

    let needle: String = query.iter().collect();
    let best = if candidate.len() <= query.len() {
        let whole: String = candidate.iter().collect();
        strsim::normalized_levenshtein(&needle, &whole)
    } else {
        candidate
            .windows(query.len())
            .map(|window| {
                let window: String = window.iter().collect();
                strsim::normalized_levenshtein(&needle, &window)
            })
            .fold(0.0, f64::max)
    };

    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

impl Similarity for FuzzySimilarity {
    fn score(&self, query: &str, candidate: &str) -> u8 {
        let query = query.trim();
        if query.is_empty() {
            return 0;
        }

        self.subsequence_score(query, candidate)
            .max(partial_ratio(query, candidate.trim()))
    }
}

/// Index of the best scoring candidate. The first of several equal scores wins.
pub fn best_match<S, T>(
    similarity: &S,
    query: &str,
    candidates: &[T],
    name: impl Fn(&T) -> &str,
) -> Option<usize>
where
    S: Similarity + ?Sized,
{
    let mut best: Option<(usize, u8)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = similarity.score(query, name(candidate));
        log::debug!("Fallback candidate '{}' scored {}", name(candidate), score);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}
