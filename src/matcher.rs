use nucleo_matcher::{Matcher, Utf32Str};

/// Case-insensitive partial-ratio similarity in `0..=100`.
///
/// The shorter string is compared against every equally long window of the
/// longer one (plus the partial windows hanging off either end) and the best
/// indel similarity wins. A contiguous substring scores 100.
pub struct FuzzyMatcher {
    matcher: Matcher,
    needle_buf: Vec<char>,
    haystack_buf: Vec<char>,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        // Only the haystack would be normalized, which breaks symmetry.
        let mut config = nucleo_matcher::Config::DEFAULT;
        config.normalize = false;
        Self {
            matcher: Matcher::new(config),
            needle_buf: Vec::new(),
            haystack_buf: Vec::new(),
        }
    }

    pub fn score(&mut self, query: &str, name: &str) -> u8 {
        let query = query.to_lowercase();
        let name = name.to_lowercase();
        let (short, long) = if query.chars().count() <= name.chars().count() {
            (query, name)
        } else {
            (name, query)
        };
        if short.is_empty() {
            return 0;
        }

        // Exact substring is the common launcher case; let nucleo answer it.
        let needle = Utf32Str::new(&short, &mut self.needle_buf);
        let haystack = Utf32Str::new(&long, &mut self.haystack_buf);
        if self.matcher.substring_match(haystack, needle).is_some() {
            return 100;
        }

        let short: Vec<char> = short.chars().collect();
        let long: Vec<char> = long.chars().collect();
        best_window_ratio(&short, &long)
    }
}

fn best_window_ratio(short: &[char], long: &[char]) -> u8 {
    let m = short.len();
    let n = long.len();
    let mut best = 0;

    for k in 1..m {
        best = best.max(ratio(short, &long[..k]));
        best = best.max(ratio(short, &long[n - k..]));
    }
    for start in 0..=(n - m) {
        best = best.max(ratio(short, &long[start..start + m]));
        if best == 100 {
            break;
        }
    }
    best
}

/// Indel similarity: `2 * lcs / (|a| + |b|)` scaled to 100 and rounded.
fn ratio(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let lcs = lcs_len(a, b);
    (200.0 * lcs as f64 / total as f64).round() as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_scores_full() {
        let mut m = FuzzyMatcher::new();
        assert_eq!(m.score("you", "YouTube"), 100);
        assert_eq!(m.score("tube", "youtube"), 100);
        assert_eq!(m.score("YouTube", "youtube"), 100);
    }

    #[test]
    fn test_longer_query_is_swapped() {
        let mut m = FuzzyMatcher::new();
        assert_eq!(m.score("open github", "github"), 100);
    }

    #[test]
    fn test_near_substring() {
        let mut m = FuzzyMatcher::new();
        // trailing window "tube" against "ytube"
        assert_eq!(m.score("ytube", "youtube"), 89);
        let typo = m.score("gthub", "open github");
        assert!(typo >= 60 && typo < 100, "score was {}", typo);
    }

    #[test]
    fn test_accents_score_the_same_both_ways() {
        let mut m = FuzzyMatcher::new();
        let forward = m.score("cafe", "Café");
        let backward = m.score("café", "cafe");
        assert_eq!(forward, backward);
        assert!(forward < 100);
        assert_eq!(m.score("café", "Café Menu"), 100);
    }

    #[test]
    fn test_unrelated_and_empty() {
        let mut m = FuzzyMatcher::new();
        assert_eq!(m.score("xyz", "abc"), 0);
        assert_eq!(m.score("", "abc"), 0);
        assert_eq!(m.score("abc", ""), 0);
    }

    #[test]
    fn test_ratio_bounds() {
        let a: Vec<char> = "abcd".chars().collect();
        let b: Vec<char> = "abxd".chars().collect();
        assert_eq!(ratio(&a, &b), 75);
        assert_eq!(ratio(&a, &a), 100);
    }
}
