// Object name matching for bulk loads.
//
// Load requests name their inputs with a glob pattern over the staging
// namespace (`output_*.csv`), the same convention vendor warehouses use
// for load-from-storage URIs. Only `*` is special; matching is
// case-sensitive.

/// Match one object name against a `*`-wildcard pattern.
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name: Vec<char> = name.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // Iterative wildcard match with backtracking over the last `*`.
    let (mut n, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == name[n]) {
            n += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            // Let the last `*` absorb one more character and retry.
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns_match_exactly() {
        assert!(matches_pattern("output_Mar_2008.csv", "output_Mar_2008.csv"));
        assert!(!matches_pattern("output_Mar_2008.csv", "output_Apr_2008.csv"));
    }

    #[test]
    fn star_spans_arbitrary_runs() {
        assert!(matches_pattern("output_Mar_2008.csv", "output_*.csv"));
        assert!(matches_pattern("output_Apr_2010.csv", "output_*.csv"));
        assert!(matches_pattern("output_.csv", "output_*.csv"));
        assert!(matches_pattern("output_Mar_2008.csv", "*"));
    }

    #[test]
    fn rejects_names_outside_the_pattern() {
        assert!(!matches_pattern("spool_Mar_2008.csv", "output_*.csv"));
        assert!(!matches_pattern("output_Mar_2008.json", "output_*.csv"));
        assert!(!matches_pattern("output_Mar_2008.csv.bak", "output_*.csv"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!matches_pattern("OUTPUT_Mar_2008.csv", "output_*.csv"));
    }

    #[test]
    fn multiple_stars_compose() {
        assert!(matches_pattern("output_Mar_2008.csv", "output_*_*.csv"));
        assert!(!matches_pattern("output_Mar.csv", "output_*_*.csv"));
    }
}
