//! Score-based ranking of overload candidates.

/// A candidate that accepted every argument of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidCandidate {
    /// Position in the candidate list
    pub index: usize,
    /// Sum of the argument scores; higher is better
    pub score: i64,
}

/// The candidates tied for the best score.
///
/// Candidates are ordered by descending score with a stable sort, so ties
/// keep declaration order. More than one entry in the result means the call
/// is ambiguous.
///
/// # Example
///
/// ```
/// use quill_checker::overload::{best_candidates, ValidCandidate};
///
/// let valid = vec![
///     ValidCandidate { index: 0, score: 10 },
///     ValidCandidate { index: 1, score: 30 },
/// ];
/// assert_eq!(best_candidates(valid), [ValidCandidate { index: 1, score: 30 }]);
/// ```
pub fn best_candidates(mut valid: Vec<ValidCandidate>) -> Vec<ValidCandidate> {
    valid.sort_by(|a, b| b.score.cmp(&a.score));
    let Some(best) = valid.first().map(|c| c.score) else {
        return valid;
    };
    let tied = valid.iter().take_while(|c| c.score == best).count();
    valid.truncate(tied);
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize, score: i64) -> ValidCandidate {
        ValidCandidate { index, score }
    }

    #[test]
    fn empty_stays_empty() {
        assert!(best_candidates(Vec::new()).is_empty());
    }

    #[test]
    fn single_best_wins() {
        let best = best_candidates(vec![candidate(0, 5), candidate(1, 9), candidate(2, 7)]);
        assert_eq!(best, [candidate(1, 9)]);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let best = best_candidates(vec![candidate(0, 3), candidate(1, 8), candidate(2, 8)]);
        assert_eq!(best, [candidate(1, 8), candidate(2, 8)]);
    }
}
