use rand::seq::SliceRandom;

use crate::models::PlayMode;

/// Computes the play order for a queue of `len` tracks.
///
/// The existing order is kept as far as it is still valid: indices past the
/// end are dropped and indices it does not cover yet are appended in
/// ascending order, so freshly appended tracks are always reachable. An empty
/// `current` therefore yields the sequential order. `Shuffle` then permutes
/// the whole result.
pub fn compute_order(current: &[usize], len: usize, mode: PlayMode) -> Vec<usize> {
    let mut seen = vec![false; len];
    let mut order = Vec::with_capacity(len);

    for &idx in current {
        if idx < len && !seen[idx] {
            seen[idx] = true;
            order.push(idx);
        }
    }
    order.extend((0..len).filter(|&idx| !seen[idx]));

    match mode {
        PlayMode::Normal => {}
        PlayMode::Shuffle => {
            let mut rng = rand::rng();
            order.shuffle(&mut rng);
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_permutation(order: &[usize], len: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..len).collect::<Vec<_>>()
    }

    #[test]
    fn test_empty_order_is_sequential() {
        assert_eq!(compute_order(&[], 4, PlayMode::Normal), vec![0, 1, 2, 3]);
        assert!(compute_order(&[], 0, PlayMode::Shuffle).is_empty());
    }

    #[test]
    fn test_existing_order_is_kept_in_normal_mode() {
        assert_eq!(compute_order(&[2, 0, 1], 3, PlayMode::Normal), vec![2, 0, 1]);
    }

    #[test]
    fn test_appended_tracks_extend_the_order() {
        assert_eq!(
            compute_order(&[1, 0], 4, PlayMode::Normal),
            vec![1, 0, 2, 3]
        );
    }

    #[test]
    fn test_stale_indices_are_dropped() {
        assert_eq!(compute_order(&[3, 1, 0, 2], 3, PlayMode::Normal), vec![1, 0, 2]);
        assert_eq!(compute_order(&[1, 1, 0], 2, PlayMode::Normal), vec![1, 0]);
    }

    #[test]
    fn test_shuffle_is_always_a_permutation() {
        for len in [1, 2, 5, 17, 64] {
            let fresh = compute_order(&[], len, PlayMode::Shuffle);
            assert!(is_permutation(&fresh, len));

            let reshuffled = compute_order(&fresh, len, PlayMode::Shuffle);
            assert!(is_permutation(&reshuffled, len));
        }
    }

    #[test]
    fn test_shuffle_varies_between_calls() {
        // 20! orderings: 50 draws colliding into a single order is practically impossible
        let distinct: HashSet<Vec<usize>> = (0..50)
            .map(|_| compute_order(&[], 20, PlayMode::Shuffle))
            .collect();
        assert!(distinct.len() > 1);
    }
}
