//! Selection policies over a candidate snapshot
//!
//! Pure: picks a reference out of the slice and mutates nothing. The
//! caller owns pre-filtering (an empty slice means "no credential
//! available" and never reaches a policy) and owns persisting the
//! `last_used_at` of the winner.
//!
//! `RoundRobin` is a least-recently-used rotation over `last_used_at`, not
//! a counter-based cycle: never-used credentials (None) win first, then
//! the oldest timestamp, ties broken by input order. `LeastUsed` shares
//! that comparator — the reference behavior implements both names with one
//! algorithm, preserved here pending a product decision.

use rand::RngExt;
use token_store::{Credential, SelectionPolicy};

/// Pick one credential from a non-empty candidate list under a policy.
///
/// Returns `None` only for an empty input.
pub fn select<'a>(
    candidates: &'a [Credential],
    policy: SelectionPolicy,
) -> Option<&'a Credential> {
    if candidates.is_empty() {
        return None;
    }
    match policy {
        SelectionPolicy::RoundRobin | SelectionPolicy::LeastUsed => Some(oldest_used(candidates)),
        SelectionPolicy::Weighted => Some(weighted(candidates)),
        SelectionPolicy::Random => {
            let idx = rand::rng().random_range(0..candidates.len());
            Some(&candidates[idx])
        }
    }
}

/// Oldest (or never set) `last_used_at` wins; first of equals wins.
/// `None < Some(_)`, so never-used credentials sort ahead of any
/// timestamp, including zero.
fn oldest_used(candidates: &[Credential]) -> &Credential {
    candidates
        .iter()
        .min_by_key(|c| c.last_used_at)
        .expect("candidates is non-empty")
}

/// Cumulative-weight draw: r ∈ [0, Σweights), walk until the running sum
/// exceeds r.
fn weighted(candidates: &[Credential]) -> &Credential {
    let total: u64 = candidates.iter().map(|c| u64::from(c.weight)).sum();
    if total == 0 {
        // Weights are validated >= 1 at write time; guard anyway.
        return &candidates[0];
    }
    let r = rand::rng().random_range(0..total);
    let mut acc = 0u64;
    for candidate in candidates {
        acc += u64::from(candidate.weight);
        if acc > r {
            return candidate;
        }
    }
    // Unreachable: acc == total > r after the last candidate.
    &candidates[candidates.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(alias: &str, weight: u32, last_used_at: Option<u64>) -> Credential {
        let mut cred = Credential::new("prov-1", Some(alias.into()), weight, "enc:v1:x".into(), 0);
        cred.last_used_at = last_used_at;
        cred
    }

    #[test]
    fn empty_candidates_yield_none() {
        for policy in [
            SelectionPolicy::RoundRobin,
            SelectionPolicy::Weighted,
            SelectionPolicy::Random,
            SelectionPolicy::LeastUsed,
        ] {
            assert!(select(&[], policy).is_none());
        }
    }

    #[test]
    fn round_robin_prefers_never_used() {
        let candidates = vec![
            credential("a", 1, Some(500)),
            credential("b", 1, None),
            credential("c", 1, Some(100)),
        ];
        let winner = select(&candidates, SelectionPolicy::RoundRobin).unwrap();
        assert_eq!(winner.alias, "b");
    }

    #[test]
    fn round_robin_never_used_beats_epoch_zero_timestamp() {
        let candidates = vec![credential("a", 1, Some(0)), credential("b", 1, None)];
        let winner = select(&candidates, SelectionPolicy::RoundRobin).unwrap();
        assert_eq!(winner.alias, "b");
    }

    #[test]
    fn round_robin_picks_oldest_timestamp() {
        let candidates = vec![
            credential("a", 1, Some(500)),
            credential("b", 1, Some(300)),
            credential("c", 1, Some(400)),
        ];
        let winner = select(&candidates, SelectionPolicy::RoundRobin).unwrap();
        assert_eq!(winner.alias, "b");
    }

    #[test]
    fn round_robin_ties_break_by_input_order() {
        let candidates = vec![
            credential("a", 1, Some(300)),
            credential("b", 1, Some(300)),
        ];
        let winner = select(&candidates, SelectionPolicy::RoundRobin).unwrap();
        assert_eq!(winner.alias, "a");
    }

    #[test]
    fn round_robin_visits_all_before_repeating() {
        let mut candidates = vec![
            credential("a", 1, None),
            credential("b", 1, None),
            credential("c", 1, None),
        ];

        let mut seen = Vec::new();
        for tick in 1..=3u64 {
            let winner_id = select(&candidates, SelectionPolicy::RoundRobin)
                .unwrap()
                .id
                .clone();
            // Simulate the caller's touch_last_used
            let winner = candidates.iter_mut().find(|c| c.id == winner_id).unwrap();
            winner.last_used_at = Some(tick);
            seen.push(winner.alias.clone());
        }

        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"], "one full rotation, no repeats");

        // Fourth selection starts the cycle again at the oldest
        let fourth = select(&candidates, SelectionPolicy::RoundRobin).unwrap();
        assert_eq!(fourth.alias, "a");
    }

    #[test]
    fn least_used_matches_round_robin_comparator() {
        let candidates = vec![
            credential("a", 1, Some(900)),
            credential("b", 1, Some(100)),
        ];
        let rr = select(&candidates, SelectionPolicy::RoundRobin).unwrap();
        let lu = select(&candidates, SelectionPolicy::LeastUsed).unwrap();
        assert_eq!(rr.alias, lu.alias);
        assert_eq!(lu.alias, "b");
    }

    #[test]
    fn weighted_single_candidate_always_wins() {
        let candidates = vec![credential("only", 5, None)];
        for _ in 0..20 {
            assert_eq!(
                select(&candidates, SelectionPolicy::Weighted).unwrap().alias,
                "only"
            );
        }
    }

    #[test]
    fn weighted_fairness_over_many_draws() {
        let candidates = vec![credential("light", 1, None), credential("heavy", 3, None)];

        let draws = 10_000;
        let mut heavy_hits = 0usize;
        for _ in 0..draws {
            if select(&candidates, SelectionPolicy::Weighted).unwrap().alias == "heavy" {
                heavy_hits += 1;
            }
        }

        let frequency = heavy_hits as f64 / draws as f64;
        assert!(
            (frequency - 0.75).abs() < 0.03,
            "weight-3 candidate should win ~75% of draws, got {frequency}"
        );
    }

    #[test]
    fn random_covers_all_candidates() {
        let candidates = vec![
            credential("a", 1, None),
            credential("b", 1, None),
            credential("c", 1, None),
        ];

        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(
                select(&candidates, SelectionPolicy::Random)
                    .unwrap()
                    .alias
                    .clone(),
            );
        }
        assert_eq!(seen.len(), 3, "uniform pick should hit every candidate");
    }

    #[test]
    fn random_ignores_weight() {
        // With weights [1, 99], uniform random should still pick the light
        // candidate far more often than a weighted draw would (~50% vs ~1%).
        let candidates = vec![credential("light", 1, None), credential("heavy", 99, None)];

        let mut light_hits = 0usize;
        for _ in 0..2000 {
            if select(&candidates, SelectionPolicy::Random).unwrap().alias == "light" {
                light_hits += 1;
            }
        }
        assert!(
            light_hits > 700,
            "uniform random should not honor weights, light hits: {light_hits}"
        );
    }
}
