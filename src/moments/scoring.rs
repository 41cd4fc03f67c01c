//! Moment scoring and temporal deduplication.

use super::Moment;
use std::cmp::Ordering;

/// Popularity in `[0, 1]`: `log10(1 + likes) / 3`, saturating at 999 likes.
pub fn likes_signal(likes: u64) -> f64 {
    ((1.0 + likes as f64).log10() / 3.0).min(1.0)
}

/// Combine the moment signals.
///
/// `0.6 * similarity + 0.25 * likes_signal + 0.2 * confidence - 0.2 * toxicity`.
/// Inputs are not clamped; callers keep them in their documented ranges.
pub fn score(similarity: f64, likes: u64, confidence: f64, toxicity_penalty: f64) -> f64 {
    0.6 * similarity + 0.25 * likes_signal(likes) + 0.2 * confidence - 0.2 * toxicity_penalty
}

/// Greedy single-pass merge of moments that start close together.
///
/// Moments are ordered by start; each one either replaces the last kept
/// moment (start within `window_sec` and a strictly higher score) or is
/// kept as a new entry. Kept moments can still end up closer than
/// `window_sec` apart after a replacement.
pub fn dedupe(mut moments: Vec<Moment>, window_sec: f64) -> Vec<Moment> {
    moments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Moment> = Vec::with_capacity(moments.len());
    for moment in moments {
        match kept.last_mut() {
            Some(last) if (moment.start - last.start).abs() <= window_sec => {
                if moment.score > last.score {
                    *last = moment;
                }
            }
            _ => kept.push(moment),
        }
    }
    kept
}

/// Order by score, best first, and keep at most `max`.
pub fn rank(mut moments: Vec<Moment>, max: usize) -> Vec<Moment> {
    moments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    moments.truncate(max);
    moments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::Emotion;

    fn moment(start: f64, score: f64) -> Moment {
        Moment {
            start,
            end: start + 7.0,
            reason: String::new(),
            emotion: Emotion::Insightful,
            confidence: 0.0,
            comment: String::new(),
            likes: 0,
            title: String::new(),
            score,
            cluster_size: None,
            total_likes: None,
            sample_comments: Vec::new(),
            anchor_author: None,
            anchor_likes: None,
        }
    }

    fn starts_and_scores(moments: &[Moment]) -> Vec<(f64, f64)> {
        moments.iter().map(|m| (m.start, m.score)).collect()
    }

    #[test]
    fn test_dedupe_keeps_higher_nearby() {
        let moments = vec![moment(30.0, 1.0), moment(10.0, 5.0), moment(12.0, 9.0)];
        let kept = dedupe(moments, 10.0);
        assert_eq!(starts_and_scores(&kept), vec![(12.0, 9.0), (30.0, 1.0)]);
    }

    #[test]
    fn test_dedupe_equal_score_keeps_first() {
        let kept = dedupe(vec![moment(10.0, 5.0), moment(15.0, 5.0)], 10.0);
        assert_eq!(starts_and_scores(&kept), vec![(10.0, 5.0)]);
    }

    #[test]
    fn test_dedupe_is_greedy() {
        // 0 -> replaced by 9; 18 is compared with 9 and merges too.
        let kept = dedupe(vec![moment(0.0, 1.0), moment(9.0, 2.0), moment(18.0, 3.0)], 10.0);
        assert_eq!(starts_and_scores(&kept), vec![(18.0, 3.0)]);

        // 0 kept, 11 new entry, 12 replaces 11: kept entries 0 and 12.
        let kept = dedupe(vec![moment(0.0, 1.0), moment(11.0, 1.0), moment(12.0, 2.0)], 10.0);
        assert_eq!(starts_and_scores(&kept), vec![(0.0, 1.0), (12.0, 2.0)]);
    }

    #[test]
    fn test_rank_truncates() {
        let ranked = rank(vec![moment(1.0, 0.2), moment(2.0, 0.9), moment(3.0, 0.5)], 2);
        assert_eq!(starts_and_scores(&ranked), vec![(2.0, 0.9), (3.0, 0.5)]);
    }

    #[test]
    fn test_score_formula() {
        assert!((score(1.0, 0, 0.0, 0.0) - 0.6).abs() < 1e-12);
        assert!((score(0.0, 999, 0.0, 0.0) - 0.25).abs() < 1e-12);
        assert!((score(0.0, 1_000_000, 0.0, 0.0) - 0.25).abs() < 1e-12);
        assert!((score(0.5, 9, 0.5, 1.0) - (0.3 + 0.25 / 3.0 + 0.1 - 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_monotonic() {
        let mut previous = f64::MIN;
        for likes in [0, 1, 5, 50, 500, 5_000, 50_000] {
            let s = score(0.4, likes, 0.5, 0.0);
            assert!(s >= previous);
            previous = s;
        }

        let mut previous = f64::MIN;
        for step in 0..=10 {
            let s = score(0.4, 10, step as f64 / 10.0, 0.0);
            assert!(s >= previous);
            previous = s;
        }
    }
}
