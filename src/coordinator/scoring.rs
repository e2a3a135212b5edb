//! Candidate scoring for task assignment.

use crate::config::Scoring;

use super::profile::AgentProfile;

/// Score one candidate against a task's capability requirement.
///
/// Base is the success rate scaled to 0–100; a specialization tag matching a
/// required capability adds the configured bonus, and a slow average response
/// time subtracts the configured penalty.
pub fn score(profile: &AgentProfile, required: &[String], weights: &Scoring) -> f64 {
    let mut score = profile.performance.success_rate * 100.0;

    if profile.specializes_in(required) {
        score += weights.specialization_bonus;
    }
    if profile.performance.average_response_ms > weights.slow_response_threshold_ms {
        score -= weights.slow_response_penalty;
    }

    score
}

/// Pick the top scorer among candidates.
///
/// Candidates must arrive sorted by registration sequence; the comparison is
/// strictly-greater, so ties resolve to the first-encountered (earliest
/// registered) agent — an explicit guarantee, not an iteration-order
/// accident.
pub fn select_best<'a>(
    candidates: &'a [AgentProfile],
    required: &[String],
    weights: &Scoring,
) -> Option<(&'a AgentProfile, f64)> {
    let mut best: Option<(&AgentProfile, f64)> = None;
    for candidate in candidates {
        let candidate_score = score(candidate, required, weights);
        match best {
            Some((_, best_score)) if candidate_score <= best_score => {}
            _ => best = Some((candidate, candidate_score)),
        }
    }
    best
}
