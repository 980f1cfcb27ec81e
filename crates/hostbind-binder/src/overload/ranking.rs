//! Cost-based ranking for overload resolution.
//!
//! This module handles selecting the best match from multiple viable
//! candidates, with deterministic tie-breaking rules.

use std::cmp::Reverse;

use hostbind_core::{BindError, MetadataProvider};

use super::OverloadMatch;

/// Find the best match from viable candidates.
///
/// Candidates are ranked by, in order:
/// 1. More arguments passed without conversion
/// 2. Lower total conversion cost
/// 3. More by-ref parameters matched by by-ref arguments
///
/// Candidates that tie on all three go through [`break_tie`].
///
/// # Returns
///
/// * `Ok(OverloadMatch)` - The best matching candidate
/// * `Err(BindError::AmbiguousOverload)` - Multiple candidates still tie
pub fn find_best_match(
    provider: &dyn MetadataProvider,
    name: &str,
    mut viable: Vec<OverloadMatch>,
) -> Result<OverloadMatch, BindError> {
    if viable.len() == 1 {
        return Ok(viable.swap_remove(0));
    }

    // Stable: equally ranked candidates keep their most-derived-first order.
    viable.sort_by_key(rank);
    let best = rank(&viable[0]);
    let tied = viable.iter().take_while(|m| rank(m) == best).count();
    viable.truncate(tied);

    if viable.len() == 1 {
        return Ok(viable.swap_remove(0));
    }
    break_tie(provider, name, viable)
}

fn rank(m: &OverloadMatch) -> (Reverse<usize>, u32, Reverse<usize>) {
    (Reverse(m.exact_count), m.total_cost, Reverse(m.byref_matches))
}

/// Break a tie between equally ranked candidates.
///
/// Tie-breaking rules, each applied to the survivors of the previous one:
/// 1. Prefer non-generic over generic members
/// 2. Prefer the normal form over the expanded params form
/// 3. Prefer a member of a more derived declaring type
fn break_tie(
    provider: &dyn MetadataProvider,
    name: &str,
    mut tied: Vec<OverloadMatch>,
) -> Result<OverloadMatch, BindError> {
    keep_if_any(&mut tied, |m| !m.is_generic());
    keep_if_any(&mut tied, |m| !m.expanded);

    let declaring: Vec<_> = tied.iter().map(|m| m.candidate.declaring_type()).collect();
    keep_if_any(&mut tied, |m| {
        let own = m.candidate.declaring_type();
        !declaring
            .iter()
            .any(|&other| other != own && provider.is_assignable_to(other, own))
    });

    if tied.len() == 1 {
        return Ok(tied.swap_remove(0));
    }
    Err(ambiguous_overload_error(provider, name, &tied))
}

/// Retain the candidates matching `pred`, unless none does.
fn keep_if_any(tied: &mut Vec<OverloadMatch>, pred: impl Fn(&OverloadMatch) -> bool) {
    if tied.iter().any(&pred) {
        tied.retain(|m| pred(m));
    }
}

/// Build error for ambiguous overload.
fn ambiguous_overload_error(
    provider: &dyn MetadataProvider,
    name: &str,
    tied: &[OverloadMatch],
) -> BindError {
    BindError::AmbiguousOverload {
        name: name.to_string(),
        candidates: tied
            .iter()
            .map(|m| provider.member_signature(m.candidate.entry()))
            .collect(),
    }
}
