use crate::db::models::Participant;

/// Positions for a timed event: participants with a time, fastest first,
/// numbered from 1. Equal times keep their incoming order.
pub fn rank_by_time(participants: &[Participant]) -> Vec<(String, i64)> {
    let mut timed: Vec<(&str, f64)> = participants
        .iter()
        .filter_map(|p| p.time_taken.map(|t| (p.id.as_str(), t)))
        .collect();

    // sort_by is stable
    timed.sort_by(|a, b| a.1.total_cmp(&b.1));

    timed
        .into_iter()
        .enumerate()
        .map(|(i, (id, _))| (id.to_string(), i as i64 + 1))
        .collect()
}
