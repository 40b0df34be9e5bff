use crate::domains::dispatch::types::{CandidateQuery, RoleFilter};
use crate::domains::staff::types::{Staff, StaffRole, StaffStatus};
use std::cmp::Ordering;

/// Narrow a staff pool to the candidates matching a query. The role filter
/// defaults to the triage recommendation; `recommended` is `None` when the
/// complaint category has no mapped role, in which case only an explicit
/// role (or `Any`) matches anyone.
pub fn filter_candidates(
    pool: &[Staff],
    query: &CandidateQuery,
    recommended: Option<StaffRole>,
) -> Vec<Staff> {
    pool.iter()
        .filter(|staff| match query.role {
            RoleFilter::Recommended => recommended.map_or(false, |role| staff.role == role),
            RoleFilter::Specific(role) => staff.role == role,
            RoleFilter::Any => true,
        })
        .filter(|staff| query.status.map_or(true, |status| staff.status == status))
        .filter(|staff| {
            query
                .zone
                .as_deref()
                .map_or(true, |zone| staff.assigned_zone == zone)
        })
        .cloned()
        .collect()
}

fn status_rank(status: StaffStatus) -> u8 {
    match status {
        StaffStatus::Available => 0,
        StaffStatus::Busy => 1,
        StaffStatus::OffDuty => 2,
    }
}

/// Order candidates for presentation: zone match with the complaint's
/// locality first, then available before busy before off-duty, then rating
/// descending, ties broken by ascending id so the order is reproducible.
pub fn rank_candidates(candidates: &mut [Staff], complaint_locality: &str) {
    candidates.sort_by(|a, b| {
        let a_zone = a.assigned_zone == complaint_locality;
        let b_zone = b.assigned_zone == complaint_locality;
        b_zone
            .cmp(&a_zone)
            .then_with(|| status_rank(a.status).cmp(&status_rank(b.status)))
            .then_with(|| {
                b.performance_rating
                    .partial_cmp(&a.performance_rating)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn staff(
        role: StaffRole,
        zone: &str,
        status: StaffStatus,
        rating: f64,
    ) -> Staff {
        Staff {
            id: Uuid::new_v4(),
            full_name: "worker".to_string(),
            role,
            assigned_zone: zone.to_string(),
            status,
            performance_rating: rating,
            contact_number: None,
            current_assignment_id: None,
            complaints_handled: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_recommended_filter_matches_only_mapped_role() {
        let pool = vec![
            staff(StaffRole::Electrician, "Pune", StaffStatus::Available, 4.0),
            staff(StaffRole::Gardener, "Pune", StaffStatus::Available, 4.5),
        ];
        let query = CandidateQuery::default();
        let matched = filter_candidates(&pool, &query, Some(StaffRole::Electrician));
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].role, StaffRole::Electrician);

        // No recommendation (category Others): recommended filter matches no one
        assert!(filter_candidates(&pool, &query, None).is_empty());

        let broadened = CandidateQuery {
            role: RoleFilter::Any,
            ..Default::default()
        };
        assert_eq!(filter_candidates(&pool, &broadened, None).len(), 2);
    }

    #[test]
    fn test_status_and_zone_filters() {
        let pool = vec![
            staff(StaffRole::Electrician, "Pune", StaffStatus::Available, 4.0),
            staff(StaffRole::Electrician, "Mumbai", StaffStatus::Busy, 4.0),
        ];
        let query = CandidateQuery {
            role: RoleFilter::Any,
            status: Some(StaffStatus::Available),
            zone: None,
        };
        assert_eq!(filter_candidates(&pool, &query, None).len(), 1);

        let zoned = CandidateQuery {
            role: RoleFilter::Any,
            status: None,
            zone: Some("Mumbai".to_string()),
        };
        let matched = filter_candidates(&pool, &zoned, None);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].assigned_zone, "Mumbai");
    }

    #[test]
    fn test_available_outranks_higher_rated_busy() {
        let available = staff(StaffRole::Electrician, "Pune", StaffStatus::Available, 4.2);
        let busy = staff(StaffRole::Electrician, "Pune", StaffStatus::Busy, 4.9);
        let mut candidates = vec![busy.clone(), available.clone()];
        rank_candidates(&mut candidates, "Pune");
        assert_eq!(candidates[0].id, available.id);
        assert_eq!(candidates[1].id, busy.id);
    }

    #[test]
    fn test_zone_match_outranks_status() {
        let local_busy = staff(StaffRole::Electrician, "Pune", StaffStatus::Busy, 3.0);
        let remote_available = staff(StaffRole::Electrician, "Mumbai", StaffStatus::Available, 5.0);
        let mut candidates = vec![remote_available.clone(), local_busy.clone()];
        rank_candidates(&mut candidates, "Pune");
        assert_eq!(candidates[0].id, local_busy.id);
    }

    #[test]
    fn test_ranking_is_deterministic_on_full_ties() {
        let mut a = staff(StaffRole::Gardener, "Pune", StaffStatus::Available, 4.0);
        let mut b = staff(StaffRole::Gardener, "Pune", StaffStatus::Available, 4.0);
        if b.id < a.id {
            std::mem::swap(&mut a, &mut b);
        }
        let mut forward = vec![a.clone(), b.clone()];
        let mut backward = vec![b.clone(), a.clone()];
        rank_candidates(&mut forward, "Pune");
        rank_candidates(&mut backward, "Pune");
        assert_eq!(forward[0].id, a.id);
        assert_eq!(backward[0].id, a.id);
    }
}
