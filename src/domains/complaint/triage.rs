use crate::domains::complaint::types::{Category, RawComplaint};
use crate::domains::staff::types::StaffRole;
use crate::reference::ReferenceData;
use serde::{Deserialize, Serialize};

/// Additive bonus when photo evidence is attached.
pub const PHOTO_BONUS: f64 = 1.5;
/// Per-character description bonus.
pub const LENGTH_BONUS_PER_CHAR: f64 = 0.01;
/// Cap on the description-length bonus.
pub const LENGTH_BONUS_CAP: f64 = 1.0;
/// Scores strictly above this threshold surface on the admin dashboard.
pub const VISIBILITY_THRESHOLD: f64 = 5.0;

/// Output of a triage run. Computing it twice for the same input yields
/// the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub priority_score: f64,
    pub admin_visible: bool,
    pub recommended_role: Option<StaffRole>,
}

/// Base urgency weight per category. Utilities outrank amenities.
pub fn base_weight(category: Category) -> f64 {
    match category {
        Category::WaterSupply => 5.5,
        Category::Electricity => 5.5,
        Category::Drainage => 5.0,
        Category::Sanitation => 4.5,
        Category::RoadMaintenance => 4.0,
        Category::StreetLights => 3.5,
        Category::Traffic => 3.5,
        Category::ParksAndGardens => 2.5,
        Category::Others => 2.0,
    }
}

/// Deterministic priority score in [0.0, 10.0].
pub fn priority_score(category: Category, description: &str, has_photo: bool) -> f64 {
    let mut score = base_weight(category);
    if has_photo {
        score += PHOTO_BONUS;
    }
    score += (description.chars().count() as f64 * LENGTH_BONUS_PER_CHAR).min(LENGTH_BONUS_CAP);
    score.clamp(0.0, 10.0)
}

/// Run the full triage computation for a raw complaint.
pub fn triage(complaint: &RawComplaint) -> TriageResult {
    let score = priority_score(complaint.category, &complaint.description, complaint.has_photo());
    let recommended_role = ReferenceData::get().recommended_role(complaint.category);
    if recommended_role.is_none() && complaint.category != Category::Others {
        log::warn!(
            "no role mapping for category '{}'; dispatch will require manual role selection",
            complaint.category
        );
    }
    TriageResult {
        priority_score: score,
        admin_visible: score > VISIBILITY_THRESHOLD,
        recommended_role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::complaint::types::{Address, RawStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn raw(category: Category, description: &str, images: Vec<String>) -> RawComplaint {
        RawComplaint {
            id: Uuid::new_v4(),
            submitter_id: Uuid::new_v4(),
            title: "test".to_string(),
            category,
            description: description.to_string(),
            address: Address {
                line1: "1 Test Lane".to_string(),
                line2: None,
                locality: "Pune".to_string(),
                region: "Maharashtra".to_string(),
                pincode: "411001".to_string(),
            },
            images,
            status: RawStatus::PendingAnalysis,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_water_supply_with_photo_and_long_description() {
        let description = "x".repeat(120);
        let complaint = raw(
            Category::WaterSupply,
            &description,
            vec!["photo.jpg".to_string()],
        );
        let result = triage(&complaint);
        // 5.5 base + 1.5 photo + 1.0 capped length bonus
        assert_eq!(result.priority_score, 8.0);
        assert!(result.admin_visible);
        assert_eq!(result.recommended_role, Some(crate::domains::staff::types::StaffRole::WaterTechnician));
    }

    #[test]
    fn test_low_urgency_stays_below_threshold() {
        let complaint = raw(Category::ParksAndGardens, "grass", vec![]);
        let result = triage(&complaint);
        assert!((result.priority_score - 2.55).abs() < 1e-9);
        assert!(!result.admin_visible);
    }

    #[test]
    fn test_visibility_threshold_is_strict() {
        // 4.0 base + 1.0 capped length bonus lands exactly on the threshold
        let description = "x".repeat(100);
        let complaint = raw(Category::RoadMaintenance, &description, vec![]);
        let result = triage(&complaint);
        assert_eq!(result.priority_score, 5.0);
        assert!(!result.admin_visible);
    }

    #[test]
    fn test_bare_complaint_scores_exactly_the_base_weight() {
        // No photo and an empty description add nothing, for every category
        for category in Category::ALL {
            assert_eq!(priority_score(category, "", false), base_weight(category));
        }
    }

    #[test]
    fn test_length_bonus_caps_at_one() {
        let short = priority_score(Category::Sanitation, &"x".repeat(100), false);
        let long = priority_score(Category::Sanitation, &"x".repeat(2000), false);
        assert_eq!(short, long);
    }

    #[test]
    fn test_score_never_exceeds_ten() {
        let score = priority_score(Category::Electricity, &"x".repeat(2000), true);
        assert!(score <= 10.0);
    }

    #[test]
    fn test_triage_is_deterministic() {
        let complaint = raw(Category::Drainage, "blocked drain near market", vec![]);
        assert_eq!(triage(&complaint), triage(&complaint));
    }

    #[test]
    fn test_others_has_no_recommended_role() {
        let complaint = raw(Category::Others, "something else entirely", vec![]);
        let result = triage(&complaint);
        assert_eq!(result.recommended_role, None);
    }
}
