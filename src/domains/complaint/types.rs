use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::reference::ReferenceData;
use crate::validation::{Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::domains::staff::types::StaffRole;

/// Maximum number of evidence images per complaint
pub const MAX_IMAGES: usize = 4;

/// Complaint category enum with string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Sanitation,
    RoadMaintenance,
    WaterSupply,
    Electricity,
    Drainage,
    StreetLights,
    ParksAndGardens,
    Traffic,
    Others,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Sanitation,
        Category::RoadMaintenance,
        Category::WaterSupply,
        Category::Electricity,
        Category::Drainage,
        Category::StreetLights,
        Category::ParksAndGardens,
        Category::Traffic,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sanitation => "Sanitation",
            Category::RoadMaintenance => "Road Maintenance",
            Category::WaterSupply => "Water Supply",
            Category::Electricity => "Electricity",
            Category::Drainage => "Drainage",
            Category::StreetLights => "Street Lights",
            Category::ParksAndGardens => "Parks & Gardens",
            Category::Traffic => "Traffic",
            Category::Others => "Others",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Sanitation" => Some(Category::Sanitation),
            "Road Maintenance" => Some(Category::RoadMaintenance),
            "Water Supply" => Some(Category::WaterSupply),
            "Electricity" => Some(Category::Electricity),
            "Drainage" => Some(Category::Drainage),
            "Street Lights" => Some(Category::StreetLights),
            "Parks & Gardens" => Some(Category::ParksAndGardens),
            "Traffic" => Some(Category::Traffic),
            "Others" => Some(Category::Others),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a processed complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Submitted,
    Analyzing,
    Verified,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::Analyzing => "analyzing",
            ComplaintStatus::Verified => "verified",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ComplaintStatus::Submitted),
            "analyzing" => Some(ComplaintStatus::Analyzing),
            "verified" => Some(ComplaintStatus::Verified),
            "resolved" => Some(ComplaintStatus::Resolved),
            "rejected" => Some(ComplaintStatus::Rejected),
            _ => None,
        }
    }

    /// Resolved and rejected permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }

    /// States in which a staff assignment may be created.
    pub fn is_assignable(&self) -> bool {
        matches!(self, ComplaintStatus::Submitted | ComplaintStatus::Verified)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw-layer processing marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawStatus {
    PendingAnalysis,
    Processed,
}

impl RawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawStatus::PendingAnalysis => "pending_analysis",
            RawStatus::Processed => "processed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_analysis" => Some(RawStatus::PendingAnalysis),
            "processed" => Some(RawStatus::Processed),
            _ => None,
        }
    }
}

/// Structured address of the reported issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub locality: String,
    pub region: String,
    pub pincode: String,
}

impl Address {
    /// Single-line rendering for display and logs.
    pub fn display_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = &self.line2 {
            if !line2.is_empty() {
                parts.push(line2.as_str());
            }
        }
        parts.push(self.locality.as_str());
        parts.push(self.region.as_str());
        parts.push(self.pincode.as_str());
        parts.join(", ")
    }
}

impl Validate for Address {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("address_line_1", Some(self.line1.clone()))
            .required()
            .max_length(200)
            .validate()?;
        ValidationBuilder::new("locality", Some(self.locality.clone()))
            .required()
            .validate()?;
        ValidationBuilder::new("region", Some(self.region.clone()))
            .required()
            .validate()?;
        ValidationBuilder::new("pincode", Some(self.pincode.clone()))
            .required()
            .pincode()
            .validate()?;

        // Locality must belong to the region when the region is known to
        // reference data; unknown regions are accepted as free text.
        let reference = ReferenceData::get();
        if reference.is_known_region(&self.region) {
            let localities = reference.localities_in(&self.region);
            if !localities.iter().any(|l| l == &self.locality) {
                return Err(DomainError::Validation(ValidationError::invalid_value(
                    "locality",
                    &format!("'{}' is not a locality of {}", self.locality, self.region),
                )));
            }
        }
        Ok(())
    }
}

/// Raw complaint entity - a citizen submission before triage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComplaint {
    pub id: Uuid,
    pub submitter_id: Uuid,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub address: Address,
    pub images: Vec<String>,
    pub status: RawStatus,
    pub created_at: DateTime<Utc>,
}

impl RawComplaint {
    pub fn has_photo(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Processed complaint entity - derived attributes owned by the triage
/// engine and the state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedComplaint {
    pub id: Uuid,
    pub priority_score: f64,
    pub admin_visible: bool,
    pub recommended_role: Option<StaffRole>,
    pub status: ComplaintStatus,
    pub assigned_staff_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Merged raw + processed view. A complaint with no processed layer yet
/// displays as `analyzing` with a zero priority score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub submitter_id: Uuid,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub address: Address,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub priority_score: f64,
    pub admin_visible: bool,
    pub recommended_role: Option<StaffRole>,
    pub status: ComplaintStatus,
    pub assigned_staff_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
}

impl Complaint {
    pub fn merge(raw: RawComplaint, processed: Option<ProcessedComplaint>) -> Self {
        match processed {
            Some(p) => Self {
                id: raw.id,
                submitter_id: raw.submitter_id,
                title: raw.title,
                category: raw.category,
                description: raw.description,
                address: raw.address,
                images: raw.images,
                created_at: raw.created_at,
                priority_score: p.priority_score,
                admin_visible: p.admin_visible,
                recommended_role: p.recommended_role,
                status: p.status,
                assigned_staff_id: p.assigned_staff_id,
                rejection_reason: p.rejection_reason,
            },
            None => Self {
                id: raw.id,
                submitter_id: raw.submitter_id,
                title: raw.title,
                category: raw.category,
                description: raw.description,
                address: raw.address,
                images: raw.images,
                created_at: raw.created_at,
                priority_score: 0.0,
                admin_visible: false,
                recommended_role: None,
                // Effective status before triage completes
                status: ComplaintStatus::Analyzing,
                assigned_staff_id: None,
                rejection_reason: None,
            },
        }
    }
}

/// NewComplaint DTO - used when a citizen files a complaint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    pub submitter_id: Uuid,
    pub title: String,
    pub category: Category,
    /// May be empty for photo-only submissions; the service synthesizes a
    /// placeholder description in that case.
    pub description: Option<String>,
    pub address: Address,
    pub images: Vec<String>,
}

impl NewComplaint {
    pub fn is_photo_only(&self) -> bool {
        self.description.as_deref().map_or(true, |d| d.trim().is_empty())
    }
}

impl Validate for NewComplaint {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("title", Some(self.title.clone()))
            .required()
            .min_length(3)
            .max_length(120)
            .validate()?;

        if let Some(description) = &self.description {
            ValidationBuilder::new("description", Some(description.clone()))
                .max_length(2000)
                .validate()?;
        }

        // Description is required unless photo evidence is attached.
        if self.is_photo_only() && self.images.is_empty() {
            return Err(DomainError::Validation(ValidationError::required("description")));
        }

        if self.images.len() > MAX_IMAGES {
            return Err(DomainError::Validation(ValidationError::invalid_value(
                "images",
                &format!("at most {} images are allowed", MAX_IMAGES),
            )));
        }

        self.address.validate()
    }
}

/// Filter for complaint list queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub category: Option<Category>,
    pub admin_visible_only: bool,
    pub submitter_id: Option<Uuid>,
}

/// Raw complaint SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct RawComplaintRow {
    pub id: String,
    pub submitter_id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub images: String,
    pub status: String,
    pub created_at: String,
}

pub(crate) fn parse_uuid(s: &str, field_name: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|_| DomainError::InvalidUuid(format!("{}: {}", field_name, s)))
}

pub(crate) fn parse_datetime(s: &str, field_name: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            DomainError::Validation(ValidationError::format(
                field_name,
                &format!("Invalid RFC3339 format: {}", s),
            ))
        })
}

pub(crate) fn parse_optional_uuid(s: &Option<String>, field_name: &str) -> DomainResult<Option<Uuid>> {
    match s {
        Some(value) => parse_uuid(value, field_name).map(Some),
        None => Ok(None),
    }
}

impl RawComplaintRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<RawComplaint> {
        let category = Category::from_str(&self.category).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "category",
                &format!("Unknown category: {}", self.category),
            ))
        })?;
        let status = RawStatus::from_str(&self.status).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "status",
                &format!("Unknown raw status: {}", self.status),
            ))
        })?;
        let images: Vec<String> = serde_json::from_str(&self.images).map_err(|_| {
            DomainError::Validation(ValidationError::format("images", "Invalid JSON array"))
        })?;

        Ok(RawComplaint {
            id: parse_uuid(&self.id, "id")?,
            submitter_id: parse_uuid(&self.submitter_id, "submitter_id")?,
            title: self.title,
            category,
            description: self.description,
            address: Address {
                line1: self.address_line_1,
                line2: self.address_line_2,
                locality: self.city,
                region: self.state,
                pincode: self.pincode,
            },
            images,
            status,
            created_at: parse_datetime(&self.created_at, "created_at")?,
        })
    }
}

/// Processed complaint SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct ProcessedComplaintRow {
    pub id: String,
    pub priority_score: f64,
    pub admin_visible: i64,
    pub recommended_role: Option<String>,
    pub complaint_status: String,
    pub assigned_staff_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub updated_at: String,
}

impl ProcessedComplaintRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<ProcessedComplaint> {
        let status = ComplaintStatus::from_str(&self.complaint_status).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "complaint_status",
                &format!("Unknown complaint status: {}", self.complaint_status),
            ))
        })?;
        let recommended_role = match &self.recommended_role {
            Some(role) => Some(StaffRole::from_str(role).ok_or_else(|| {
                DomainError::Validation(ValidationError::invalid_value(
                    "recommended_role",
                    &format!("Unknown staff role: {}", role),
                ))
            })?),
            None => None,
        };

        Ok(ProcessedComplaint {
            id: parse_uuid(&self.id, "id")?,
            priority_score: self.priority_score,
            admin_visible: self.admin_visible != 0,
            recommended_role,
            status,
            assigned_staff_id: parse_optional_uuid(&self.assigned_staff_id, "assigned_staff_id")?,
            rejection_reason: self.rejection_reason,
            updated_at: parse_datetime(&self.updated_at, "updated_at")?,
        })
    }
}
