use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::domains::complaint::types::{parse_datetime, parse_optional_uuid, parse_uuid};

/// Field staff role enum with string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Electrician,
    SanitationWorker,
    RoadTechnician,
    WaterTechnician,
    DrainageWorker,
    StreetLightTechnician,
    Gardener,
    TrafficWarden,
}

impl StaffRole {
    pub const ALL: [StaffRole; 8] = [
        StaffRole::Electrician,
        StaffRole::SanitationWorker,
        StaffRole::RoadTechnician,
        StaffRole::WaterTechnician,
        StaffRole::DrainageWorker,
        StaffRole::StreetLightTechnician,
        StaffRole::Gardener,
        StaffRole::TrafficWarden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Electrician => "Electrician",
            StaffRole::SanitationWorker => "Sanitation Worker",
            StaffRole::RoadTechnician => "Road Technician",
            StaffRole::WaterTechnician => "Water Technician",
            StaffRole::DrainageWorker => "Drainage Worker",
            StaffRole::StreetLightTechnician => "Street Light Technician",
            StaffRole::Gardener => "Gardener",
            StaffRole::TrafficWarden => "Traffic Warden",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Electrician" => Some(StaffRole::Electrician),
            "Sanitation Worker" => Some(StaffRole::SanitationWorker),
            "Road Technician" => Some(StaffRole::RoadTechnician),
            "Water Technician" => Some(StaffRole::WaterTechnician),
            "Drainage Worker" => Some(StaffRole::DrainageWorker),
            "Street Light Technician" => Some(StaffRole::StreetLightTechnician),
            "Gardener" => Some(StaffRole::Gardener),
            "Traffic Warden" => Some(StaffRole::TrafficWarden),
            _ => None,
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Duty status of a staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffStatus {
    Available,
    Busy,
    OffDuty,
}

impl StaffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Available => "available",
            StaffStatus::Busy => "busy",
            StaffStatus::OffDuty => "off_duty",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(StaffStatus::Available),
            "busy" => Some(StaffStatus::Busy),
            "off_duty" => Some(StaffStatus::OffDuty),
            _ => None,
        }
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Staff entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: Uuid,
    pub full_name: String,
    pub role: StaffRole,
    pub assigned_zone: String,
    pub status: StaffStatus,
    pub performance_rating: f64,
    pub contact_number: Option<String>,
    pub current_assignment_id: Option<Uuid>,
    pub complaints_handled: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// Invariant: an available staff member carries no active assignment.
    pub fn is_claimable(&self) -> bool {
        self.status == StaffStatus::Available && self.current_assignment_id.is_none()
    }
}

/// NewStaff DTO - used when registering a staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub full_name: String,
    pub role: StaffRole,
    pub assigned_zone: String,
    pub performance_rating: f64,
    pub contact_number: Option<String>,
}

impl Validate for NewStaff {
    fn validate(&self) -> DomainResult<()> {
        ValidationBuilder::new("full_name", Some(self.full_name.clone()))
            .required()
            .min_length(2)
            .max_length(100)
            .validate()?;
        ValidationBuilder::new("assigned_zone", Some(self.assigned_zone.clone()))
            .required()
            .validate()?;
        common::validate_rating(self.performance_rating)?;
        if let Some(contact) = &self.contact_number {
            ValidationBuilder::new("contact_number", Some(contact.clone()))
                .phone()
                .validate()?;
        }
        Ok(())
    }
}

/// Filter for staff pool queries. A `None` field means no constraint.
#[derive(Debug, Clone, Default)]
pub struct StaffFilter {
    pub role: Option<StaffRole>,
    pub status: Option<StaffStatus>,
    pub zone: Option<String>,
}

/// Staff SQLite row representation
#[derive(Debug, Clone, FromRow)]
pub struct StaffRow {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub assigned_zone: String,
    pub status: String,
    pub performance_rating: f64,
    pub contact_number: Option<String>,
    pub current_assignment_id: Option<String>,
    pub complaints_handled: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl StaffRow {
    /// Convert database row to domain entity
    pub fn into_entity(self) -> DomainResult<Staff> {
        let role = StaffRole::from_str(&self.role).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "role",
                &format!("Unknown staff role: {}", self.role),
            ))
        })?;
        let status = StaffStatus::from_str(&self.status).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "status",
                &format!("Unknown staff status: {}", self.status),
            ))
        })?;

        Ok(Staff {
            id: parse_uuid(&self.id, "id")?,
            full_name: self.full_name,
            role,
            assigned_zone: self.assigned_zone,
            status,
            performance_rating: self.performance_rating,
            contact_number: self.contact_number,
            current_assignment_id: parse_optional_uuid(
                &self.current_assignment_id,
                "current_assignment_id",
            )?,
            complaints_handled: self.complaints_handled,
            created_at: parse_datetime(&self.created_at, "created_at")?,
            updated_at: parse_datetime(&self.updated_at, "updated_at")?,
        })
    }
}
