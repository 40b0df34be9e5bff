use crate::domains::complaint::types::Category;
use crate::domains::staff::types::StaffRole;
use crate::errors::{ServiceError, ServiceResult};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

// Shipped directory; an override can be installed before first use via
// ReferenceData::install.
const DEFAULT_REFERENCE_JSON: &str = include_str!("reference_data.json");

static REFERENCE_DATA: OnceCell<ReferenceData> = OnceCell::new();

#[derive(Debug, Deserialize)]
struct ReferenceDataFile {
    regions: HashMap<String, Vec<String>>,
    category_roles: HashMap<String, String>,
}

/// Static mapping of administrative regions to valid localities and of
/// complaint categories to the staff role authorized to resolve them.
/// Loaded once and immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    regions: HashMap<String, Vec<String>>,
    category_roles: HashMap<Category, StaffRole>,
}

impl ReferenceData {
    fn from_file(file: ReferenceDataFile) -> ServiceResult<Self> {
        let mut category_roles = HashMap::new();
        for (category, role) in &file.category_roles {
            let category = Category::from_str(category).ok_or_else(|| {
                ServiceError::Configuration(format!("unknown category in reference data: {}", category))
            })?;
            let role = StaffRole::from_str(role).ok_or_else(|| {
                ServiceError::Configuration(format!("unknown staff role in reference data: {}", role))
            })?;
            category_roles.insert(category, role);
        }
        Ok(Self {
            regions: file.regions,
            category_roles,
        })
    }

    /// Parse reference data from a reader (used to load an override file
    /// at process start).
    pub fn from_reader<R: Read>(mut reader: R) -> ServiceResult<Self> {
        let mut contents = String::new();
        reader
            .read_to_string(&mut contents)
            .map_err(|e| ServiceError::Configuration(format!("failed to read reference data: {}", e)))?;
        let file: ReferenceDataFile = serde_json::from_str(&contents)
            .map_err(|e| ServiceError::Configuration(format!("invalid reference data: {}", e)))?;
        Self::from_file(file)
    }

    fn load_default() -> Self {
        let file: ReferenceDataFile = serde_json::from_str(DEFAULT_REFERENCE_JSON)
            .expect("embedded reference data is valid JSON");
        Self::from_file(file).expect("embedded reference data is consistent")
    }

    /// Install an override as the process-wide directory. Fails if the
    /// directory has already been resolved.
    pub fn install(data: ReferenceData) -> ServiceResult<()> {
        REFERENCE_DATA
            .set(data)
            .map_err(|_| ServiceError::Configuration("reference data already loaded".to_string()))
    }

    /// The process-wide directory, loading the embedded default on first use.
    pub fn get() -> &'static ReferenceData {
        REFERENCE_DATA.get_or_init(Self::load_default)
    }

    /// Valid localities for a region. Unknown regions yield an empty slice,
    /// not an error.
    pub fn localities_in(&self, region: &str) -> &[String] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All known region names.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn is_known_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// The single staff role authorized to resolve a category. `Others`
    /// has no mapping; dispatch then allows manual role selection.
    pub fn recommended_role(&self, category: Category) -> Option<StaffRole> {
        self.category_roles.get(&category).copied()
    }
}
