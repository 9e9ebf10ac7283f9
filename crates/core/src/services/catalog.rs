//! Departments, categories and locations accepted by the portal.

use std::sync::Arc;

use grievance_common::config::{CatalogConfig, DepartmentConfig};
use grievance_common::{AppError, AppResult};
use serde::Serialize;

/// A department as listed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub name: String,
    pub categories: Vec<String>,
}

impl From<&DepartmentConfig> for DepartmentSummary {
    fn from(d: &DepartmentConfig) -> Self {
        Self {
            name: d.name.clone(),
            categories: d.categories.clone(),
        }
    }
}

/// Read access to the configured catalog.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<CatalogConfig>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(catalog: CatalogConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// All departments with their categories.
    #[must_use]
    pub fn list_departments(&self) -> Vec<DepartmentSummary> {
        self.catalog.departments.iter().map(Into::into).collect()
    }

    /// Districts of a state.
    pub fn list_districts(&self, state: &str) -> AppResult<Vec<String>> {
        self.catalog
            .state(state)
            .map(|s| s.districts.clone())
            .ok_or_else(|| AppError::NotFound(format!("State {state}")))
    }

    /// Mobile number that receives a department's reminders and escalations.
    #[must_use]
    pub fn contact_for(&self, department: &str) -> Option<&str> {
        self.catalog
            .department(department)
            .map(|d| d.contact.as_str())
    }

    /// Check a submission against the catalog and return the canonical
    /// department name.
    pub fn validate_submission(
        &self,
        department: &str,
        category: &str,
        state: &str,
        district: &str,
    ) -> AppResult<String> {
        let dept = self
            .catalog
            .department(department)
            .ok_or_else(|| AppError::Validation(format!("Unknown department: {department}")))?;

        if !dept.handles(category) {
            return Err(AppError::Validation(format!(
                "Category {category} is not handled by {}",
                dept.name
            )));
        }

        // States are optional in the catalog; only check what is configured
        if !self.catalog.states.is_empty() {
            let known = self
                .catalog
                .state(state)
                .ok_or_else(|| AppError::Validation(format!("Unknown state: {state}")))?;
            if !known.districts.iter().any(|d| d.eq_ignore_ascii_case(district)) {
                return Err(AppError::Validation(format!(
                    "District {district} is not in {}",
                    known.name
                )));
            }
        }

        Ok(dept.name.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use grievance_common::config::StateConfig;

    fn service() -> CatalogService {
        CatalogService::new(CatalogConfig {
            departments: vec![DepartmentConfig {
                name: "Water".to_string(),
                contact: "9000000001".to_string(),
                categories: vec!["Pipeline Leakage".to_string(), "No Water Supply".to_string()],
            }],
            states: vec![StateConfig {
                name: "Rajasthan".to_string(),
                districts: vec!["Jaipur".to_string(), "Kota".to_string()],
            }],
        })
    }

    #[test]
    fn test_list_districts() {
        assert_eq!(service().list_districts("rajasthan").unwrap().len(), 2);
        assert!(matches!(
            service().list_districts("Atlantis"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_validate_submission() {
        let s = service();
        assert_eq!(
            s.validate_submission("water", "Pipeline Leakage", "Rajasthan", "Jaipur")
                .unwrap(),
            "Water"
        );
        assert!(matches!(
            s.validate_submission("Roads", "Pothole", "Rajasthan", "Jaipur"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            s.validate_submission("Water", "Power Cut", "Rajasthan", "Jaipur"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            s.validate_submission("Water", "Pipeline Leakage", "Rajasthan", "Pune"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_contact_for() {
        assert_eq!(service().contact_for("Water"), Some("9000000001"));
        assert_eq!(service().contact_for("Roads"), None);
    }
}
