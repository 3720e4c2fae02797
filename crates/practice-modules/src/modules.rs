//! # Clinical Modules
//!
//! Defines the application modules of the practice platform and the feature
//! gates that decide whether each module (and its route) is shown.
//! Modules are grouped by the area of the application they belong to.

use practice_org::{keys, FeatureMap};
use serde::{Deserialize, Serialize};

/// Area of the application a module belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModuleArea {
    /// Always-present shell screens.
    Core,
    /// Patient care: records, visits, prescriptions.
    Clinical,
    /// Lab and imaging.
    Diagnostics,
    /// Pharmacy, inventory and billing.
    Operations,
    /// Staff, departments and reporting.
    Administration,
}

impl ModuleArea {
    /// Get the string representation of the area.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleArea::Core => "core",
            ModuleArea::Clinical => "clinical",
            ModuleArea::Diagnostics => "diagnostics",
            ModuleArea::Operations => "operations",
            ModuleArea::Administration => "administration",
        }
    }
}

/// Feature condition for showing a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Shown regardless of features.
    Always,
    /// Shown when every listed feature is enabled.
    AllOf(&'static [&'static str]),
    /// Shown when at least one listed feature is enabled.
    AnyOf(&'static [&'static str]),
}

impl Gate {
    /// Check the gate against a feature map.
    pub fn is_open(&self, features: &FeatureMap) -> bool {
        match *self {
            Gate::Always => true,
            Gate::AllOf(keys) => keys.iter().all(|key| features.is_enabled(key)),
            Gate::AnyOf(keys) => keys.iter().any(|key| features.is_enabled(key)),
        }
    }

    /// Feature keys the gate mentions.
    pub fn keys(&self) -> &'static [&'static str] {
        match *self {
            Gate::Always => &[],
            Gate::AllOf(keys) | Gate::AnyOf(keys) => keys,
        }
    }
}

/// Application modules whose visibility depends on organization features.
///
/// - **Core**: Dashboard, Settings
/// - **Clinical**: Patients, Appointments, Visits, Prescriptions, Telemedicine
/// - **Diagnostics**: LabResults, Imaging
/// - **Operations**: Pharmacy, Inventory, Billing
/// - **Administration**: Reports, Departments, Users
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalModule {
    /// Landing dashboard.
    Dashboard,
    /// Patient records.
    Patients,
    /// Appointment scheduling.
    Appointments,
    /// Visit documentation.
    Visits,
    /// Prescriptions.
    Prescriptions,
    /// Lab orders and results.
    LabResults,
    /// Diagnostic imaging.
    Imaging,
    /// Pharmacy dispensing.
    Pharmacy,
    /// Stock and supplies.
    Inventory,
    /// Billing and claims.
    Billing,
    /// Operational and clinical reports.
    Reports,
    /// Department administration.
    Departments,
    /// Staff accounts.
    Users,
    /// Virtual visits.
    Telemedicine,
    /// Organization settings.
    Settings,
}

impl ClinicalModule {
    /// Get the string representation of the module.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalModule::Dashboard => "dashboard",
            ClinicalModule::Patients => "patients",
            ClinicalModule::Appointments => "appointments",
            ClinicalModule::Visits => "visits",
            ClinicalModule::Prescriptions => "prescriptions",
            ClinicalModule::LabResults => "lab_results",
            ClinicalModule::Imaging => "imaging",
            ClinicalModule::Pharmacy => "pharmacy",
            ClinicalModule::Inventory => "inventory",
            ClinicalModule::Billing => "billing",
            ClinicalModule::Reports => "reports",
            ClinicalModule::Departments => "departments",
            ClinicalModule::Users => "users",
            ClinicalModule::Telemedicine => "telemedicine",
            ClinicalModule::Settings => "settings",
        }
    }

    /// Human-readable name for navigation.
    pub fn display_name(&self) -> &'static str {
        match self {
            ClinicalModule::Dashboard => "Dashboard",
            ClinicalModule::Patients => "Patients",
            ClinicalModule::Appointments => "Appointments",
            ClinicalModule::Visits => "Visits",
            ClinicalModule::Prescriptions => "Prescriptions",
            ClinicalModule::LabResults => "Lab Results",
            ClinicalModule::Imaging => "Imaging",
            ClinicalModule::Pharmacy => "Pharmacy",
            ClinicalModule::Inventory => "Inventory",
            ClinicalModule::Billing => "Billing",
            ClinicalModule::Reports => "Reports",
            ClinicalModule::Departments => "Departments",
            ClinicalModule::Users => "Users",
            ClinicalModule::Telemedicine => "Telemedicine",
            ClinicalModule::Settings => "Settings",
        }
    }

    /// Route prefix the module is mounted at.
    pub fn route(&self) -> &'static str {
        match self {
            ClinicalModule::Dashboard => "/dashboard",
            ClinicalModule::Patients => "/patients",
            ClinicalModule::Appointments => "/appointments",
            ClinicalModule::Visits => "/visits",
            ClinicalModule::Prescriptions => "/prescriptions",
            ClinicalModule::LabResults => "/lab-results",
            ClinicalModule::Imaging => "/imaging",
            ClinicalModule::Pharmacy => "/pharmacy",
            ClinicalModule::Inventory => "/inventory",
            ClinicalModule::Billing => "/billing",
            ClinicalModule::Reports => "/reports",
            ClinicalModule::Departments => "/departments",
            ClinicalModule::Users => "/users",
            ClinicalModule::Telemedicine => "/telemedicine",
            ClinicalModule::Settings => "/settings",
        }
    }

    /// Get the area this module belongs to.
    ///
    /// # Example
    ///
    /// ```
    /// use practice_modules::{ClinicalModule, ModuleArea};
    ///
    /// assert_eq!(ClinicalModule::LabResults.area(), ModuleArea::Diagnostics);
    /// assert_eq!(ClinicalModule::Dashboard.area(), ModuleArea::Core);
    /// ```
    pub fn area(&self) -> ModuleArea {
        match self {
            ClinicalModule::Dashboard | ClinicalModule::Settings => ModuleArea::Core,
            ClinicalModule::Patients
            | ClinicalModule::Appointments
            | ClinicalModule::Visits
            | ClinicalModule::Prescriptions
            | ClinicalModule::Telemedicine => ModuleArea::Clinical,
            ClinicalModule::LabResults | ClinicalModule::Imaging => ModuleArea::Diagnostics,
            ClinicalModule::Pharmacy | ClinicalModule::Inventory | ClinicalModule::Billing => {
                ModuleArea::Operations
            }
            ClinicalModule::Reports | ClinicalModule::Departments | ClinicalModule::Users => {
                ModuleArea::Administration
            }
        }
    }

    /// Feature gate for this module.
    pub fn gate(&self) -> Gate {
        match self {
            ClinicalModule::Dashboard | ClinicalModule::Settings => Gate::Always,
            ClinicalModule::Patients => Gate::AllOf(&[keys::PATIENT_MANAGEMENT]),
            ClinicalModule::Appointments => Gate::AllOf(&[keys::APPOINTMENTS]),
            ClinicalModule::Visits => Gate::AllOf(&[keys::PATIENT_MANAGEMENT, keys::VISITS]),
            ClinicalModule::Prescriptions => Gate::AllOf(&[keys::PRESCRIPTIONS]),
            ClinicalModule::LabResults => {
                Gate::AnyOf(&[keys::LAB_RESULTS, keys::LAB_TEST_MANAGEMENT])
            }
            ClinicalModule::Imaging => Gate::AllOf(&[keys::IMAGING]),
            ClinicalModule::Pharmacy => Gate::AllOf(&[keys::PHARMACY]),
            ClinicalModule::Inventory => Gate::AllOf(&[keys::INVENTORY]),
            ClinicalModule::Billing => Gate::AnyOf(&[keys::BILLING, keys::INSURANCE_CLAIMS]),
            ClinicalModule::Reports => {
                Gate::AnyOf(&[keys::BASIC_REPORTING, keys::ADVANCED_REPORTING])
            }
            ClinicalModule::Departments => Gate::AllOf(&[keys::DEPARTMENT_MANAGEMENT]),
            ClinicalModule::Users => Gate::AllOf(&[keys::USER_MANAGEMENT]),
            ClinicalModule::Telemedicine => {
                Gate::AllOf(&[keys::PATIENT_MANAGEMENT, keys::TELEMEDICINE])
            }
        }
    }

    /// Check whether the module is visible for a feature map.
    pub fn is_visible(&self, features: &FeatureMap) -> bool {
        self.gate().is_open(features)
    }

    /// Features that would have to be enabled to show the module.
    ///
    /// Empty when the module is already visible. For an any-of gate every
    /// alternative is listed.
    pub fn missing_features(&self, features: &FeatureMap) -> Vec<&'static str> {
        let gate = self.gate();
        if gate.is_open(features) {
            return Vec::new();
        }
        match gate {
            Gate::AllOf(keys) => keys
                .iter()
                .copied()
                .filter(|key| !features.is_enabled(key))
                .collect(),
            gate => gate.keys().to_vec(),
        }
    }

    /// Parse module from string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use practice_modules::ClinicalModule;
    ///
    /// assert_eq!(ClinicalModule::parse("lab_results"), Some(ClinicalModule::LabResults));
    /// assert_eq!(ClinicalModule::parse("lab-results"), Some(ClinicalModule::LabResults));
    /// assert_eq!(ClinicalModule::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "dashboard" | "home" => Some(ClinicalModule::Dashboard),
            "patients" | "patient" => Some(ClinicalModule::Patients),
            "appointments" | "appointment" => Some(ClinicalModule::Appointments),
            "visits" | "visit" => Some(ClinicalModule::Visits),
            "prescriptions" | "prescription" => Some(ClinicalModule::Prescriptions),
            "lab_results" | "labresults" | "labs" | "lab" => Some(ClinicalModule::LabResults),
            "imaging" => Some(ClinicalModule::Imaging),
            "pharmacy" => Some(ClinicalModule::Pharmacy),
            "inventory" => Some(ClinicalModule::Inventory),
            "billing" => Some(ClinicalModule::Billing),
            "reports" | "report" => Some(ClinicalModule::Reports),
            "departments" | "department" => Some(ClinicalModule::Departments),
            "users" | "user" | "staff" => Some(ClinicalModule::Users),
            "telemedicine" => Some(ClinicalModule::Telemedicine),
            "settings" => Some(ClinicalModule::Settings),
            _ => None,
        }
    }

    /// Find the module that owns a route.
    ///
    /// Matches whole path segments: `/patients/42` belongs to `Patients`,
    /// `/patientsx` belongs to nothing. The root path is the dashboard.
    pub fn for_route(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(ClinicalModule::Dashboard);
        }
        Self::all().into_iter().find(|module| {
            let route = module.route();
            trimmed == route
                || trimmed
                    .strip_prefix(route)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Get all modules in navigation order.
    pub fn all() -> Vec<Self> {
        vec![
            ClinicalModule::Dashboard,
            ClinicalModule::Patients,
            ClinicalModule::Appointments,
            ClinicalModule::Visits,
            ClinicalModule::Prescriptions,
            ClinicalModule::LabResults,
            ClinicalModule::Imaging,
            ClinicalModule::Pharmacy,
            ClinicalModule::Inventory,
            ClinicalModule::Billing,
            ClinicalModule::Reports,
            ClinicalModule::Departments,
            ClinicalModule::Users,
            ClinicalModule::Telemedicine,
            ClinicalModule::Settings,
        ]
    }

    /// Get all modules in an area.
    pub fn for_area(area: ModuleArea) -> Vec<Self> {
        Self::all()
            .into_iter()
            .filter(|module| module.area() == area)
            .collect()
    }
}

impl std::fmt::Display for ClinicalModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
