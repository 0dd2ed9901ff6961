use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::file::FileUploadResponse;
use super::lookup::{Country, NamedRow};
use super::profile::ManufacturerResponse;

/// Review state of a regulation assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Submitted,
    Feasible,
    NotFeasible,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::Submitted => "submitted",
            AssessmentStatus::Feasible => "feasible",
            AssessmentStatus::NotFeasible => "not_feasible",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(AssessmentStatus::Submitted),
            "feasible" => Some(AssessmentStatus::Feasible),
            "not_feasible" => Some(AssessmentStatus::NotFeasible),
            _ => None,
        }
    }
}

/// Regulation assessment row
#[derive(Debug, Clone, FromRow)]
pub struct RegulationAssessment {
    pub id: i64,
    pub manufacturer_id: i64,
    pub country_id: Option<i64>,
    pub risk_classification_id: Option<i64>,
    pub specimen_type_id: Option<i64>,
    pub product_owner: Option<String>,
    pub device_label: Option<String>,
    pub device_identifier: Option<String>,
    pub intended_purpose: Option<String>,
    pub status: String,
    pub importer_license_id: Option<i64>,
    pub wholesaler_license_id: Option<i64>,
    pub manufacturer_license_id: Option<i64>,
    pub medical_license_id: Option<i64>,
    pub testing_report_id: Option<i64>,
    pub user_manual_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResponse {
    pub id: i64,
    pub product_owner: Option<String>,
    pub device_label: Option<String>,
    pub device_identifier: Option<String>,
    pub intended_purpose: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<ManufacturerResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_classification: Option<NamedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specimen_type: Option<NamedRow>,
    pub regulatory_agencies: Vec<NamedRow>,
    pub daeler_types: Vec<NamedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importer_license: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wholesaler_license: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_license: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_license: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_report: Option<FileUploadResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_manual: Option<FileUploadResponse>,
    pub created_at: String,
    pub updated_at: String,
}

/// Text fields of the assessment submission. The six license and
/// report files ride along in the multipart body; agency and daeler
/// type ids arrive as comma separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct AssessmentInput {
    pub product_owner: Option<String>,
    pub device_label: Option<String>,
    pub device_identifier: Option<String>,
    pub intended_purpose: Option<String>,
    pub country_id: Option<i64>,
    pub risk_classification_id: Option<i64>,
    pub specimen_type_id: Option<i64>,
    #[serde(default)]
    pub regulatory_agency_ids: Vec<i64>,
    #[serde(default)]
    pub daeler_type_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssessmentStatusUpdate {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssessmentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}
