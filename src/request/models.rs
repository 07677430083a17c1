use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Lifecycle status of a document request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RequestStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "ready to pickup")]
    ReadyToPickup,
    #[serde(rename = "released")]
    Released,
    #[serde(rename = "rejected")]
    Rejected,
}

impl RequestStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "processing" => Some(Self::Processing),
            "ready to pickup" => Some(Self::ReadyToPickup),
            "released" => Some(Self::Released),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::ReadyToPickup => "ready to pickup",
            Self::Released => "released",
            Self::Rejected => "rejected",
        }
    }

    /// Statuses reachable from `self` under the tightened transition table.
    /// Terminal statuses accept no further transition.
    pub fn allowed_next(&self) -> &'static [RequestStatus] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Processing, Self::Rejected],
            Self::Processing => &[Self::ReadyToPickup, Self::Rejected],
            Self::ReadyToPickup => &[Self::Released],
            Self::Released | Self::Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Rejected)
    }

    /// Remark recorded when the caller supplies none.
    pub fn default_remark(&self) -> &'static str {
        match self {
            Self::Pending => "Document request status changed to pending",
            Self::Approved => "Document request has been approved",
            Self::Processing => "Document is currently being processed",
            Self::ReadyToPickup => "Document is ready for pickup",
            Self::Released => "Document has been released to requestor",
            Self::Rejected => "Document request has been rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One citizen's in-flight or completed request for a document type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentRequest {
    pub id: i64,
    /// Public-facing opaque tracking code; immutable and globally unique.
    pub transaction_id: String,
    pub requestor: i64,
    pub document: i64,
    #[schema(value_type = Option<Object>)]
    pub information: Option<Map<String, Value>>,
    pub status: RequestStatus,
    /// Cache pointer to the most recently rendered artifact.
    pub generated_document_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row recording one lifecycle event of a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateLog {
    pub id: i64,
    pub document_request: i64,
    /// Acting staff account; `None` for system/requestor-originated entries.
    pub staff: Option<i64>,
    pub remark: String,
    pub created_at: DateTime<Utc>,
}

/// A requirement file attached to a request. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequirementUpload {
    pub id: i64,
    pub request_document_id: i64,
    pub requirement: i64,
    pub uploader: i64,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequestBody {
    pub document: i64,
    pub requestor: i64,
    /// Object, or a JSON-encoded string when transported via form data.
    #[schema(value_type = Option<Object>)]
    pub information: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusBody {
    pub status: String,
    pub remark: Option<String>,
    /// Acting staff account id, when known.
    pub staff: Option<i64>,
    /// Bypasses the transition table. Terminal statuses stay closed.
    #[serde(default)]
    pub admin_override: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateBody {
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedArtifact {
    pub file_path: String,
    pub file_url: String,
    pub cached: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedRequestResponse {
    pub message: String,
    pub request_document: DocumentRequest,
    pub uploaded_requirements: Vec<RequirementUpload>,
}

/// Which milestone states have been reached, by set-membership against the
/// current status.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusTimeline {
    pub pending: bool,
    pub approved: bool,
    pub processing: bool,
    pub ready_to_pickup: bool,
    pub released: bool,
    pub rejected: bool,
}

impl StatusTimeline {
    pub fn for_status(status: RequestStatus) -> Self {
        use RequestStatus::*;
        Self {
            pending: status == Pending,
            approved: matches!(status, Approved | Processing | ReadyToPickup | Released),
            processing: matches!(status, Processing | ReadyToPickup | Released),
            ready_to_pickup: matches!(status, ReadyToPickup | Released),
            released: status == Released,
            rejected: status == Rejected,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackedLog {
    pub id: i64,
    pub remark: String,
    pub staff_name: Option<String>,
    pub logged_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackedUpload {
    pub requirement_name: String,
    pub file_url: String,
    pub uploaded_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackedRequestor {
    pub name: String,
    pub email: Option<String>,
}

/// Read-only projection returned by the public tracking endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingProjection {
    pub transaction_id: String,
    pub request_id: i64,
    pub status: RequestStatus,
    pub document_type: String,
    pub requestor: TrackedRequestor,
    pub request_date: String,
    pub last_updated: String,
    pub certificate_logs: Vec<TrackedLog>,
    pub uploaded_requirements: Vec<TrackedUpload>,
    pub status_timeline: StatusTimeline,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestPage {
    pub data: Vec<DocumentRequest>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestListQuery {
    pub status: Option<String>,
    pub requestor: Option<i64>,
    pub document: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
