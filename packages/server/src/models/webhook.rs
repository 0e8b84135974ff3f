use common::media::MediaFile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Success,
    Warning,
    Error,
}

/// Import counts for one webhook call.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WebhookStats {
    /// Items in the payload.
    #[schema(example = 2)]
    pub total: usize,
    /// Main files created.
    #[schema(example = 1)]
    pub successful: usize,
    #[schema(example = 1)]
    pub failed: usize,
}

/// Response body of the webhook endpoint, for every outcome.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WebhookResponse {
    pub status: WebhookStatus,
    #[schema(example = "Imported 1 file(s) successfully")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported: Option<Vec<MediaFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<WebhookStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl WebhookResponse {
    pub fn rejected(message: &str, details: &str) -> Self {
        Self {
            status: WebhookStatus::Error,
            message: message.to_string(),
            imported: None,
            stats: None,
            details: Some(details.to_string()),
        }
    }

    /// Outcome of processing `total` items into `imported` main files.
    pub fn processed(total: usize, imported: Vec<MediaFile>) -> Self {
        let successful = imported.len();
        let stats = Some(WebhookStats {
            total,
            successful,
            failed: total.saturating_sub(successful),
        });

        if successful > 0 {
            Self {
                status: WebhookStatus::Success,
                message: format!("Imported {successful} file(s) successfully"),
                imported: Some(imported),
                stats,
                details: None,
            }
        } else {
            Self {
                status: WebhookStatus::Warning,
                message: "No files were imported".to_string(),
                imported: Some(Vec::new()),
                stats,
                details: Some("Files may have been skipped or failed to import".to_string()),
            }
        }
    }
}
