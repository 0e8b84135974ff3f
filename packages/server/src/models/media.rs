use common::media::MediaFile;
use serde::Serialize;

/// Response DTO for listing media files.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MediaListResponse {
    pub data: Vec<MediaFile>,
    #[schema(example = 2)]
    pub total: u64,
}
