use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::media::MediaFile;

/// Topic emitted after a media file row is created.
pub const MEDIA_CREATE: &str = "media.create";

/// Core event trait
pub trait Event: Send + Sync + Sized + Serialize + DeserializeOwned {
    /// Get the event topic (e.g., "media.create")
    fn topic(&self) -> &str;

    /// Convert event to a generic event
    fn to_generic_event(&self) -> GenericEvent {
        GenericEvent {
            topic: self.topic().to_string(),
            payload: serde_json::to_value(self).unwrap_or_default(),
        }
    }

    /// Create an event from a generic event
    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        let payload: Self = serde_json::from_value(e.payload.clone())?;
        Ok(payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event for GenericEvent {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        Ok(e.clone())
    }
}

/// Payload of [`MEDIA_CREATE`]: `{ "media": <file> }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCreated {
    pub media: MediaFile,
}

impl Event for MediaCreated {
    fn topic(&self) -> &str {
        MEDIA_CREATE
    }
}
