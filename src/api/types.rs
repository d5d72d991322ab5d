//! Wire types for the action queue API

use serde::{Deserialize, Deserializer};

/// Outer wrapper returned by every queue endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default, deserialize_with = "nullable")]
    pub code: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub message: String,
    #[serde(default)]
    pub data: Option<ActionBatch>,
}

impl ApiEnvelope {
    /// Records carried by the envelope, empty when the batch is absent
    #[must_use]
    pub fn records(&self) -> &[ActionRecord] {
        self.data
            .as_ref()
            .and_then(|batch| batch.data.as_deref())
            .unwrap_or_default()
    }

    /// Consume the envelope, keeping only the first record
    #[must_use]
    pub fn into_first(self) -> Option<ActionRecord> {
        self.data?.data?.into_iter().next()
    }
}

/// Inner batch of queued records
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionBatch {
    #[serde(default)]
    pub data: Option<Vec<ActionRecord>>,
    #[serde(default, deserialize_with = "nullable")]
    pub count: i64,
}

/// A queued action (or camera change) as stored by the server
///
/// Every field decodes JSON `null` as its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActionRecord {
    #[serde(deserialize_with = "nullable")]
    pub id: i64,
    #[serde(deserialize_with = "nullable")]
    pub action_name: String,
    #[serde(deserialize_with = "nullable")]
    pub match_word: String,
    #[serde(deserialize_with = "nullable")]
    pub priority: i32,
    #[serde(deserialize_with = "nullable")]
    pub group_id: i32,
    #[serde(deserialize_with = "nullable")]
    pub group_description: String,
    #[serde(deserialize_with = "nullable")]
    pub timestamp: String,
    #[serde(deserialize_with = "nullable")]
    pub is_executed: bool,
    #[serde(deserialize_with = "nullable")]
    pub content: String,
    #[serde(deserialize_with = "nullable")]
    pub audio_path: String,
    #[serde(deserialize_with = "nullable")]
    pub audio_url: String,
    #[serde(deserialize_with = "nullable")]
    pub audio_duration: f32,

    /// Camera index as text on camera change records
    #[serde(deserialize_with = "nullable")]
    pub name: String,
}

impl ActionRecord {
    /// Audio URL, if the record carries one
    #[must_use]
    pub fn audio_url(&self) -> Option<&str> {
        let url = self.audio_url.trim();
        (!url.is_empty()).then_some(url)
    }

    /// Camera name field, if non-empty
    #[must_use]
    pub fn camera_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Decode a JSON `null` as the type's default value
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
