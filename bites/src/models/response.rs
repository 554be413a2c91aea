use serde::Serialize;

use super::{CitationMetadata, PlaceRecord};

/// Result of decoding one raw backend text. Built once per backend call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecodedResponse {
    pub place_records: Vec<PlaceRecord>,
    pub narrative_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<CitationMetadata>,
}

impl DecodedResponse {
    /// Places that can be drawn on a map.
    pub fn geolocatable_places(&self) -> impl Iterator<Item = &PlaceRecord> {
        self.place_records.iter().filter(|place| place.geolocatable)
    }
}
