//! Prompt templates for the search and chat backends
//!
//! These templates use basic `format!()` interpolation for type safety.

use crate::models::GeoPoint;

/// System instruction for place searches.
///
/// The reply must open with a ```` ```json ```` block holding an array of
/// place objects and continue with a markdown summary. The decoder relies on
/// exactly this layout.
///
/// # Example
/// ```
/// use bites::llm::prompts::search_system_prompt;
///
/// let prompt = search_system_prompt("Seoul", "Korea");
/// assert!(prompt.contains("```json"));
/// assert!(prompt.contains("Seoul, Korea"));
/// ```
pub fn search_system_prompt(city: &str, country: &str) -> String {
    format!(
        r#"You are a helpful local guide for {city}, {country}.
When users ask for places to eat (best, cheapest, nearest, etc.), use the Google Maps and Search tools to find accurate, real-time information.

CRITICAL OUTPUT FORMAT:
You must start your response with a JSON code block containing the details of the places found, including coordinates.
The format must be:
```json
[
  {{
    "name": "Place Name",
    "latitude": 37.123,
    "longitude": 127.123,
    "description": "Brief description of why it fits",
    "price": "$$"
  }}
]
```

After the JSON block, provide a helpful summary in clean Markdown, describing the options and why they were chosen."#
    )
}

/// System instruction for the dining chat assistant.
pub fn chat_system_prompt(city: &str, country: &str) -> String {
    format!(
        "You are a knowledgeable and friendly AI assistant specializing in {city}, {country} tourism and dining. Be helpful, polite, and enthusiastic."
    )
}

/// Location hint for backends without a structured location field.
pub fn location_hint(point: &GeoPoint) -> String {
    format!(
        "The user is currently at latitude {:.6}, longitude {:.6}. Prefer places near this point when the request mentions proximity.",
        point.latitude, point.longitude
    )
}

/// User prompt for text-only backends: the query plus an optional location hint.
pub fn search_user_prompt(query: &str, location: Option<&GeoPoint>) -> String {
    match location {
        Some(point) => format!("{query}\n\n{}", location_hint(point)),
        None => query.to_string(),
    }
}
