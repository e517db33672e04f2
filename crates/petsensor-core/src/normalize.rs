//! Normalization of upstream listings
//!
//! Turns a [`RawPayload`] into an ordered sequence of [`NormalizedRecord`]s.
//! Pure: no I/O, no clock.
//!
//! ## Item Rules
//!
//! - Required fields: `id`, `name`, `lastUpdate`. A missing one rejects that
//!   item only ([`Error::RecordShape`]).
//! - Photo: the first entry of `media.photos.photo` tagged with the large
//!   size; none means no image.
//! - Breed: one entry as-is, several joined with `" / "` and suffixed `" Mix"`.
//! - Description: whole uppercase words of two or more letters become bold.
//! - Source link: derived from shelter id, name and id; never fetched.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::payload::{RawPayload, as_list, text};

/// Size tag of the large photo variant
pub const LARGE_PHOTO_SIZE: &str = "x";

/// Base of the derived listing link
pub const SOURCE_URL_BASE: &str = "https://www.petfinder.com/petdetail";

static SHOUTED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("uppercase word regex"));

/// One adoptable animal, in the sensor's stable shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Upstream identifier
    pub id: String,

    /// Upstream last-update time, the change-detection key
    #[serde(rename = "k")]
    pub update_timestamp: String,

    /// Display name
    pub title: String,

    /// One-line synopsis: age, sex, breed and id
    pub summary: String,

    /// Long-form text with bold markup applied
    pub description: String,

    /// Large photo, if upstream has one
    pub image_url: Option<String>,

    /// Derived listing link, if the shelter is known
    pub source_url: Option<String>,

    /// Species (e.g. "Dog")
    pub animal: Option<String>,

    /// Composed breed label
    pub breed: String,

    /// Age bracket (e.g. "Young")
    pub age: Option<String>,

    /// "Male", "Female" or "Unknown"
    pub sex: String,
}

/// Normalize every item, keeping per-item failures
///
/// # Returns
///
/// - `Ok(items)`: one entry per upstream item, in upstream order; each is
///   either a record or an [`Error::RecordShape`] for that item
/// - `Err(Error::MalformedResponse)`: the payload has no item collection
pub fn normalize(payload: &RawPayload) -> Result<Vec<Result<NormalizedRecord>>> {
    let items = payload.items()?;
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| normalize_item(index, item))
        .collect())
}

/// Normalize every item, skipping the ones that fail
///
/// Skipped items are logged.
pub fn normalize_lenient(payload: &RawPayload) -> Result<Vec<NormalizedRecord>> {
    let mut records = Vec::new();
    for outcome in normalize(payload)? {
        match outcome {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping upstream item: {}", e),
        }
    }
    Ok(records)
}

/// Normalize a single item node
pub fn normalize_item(index: usize, item: &Value) -> Result<NormalizedRecord> {
    let required = |field: &'static str| {
        item.get(field)
            .and_then(text)
            .ok_or_else(|| Error::record_shape(index, field))
    };

    let id = required("id")?;
    let name = required("name")?;
    let update_timestamp = required("lastUpdate")?;

    let age = item.get("age").and_then(text);
    let sex = sex_label(item.get("sex").and_then(text).as_deref()).to_string();
    let breed = compose_breed(item.pointer("/breeds/breed"));
    let summary = format!(
        "{} {} {} (ID {})",
        age.as_deref().unwrap_or("Unknown age"),
        sex,
        breed,
        id
    );

    let description = item
        .get("description")
        .and_then(text)
        .map(|d| emphasize_shouting(&d))
        .unwrap_or_default();

    let image_url = item.pointer("/media/photos/photo").and_then(large_photo);
    let source_url = item
        .get("shelterId")
        .and_then(text)
        .map(|shelter| source_link(&shelter, &name, &id));

    Ok(NormalizedRecord {
        id,
        update_timestamp,
        title: name,
        summary,
        description,
        image_url,
        source_url,
        animal: item.get("animal").and_then(text),
        breed,
        age,
        sex,
    })
}

/// First photo tagged with the large size
pub fn large_photo(photos: &Value) -> Option<String> {
    as_list(photos)
        .into_iter()
        .find(|photo| photo.get("@size").and_then(Value::as_str) == Some(LARGE_PHOTO_SIZE))
        .and_then(text)
}

/// Breed label from the breed node
pub fn compose_breed(breeds: Option<&Value>) -> String {
    let names: Vec<String> = breeds
        .map(as_list)
        .unwrap_or_default()
        .into_iter()
        .filter_map(text)
        .collect();

    match names.as_slice() {
        [] => "Unknown breed".to_string(),
        [single] => single.clone(),
        many => format!("{} Mix", many.join(" / ")),
    }
}

/// Wrap every whole uppercase word of two or more letters in `**`
pub fn emphasize_shouting(text: &str) -> String {
    SHOUTED_WORD.replace_all(text, "**$0**").into_owned()
}

/// Listing link for an item
pub fn source_link(shelter_id: &str, name: &str, id: &str) -> String {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{}/{}/{}-{}", SOURCE_URL_BASE, shelter_id, slug, id)
}

fn sex_label(code: Option<&str>) -> &'static str {
    match code {
        Some("M") => "Male",
        Some("F") => "Female",
        _ => "Unknown",
    }
}
