use serde::{Deserialize, Serialize};

/// A partner restaurant. Identity (`store_id`, `store_name`) is immutable
/// once created; the remaining fields are editable metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub store_id: i64,
    pub store_name: String,
    pub partner_level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_dish_1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_dish_2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_dish_3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_dish_4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_dish_5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_photo_url: Option<String>,
}

/// Fields accepted when creating or updating a store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreFields {
    pub store_name: String,
    pub partner_level: Option<i64>,
    #[serde(default)]
    pub gps_lat: Option<f64>,
    #[serde(default)]
    pub gps_lng: Option<f64>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub review_summary: Option<String>,
    #[serde(default)]
    pub top_dish_1: Option<String>,
    #[serde(default)]
    pub top_dish_2: Option<String>,
    #[serde(default)]
    pub top_dish_3: Option<String>,
    #[serde(default)]
    pub top_dish_4: Option<String>,
    #[serde(default)]
    pub top_dish_5: Option<String>,
    #[serde(default)]
    pub main_photo_url: Option<String>,
}

/// Minimal store row for dropdown-style listings.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub store_id: i64,
    pub store_name: String,
}

/// An immutable snapshot of a store's item list at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    pub menu_id: i64,
    pub store_id: i64,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
}

/// One dish on a menu, with optional large/small portion prices.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MenuItem {
    pub menu_item_id: i64,
    pub menu_id: i64,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_big: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_small: Option<i64>,
}

/// A per-language description of a menu item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Translation {
    pub lang_code: String,
    pub description: String,
}

/// A menu item joined with its translations, as served to the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct MenuItemView {
    pub menu_item_id: i64,
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_big: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_small: Option<i64>,
    pub translations: Vec<TranslationView>,
}

/// Translation entry in [`MenuItemView`] — carries the language display
/// name resolved from the reference table.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationView {
    pub lang_code: String,
    pub lang_name: String,
    pub description: String,
}

/// Admin-managed language reference row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Language {
    pub lang_code: String,
    pub lang_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_lang_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt_lang_code: Option<String>,
}

/// A staged OCR upload batch pending review/import.
#[derive(Debug, Clone, Serialize)]
pub struct OcrMenuSummary {
    pub ocr_menu_id: i64,
    pub store_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<String>,
    pub item_count: i64,
}

/// One recognized item headed for the staging tables. Also the shape the
/// vision collaborator returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StagedItem {
    pub item_name: String,
    #[serde(default)]
    pub price_big: Option<i64>,
    #[serde(default)]
    pub price_small: Option<i64>,
    #[serde(default)]
    pub translated_desc: Option<String>,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

/// Result of a successful OCR import.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportOutcome {
    pub imported_count: usize,
}
