use tracing::debug;

use menuerp_core::ServiceError;
use menuerp_sql::SqlStore;

/// Initialize the production and OCR staging tables.
///
/// DDL is portable across both backends except for the identity-column
/// declaration, which comes from the store's dialect capability. The
/// staging translation table has no uniqueness constraint — staged rows
/// arrive from recognition output unvalidated, and the production
/// `menu_translations` constraint is what enforces the one-language-per-item
/// invariant at import time.
pub fn init_schema(sql: &dyn SqlStore) -> Result<(), ServiceError> {
    let pk = sql.auto_increment_pk();

    let tables = [
        format!(
            "CREATE TABLE IF NOT EXISTS stores (
                store_id {pk},
                store_name VARCHAR(128) NOT NULL,
                partner_level INTEGER NOT NULL,
                created_at VARCHAR(40),
                gps_lat DOUBLE PRECISION,
                gps_lng DOUBLE PRECISION,
                place_id VARCHAR(128),
                review_summary TEXT,
                top_dish_1 VARCHAR(128),
                top_dish_2 VARCHAR(128),
                top_dish_3 VARCHAR(128),
                top_dish_4 VARCHAR(128),
                top_dish_5 VARCHAR(128),
                main_photo_url TEXT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS menus (
                menu_id {pk},
                store_id BIGINT NOT NULL,
                version INTEGER NOT NULL,
                effective_date VARCHAR(40)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS menu_items (
                menu_item_id {pk},
                menu_id BIGINT NOT NULL,
                item_name VARCHAR(256) NOT NULL,
                price_big INTEGER,
                price_small INTEGER
            )"
        ),
        "CREATE TABLE IF NOT EXISTS menu_translations (
            menu_item_id BIGINT NOT NULL,
            lang_code VARCHAR(16) NOT NULL,
            description TEXT,
            UNIQUE (menu_item_id, lang_code)
        )"
        .to_string(),
        "CREATE TABLE IF NOT EXISTS languages (
            lang_code VARCHAR(16) PRIMARY KEY,
            lang_name VARCHAR(64) NOT NULL,
            translation_lang_code VARCHAR(16),
            stt_lang_code VARCHAR(16)
        )"
        .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS ocr_menus (
                ocr_menu_id {pk},
                store_name VARCHAR(128) NOT NULL,
                store_id BIGINT,
                user_id VARCHAR(64),
                upload_time VARCHAR(40)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS ocr_menu_items (
                ocr_menu_item_id {pk},
                ocr_menu_id BIGINT NOT NULL,
                item_name VARCHAR(256) NOT NULL,
                price_big INTEGER,
                price_small INTEGER,
                translated_desc TEXT
            )"
        ),
        // `menu_item_id` here references ocr_menu_items.ocr_menu_item_id;
        // the column name is a historical carry-over in the staging schema.
        "CREATE TABLE IF NOT EXISTS ocr_menu_translations (
            menu_item_id BIGINT NOT NULL,
            lang_code VARCHAR(16) NOT NULL,
            description TEXT
        )"
        .to_string(),
    ];

    for stmt in &tables {
        sql.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(format!("schema init failed: {}", e)))?;
    }

    // MySQL has no CREATE INDEX IF NOT EXISTS, so index creation is
    // best-effort: a duplicate-index error on restart is ignored.
    let indexes = [
        "CREATE INDEX idx_stores_name ON stores(store_name)",
        "CREATE INDEX idx_menus_store ON menus(store_id)",
        "CREATE INDEX idx_items_menu ON menu_items(menu_id)",
        "CREATE INDEX idx_tr_item ON menu_translations(menu_item_id)",
        "CREATE INDEX idx_ocr_items_menu ON ocr_menu_items(ocr_menu_id)",
        "CREATE INDEX idx_ocr_tr_item ON ocr_menu_translations(menu_item_id)",
        "CREATE INDEX idx_ocr_menus_name ON ocr_menus(store_name)",
    ];
    for stmt in &indexes {
        if let Err(e) = sql.exec(stmt, &[]) {
            debug!(error = %e, "index creation skipped");
        }
    }

    Ok(())
}
