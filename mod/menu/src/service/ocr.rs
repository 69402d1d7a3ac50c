use tracing::{error, info};

use menuerp_core::{now_rfc3339, ServiceError};
use menuerp_sql::{SqlError, SqlTransaction, Value};

use crate::model::{ImportOutcome, OcrMenuSummary, StagedItem};
use super::MenuService;

impl MenuService {
    /// Stage a recognized menu batch: one ocr_menus row, its items, and
    /// their per-item translations, in one transaction. `store_id` is
    /// resolved from the name when a matching store already exists; the
    /// staged rows otherwise wait under the name alone.
    pub fn stage_menu(
        &self,
        store_name: &str,
        user_id: Option<&str>,
        items: &[StagedItem],
    ) -> Result<i64, ServiceError> {
        let store_name = store_name.trim();
        if store_name.is_empty() {
            return Err(ServiceError::Validation("store_name is required".into()));
        }
        for item in items {
            if item.item_name.trim().is_empty() {
                return Err(ServiceError::Validation("item_name is required".into()));
            }
            for (i, t) in item.translations.iter().enumerate() {
                if item.translations[..i].iter().any(|p| p.lang_code == t.lang_code) {
                    return Err(ServiceError::Validation(format!(
                        "duplicate language '{}' for staged item '{}'",
                        t.lang_code, item.item_name
                    )));
                }
            }
        }

        self.in_transaction("ocr staging", |tx| {
            // A failed lookup aborts the staging; only a genuinely absent
            // store leaves store_id unset.
            let store_id = self.resolve_store_id(tx, store_name)?;

            let insert_menu = format!(
                "INSERT INTO ocr_menus (store_name, store_id, user_id, upload_time) \
                 VALUES ({}, {}, {}, {})",
                self.sql.marker(1),
                self.sql.marker(2),
                self.sql.marker(3),
                self.sql.marker(4)
            );
            let ocr_menu_id = tx
                .insert_returning_id(
                    &insert_menu,
                    &[
                        Value::Text(store_name.to_string()),
                        Value::opt_i64(store_id),
                        Value::opt_text(user_id.map(str::to_string)),
                        Value::Text(now_rfc3339()),
                    ],
                )
                .map_err(|e| self.storage_err("ocr staging", e))?;

            let insert_item = format!(
                "INSERT INTO ocr_menu_items \
                 (ocr_menu_id, item_name, price_big, price_small, translated_desc) \
                 VALUES ({}, {}, {}, {}, {})",
                self.sql.marker(1),
                self.sql.marker(2),
                self.sql.marker(3),
                self.sql.marker(4),
                self.sql.marker(5)
            );
            let insert_translation = format!(
                "INSERT INTO ocr_menu_translations (menu_item_id, lang_code, description) \
                 VALUES ({}, {}, {})",
                self.sql.marker(1),
                self.sql.marker(2),
                self.sql.marker(3)
            );

            for item in items {
                let staged_item_id = tx
                    .insert_returning_id(
                        &insert_item,
                        &[
                            Value::Integer(ocr_menu_id),
                            Value::Text(item.item_name.trim().to_string()),
                            Value::opt_i64(item.price_big),
                            Value::opt_i64(item.price_small),
                            Value::opt_text(item.translated_desc.clone()),
                        ],
                    )
                    .map_err(|e| self.storage_err("ocr staging", e))?;

                for t in &item.translations {
                    tx.exec(
                        &insert_translation,
                        &[
                            Value::Integer(staged_item_id),
                            Value::Text(t.lang_code.clone()),
                            Value::Text(t.description.clone()),
                        ],
                    )
                    .map_err(|e| self.storage_err("ocr staging", e))?;
                }
            }

            info!(store_name, ocr_menu_id, items = items.len(), "ocr menu staged");
            Ok(ocr_menu_id)
        })
    }

    /// Staged upload batches awaiting review, with item counts.
    pub fn list_staged_menus(&self) -> Result<Vec<OcrMenuSummary>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT om.ocr_menu_id, om.store_name, om.store_id, om.user_id, om.upload_time, \
                        COUNT(oi.ocr_menu_item_id) AS item_count \
                 FROM ocr_menus om \
                 LEFT JOIN ocr_menu_items oi ON oi.ocr_menu_id = om.ocr_menu_id \
                 GROUP BY om.ocr_menu_id, om.store_name, om.store_id, om.user_id, om.upload_time \
                 ORDER BY om.ocr_menu_id DESC",
                &[],
            )
            .map_err(|e| self.storage_err("ocr listing", e))?;

        Ok(rows
            .iter()
            .map(|r| OcrMenuSummary {
                ocr_menu_id: r.get_i64("ocr_menu_id").unwrap_or_default(),
                store_name: r.get_str("store_name").unwrap_or_default().to_string(),
                store_id: r.get_i64("store_id"),
                user_id: r.get_str("user_id").map(str::to_string),
                upload_time: r.get_str("upload_time").map(str::to_string),
                item_count: r.get_i64("item_count").unwrap_or(0),
            })
            .collect())
    }

    /// Migrate one store's staged OCR menu into the production schema,
    /// atomically, with cleanup.
    ///
    /// Within a single transaction: resolve the store, create a new menu
    /// version, copy every staged item and its translations into the
    /// production tables, then purge the staging rows in dependency order.
    /// Any failure rolls the whole thing back, leaving the staged data
    /// intact for retry.
    pub fn import_ocr_menu(&self, store_name: &str) -> Result<ImportOutcome, ServiceError> {
        let store_name = store_name.trim().to_string();
        if store_name.is_empty() {
            return Err(ServiceError::Validation("store_name is required".into()));
        }
        self.in_transaction("ocr import", |tx| self.import_in_tx(tx, &store_name))
    }

    fn import_in_tx(
        &self,
        tx: &mut dyn SqlTransaction,
        store_name: &str,
    ) -> Result<ImportOutcome, ServiceError> {
        let fail = |step: &'static str, e: SqlError| {
            error!(store_name, step, error = %e, "ocr import failed");
            ServiceError::Storage("menu import failed".into())
        };

        let store_id = self
            .resolve_store_id(tx, store_name)
            .map_err(|e| match e {
                ServiceError::Storage(_) => ServiceError::Storage("menu import failed".into()),
                other => other,
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("store '{}' not found", store_name)))?;

        // The import always opens version 1; nothing here bumps an existing
        // version (kept as observed — see DESIGN.md on versioning policy).
        let menu_id = self
            .create_menu_version(tx, store_id, 1)
            .map_err(|e| match e {
                ServiceError::Storage(_) => ServiceError::Storage("menu import failed".into()),
                other => other,
            })?;

        let select_items = format!(
            "SELECT oi.ocr_menu_item_id, oi.item_name, oi.price_big, oi.price_small \
             FROM ocr_menu_items oi \
             JOIN ocr_menus om ON oi.ocr_menu_id = om.ocr_menu_id \
             WHERE om.store_name = {}",
            self.sql.marker(1)
        );
        let staged = tx
            .query(&select_items, &[Value::Text(store_name.to_string())])
            .map_err(|e| fail("fetch staged items", e))?;

        if staged.is_empty() {
            info!(store_name, menu_id, "no staged items; created empty menu version");
            return Ok(ImportOutcome { imported_count: 0 });
        }

        let insert_item = format!(
            "INSERT INTO menu_items (menu_id, item_name, price_big, price_small) \
             VALUES ({}, {}, {}, {})",
            self.sql.marker(1),
            self.sql.marker(2),
            self.sql.marker(3),
            self.sql.marker(4)
        );
        let select_translations = format!(
            "SELECT lang_code, description FROM ocr_menu_translations WHERE menu_item_id = {}",
            self.sql.marker(1)
        );
        let insert_translation = format!(
            "INSERT INTO menu_translations (menu_item_id, lang_code, description) \
             VALUES ({}, {}, {})",
            self.sql.marker(1),
            self.sql.marker(2),
            self.sql.marker(3)
        );

        for row in &staged {
            let staged_item_id = row.get_i64("ocr_menu_item_id").unwrap_or_default();
            let item_name = row.get_str("item_name").unwrap_or_default();

            let menu_item_id = tx
                .insert_returning_id(
                    &insert_item,
                    &[
                        Value::Integer(menu_id),
                        Value::Text(item_name.to_string()),
                        Value::opt_i64(row.get_i64("price_big")),
                        Value::opt_i64(row.get_i64("price_small")),
                    ],
                )
                .map_err(|e| fail("copy item", e))?;

            let translations = tx
                .query(&select_translations, &[Value::Integer(staged_item_id)])
                .map_err(|e| fail("fetch staged translations", e))?;

            for t in &translations {
                tx.exec(
                    &insert_translation,
                    &[
                        Value::Integer(menu_item_id),
                        Value::Text(t.get_str("lang_code").unwrap_or_default().to_string()),
                        Value::Text(t.get_str("description").unwrap_or_default().to_string()),
                    ],
                )
                .map_err(|e| fail("copy translation", e))?;
            }
        }

        // Purge staging rows in dependency order: translations, items, batch.
        let delete_translations = format!(
            "DELETE FROM ocr_menu_translations WHERE menu_item_id IN ( \
                SELECT oi.ocr_menu_item_id FROM ocr_menu_items oi \
                JOIN ocr_menus om ON oi.ocr_menu_id = om.ocr_menu_id \
                WHERE om.store_name = {})",
            self.sql.marker(1)
        );
        tx.exec(&delete_translations, &[Value::Text(store_name.to_string())])
            .map_err(|e| fail("purge staged translations", e))?;

        let delete_items = format!(
            "DELETE FROM ocr_menu_items WHERE ocr_menu_id IN ( \
                SELECT ocr_menu_id FROM ocr_menus WHERE store_name = {})",
            self.sql.marker(1)
        );
        tx.exec(&delete_items, &[Value::Text(store_name.to_string())])
            .map_err(|e| fail("purge staged items", e))?;

        let delete_menus = format!(
            "DELETE FROM ocr_menus WHERE store_name = {}",
            self.sql.marker(1)
        );
        tx.exec(&delete_menus, &[Value::Text(store_name.to_string())])
            .map_err(|e| fail("purge staged batch", e))?;

        info!(
            store_name,
            menu_id,
            imported = staged.len(),
            "ocr menu imported"
        );
        Ok(ImportOutcome {
            imported_count: staged.len(),
        })
    }

    /// Exact-name store lookup. Runs on the caller's transaction.
    pub(crate) fn resolve_store_id(
        &self,
        tx: &mut dyn SqlTransaction,
        store_name: &str,
    ) -> Result<Option<i64>, ServiceError> {
        let sql = format!(
            "SELECT store_id FROM stores WHERE store_name = {}",
            self.sql.marker(1)
        );
        let rows = tx
            .query(&sql, &[Value::Text(store_name.to_string())])
            .map_err(|e| self.storage_err("store resolution", e))?;
        Ok(rows.first().and_then(|r| r.get_i64("store_id")))
    }
}
