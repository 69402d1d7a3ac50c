use tracing::info;

use menuerp_core::{now_rfc3339, ServiceError};
use menuerp_sql::{SqlTransaction, Value};

use crate::model::{MenuItem, MenuItemView, Translation, TranslationView};
use super::MenuService;

impl MenuService {
    /// Items of a store's menus with their translations grouped per item,
    /// ordered by item id then language.
    pub fn list_menu_items(&self, store_id: i64) -> Result<Vec<MenuItemView>, ServiceError> {
        let sql = format!(
            "SELECT mi.menu_item_id, mi.item_name, mi.price_big, mi.price_small, \
                    mt.lang_code, l.lang_name, mt.description \
             FROM menu_items mi \
             JOIN menus m ON mi.menu_id = m.menu_id \
             LEFT JOIN menu_translations mt ON mi.menu_item_id = mt.menu_item_id \
             LEFT JOIN languages l ON mt.lang_code = l.lang_code \
             WHERE m.store_id = {} \
             ORDER BY mi.menu_item_id, mt.lang_code",
            self.sql.marker(1)
        );
        let rows = self
            .sql
            .query(&sql, &[Value::Integer(store_id)])
            .map_err(|e| self.storage_err("menu item listing", e))?;

        let mut items: Vec<MenuItemView> = Vec::new();
        for row in &rows {
            let id = row.get_i64("menu_item_id").unwrap_or_default();
            if items.last().map(|i| i.menu_item_id) != Some(id) {
                items.push(MenuItemView {
                    menu_item_id: id,
                    item_name: row.get_str("item_name").unwrap_or_default().to_string(),
                    price_big: row.get_i64("price_big"),
                    price_small: row.get_i64("price_small"),
                    translations: Vec::new(),
                });
            }
            if let (Some(code), Some(desc)) = (row.get_str("lang_code"), row.get_str("description"))
            {
                let lang_name = row.get_str("lang_name").unwrap_or(code).to_string();
                if let Some(current) = items.last_mut() {
                    current.translations.push(TranslationView {
                        lang_code: code.to_string(),
                        lang_name,
                        description: desc.to_string(),
                    });
                }
            }
        }
        Ok(items)
    }

    /// Fetch one item row.
    pub fn get_menu_item(&self, menu_item_id: i64) -> Result<MenuItem, ServiceError> {
        let sql = format!(
            "SELECT menu_item_id, menu_id, item_name, price_big, price_small \
             FROM menu_items WHERE menu_item_id = {}",
            self.sql.marker(1)
        );
        let rows = self
            .sql
            .query(&sql, &[Value::Integer(menu_item_id)])
            .map_err(|e| self.storage_err("menu item lookup", e))?;
        let row = rows.first().ok_or_else(|| {
            ServiceError::NotFound(format!("menu item {} not found", menu_item_id))
        })?;
        Ok(MenuItem {
            menu_item_id: row.get_i64("menu_item_id").unwrap_or_default(),
            menu_id: row.get_i64("menu_id").unwrap_or_default(),
            item_name: row.get_str("item_name").unwrap_or_default().to_string(),
            price_big: row.get_i64("price_big"),
            price_small: row.get_i64("price_small"),
        })
    }

    /// Add an item to a store's current menu. The store's first item also
    /// creates its menu row (version 1).
    pub fn add_menu_item(
        &self,
        store_id: i64,
        item_name: &str,
        price_big: Option<i64>,
        price_small: Option<i64>,
    ) -> Result<MenuItem, ServiceError> {
        let item_name = item_name.trim();
        if item_name.is_empty() {
            return Err(ServiceError::Validation("item_name is required".into()));
        }
        // Store must exist before any menu is hung off it.
        self.get_store(store_id)?;

        self.in_transaction("menu item creation", |tx| {
            let menu_id = match self.current_menu_id(tx, store_id)? {
                Some(id) => id,
                None => self.create_menu_version(tx, store_id, 1)?,
            };

            let sql = format!(
                "INSERT INTO menu_items (menu_id, item_name, price_big, price_small) \
                 VALUES ({}, {}, {}, {})",
                self.sql.marker(1),
                self.sql.marker(2),
                self.sql.marker(3),
                self.sql.marker(4)
            );
            let menu_item_id = tx
                .insert_returning_id(
                    &sql,
                    &[
                        Value::Integer(menu_id),
                        Value::Text(item_name.to_string()),
                        Value::opt_i64(price_big),
                        Value::opt_i64(price_small),
                    ],
                )
                .map_err(|e| self.storage_err("menu item creation", e))?;

            info!(store_id, menu_item_id, "menu item added");
            Ok(MenuItem {
                menu_item_id,
                menu_id,
                item_name: item_name.to_string(),
                price_big,
                price_small,
            })
        })
    }

    /// Update an item's name and prices.
    pub fn update_menu_item(
        &self,
        menu_item_id: i64,
        item_name: &str,
        price_big: Option<i64>,
        price_small: Option<i64>,
    ) -> Result<MenuItem, ServiceError> {
        let item_name = item_name.trim();
        if item_name.is_empty() {
            return Err(ServiceError::Validation("item_name is required".into()));
        }

        let sql = format!(
            "UPDATE menu_items SET item_name = {}, price_big = {}, price_small = {} \
             WHERE menu_item_id = {}",
            self.sql.marker(1),
            self.sql.marker(2),
            self.sql.marker(3),
            self.sql.marker(4)
        );
        let affected = self
            .sql
            .exec(
                &sql,
                &[
                    Value::Text(item_name.to_string()),
                    Value::opt_i64(price_big),
                    Value::opt_i64(price_small),
                    Value::Integer(menu_item_id),
                ],
            )
            .map_err(|e| self.storage_err("menu item update", e))?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "menu item {} not found",
                menu_item_id
            )));
        }
        self.get_menu_item(menu_item_id)
    }

    /// Replace the whole translation set of an item in one transaction:
    /// delete every existing row, then insert the new set. Languages must
    /// be distinct within the set.
    pub fn replace_translations(
        &self,
        menu_item_id: i64,
        translations: &[Translation],
    ) -> Result<usize, ServiceError> {
        for (i, t) in translations.iter().enumerate() {
            if t.lang_code.trim().is_empty() {
                return Err(ServiceError::Validation("lang_code is required".into()));
            }
            if translations[..i].iter().any(|p| p.lang_code == t.lang_code) {
                return Err(ServiceError::Validation(format!(
                    "duplicate language '{}' in translation set",
                    t.lang_code
                )));
            }
        }
        self.get_menu_item(menu_item_id)?;

        self.in_transaction("translation replace", |tx| {
            let delete = format!(
                "DELETE FROM menu_translations WHERE menu_item_id = {}",
                self.sql.marker(1)
            );
            tx.exec(&delete, &[Value::Integer(menu_item_id)])
                .map_err(|e| self.storage_err("translation replace", e))?;

            let insert = format!(
                "INSERT INTO menu_translations (menu_item_id, lang_code, description) \
                 VALUES ({}, {}, {})",
                self.sql.marker(1),
                self.sql.marker(2),
                self.sql.marker(3)
            );
            for t in translations {
                tx.exec(
                        &insert,
                        &[
                            Value::Integer(menu_item_id),
                            Value::Text(t.lang_code.clone()),
                            Value::Text(t.description.clone()),
                        ],
                    )
                    .map_err(|e| self.storage_err("translation replace", e))?;
            }
            info!(menu_item_id, count = translations.len(), "translations replaced");
            Ok(translations.len())
        })
    }

    /// The store's newest menu, if any. Runs on the caller's transaction.
    pub(crate) fn current_menu_id(
        &self,
        tx: &mut dyn SqlTransaction,
        store_id: i64,
    ) -> Result<Option<i64>, ServiceError> {
        let sql = format!(
            "SELECT menu_id FROM menus WHERE store_id = {} ORDER BY version DESC, menu_id DESC",
            self.sql.marker(1)
        );
        let rows = tx
            .query(&sql, &[Value::Integer(store_id)])
            .map_err(|e| self.storage_err("menu lookup", e))?;
        Ok(rows.first().and_then(|r| r.get_i64("menu_id")))
    }

    /// Insert a menu row for a store at the given version. Runs on the
    /// caller's transaction.
    pub(crate) fn create_menu_version(
        &self,
        tx: &mut dyn SqlTransaction,
        store_id: i64,
        version: i64,
    ) -> Result<i64, ServiceError> {
        let sql = format!(
            "INSERT INTO menus (store_id, version, effective_date) VALUES ({}, {}, {})",
            self.sql.marker(1),
            self.sql.marker(2),
            self.sql.marker(3)
        );
        tx.insert_returning_id(
            &sql,
            &[
                Value::Integer(store_id),
                Value::Integer(version),
                Value::Text(now_rfc3339()),
            ],
        )
        .map_err(|e| self.storage_err("menu creation", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StoreFields;
    use crate::service::tests::service;
    use crate::service::MenuService;

    fn store(svc: &MenuService, name: &str) -> i64 {
        svc.create_store(StoreFields {
            store_name: name.into(),
            partner_level: Some(1),
            ..Default::default()
        })
        .unwrap()
        .store_id
    }

    fn tr(code: &str, desc: &str) -> Translation {
        Translation {
            lang_code: code.into(),
            description: desc.into(),
        }
    }

    #[test]
    fn first_item_creates_menu_version_one() {
        let svc = service();
        let store_id = store(&svc, "Shop");
        let item = svc.add_menu_item(store_id, "牛肉麵", Some(180), None).unwrap();
        assert!(item.menu_item_id > 0);

        let menus = svc
            .sql
            .query("SELECT store_id, version FROM menus", &[])
            .unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].get_i64("version"), Some(1));

        // Second item reuses the same menu.
        let second = svc.add_menu_item(store_id, "小菜", None, Some(50)).unwrap();
        assert_eq!(second.menu_id, item.menu_id);
    }

    #[test]
    fn add_item_to_missing_store_not_found() {
        let svc = service();
        assert!(matches!(
            svc.add_menu_item(42, "X", None, None),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn update_item_changes_prices() {
        let svc = service();
        let store_id = store(&svc, "Shop");
        let item = svc.add_menu_item(store_id, "滷肉飯", Some(60), Some(40)).unwrap();
        let updated = svc
            .update_menu_item(item.menu_item_id, "滷肉飯(大)", Some(70), None)
            .unwrap();
        assert_eq!(updated.item_name, "滷肉飯(大)");
        assert_eq!(updated.price_big, Some(70));
        assert_eq!(updated.price_small, None);
    }

    #[test]
    fn replace_translations_is_wholesale() {
        let svc = service();
        let store_id = store(&svc, "Shop");
        let item = svc.add_menu_item(store_id, "炒飯", None, Some(150)).unwrap();

        svc.replace_translations(item.menu_item_id, &[tr("en", "Fried Rice")])
            .unwrap();
        svc.replace_translations(
            item.menu_item_id,
            &[tr("ja", "チャーハン"), tr("ko", "볶음밥")],
        )
        .unwrap();

        let views = svc.list_menu_items(store_id).unwrap();
        let langs: Vec<&str> = views[0]
            .translations
            .iter()
            .map(|t| t.lang_code.as_str())
            .collect();
        // The earlier English row is gone; the new set replaced it.
        assert_eq!(langs, vec!["ja", "ko"]);
    }

    #[test]
    fn duplicate_language_in_set_rejected() {
        let svc = service();
        let store_id = store(&svc, "Shop");
        let item = svc.add_menu_item(store_id, "炒飯", None, None).unwrap();
        let err = svc
            .replace_translations(item.menu_item_id, &[tr("en", "a"), tr("en", "b")])
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn listing_groups_translations_per_item() {
        let svc = service();
        let store_id = store(&svc, "Shop");
        svc.add_language(crate::model::Language {
            lang_code: "en".into(),
            lang_name: "English".into(),
            translation_lang_code: None,
            stt_lang_code: None,
        })
        .unwrap();

        let a = svc.add_menu_item(store_id, "小籠包", None, Some(220)).unwrap();
        let b = svc.add_menu_item(store_id, "炒飯", None, Some(150)).unwrap();
        svc.replace_translations(a.menu_item_id, &[tr("en", "Xiao Long Bao")])
            .unwrap();

        let views = svc.list_menu_items(store_id).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].menu_item_id, a.menu_item_id);
        assert_eq!(views[0].translations.len(), 1);
        assert_eq!(views[0].translations[0].lang_name, "English");
        assert_eq!(views[1].menu_item_id, b.menu_item_id);
        assert!(views[1].translations.is_empty());
    }
}
