use tracing::info;

use menuerp_core::{now_rfc3339, ListResult, ServiceError};
use menuerp_sql::{Row, Value};

use crate::model::{Store, StoreFields, StoreSummary};
use super::MenuService;

/// Filters for the paginated store listing.
#[derive(Debug, Default)]
pub struct StoreFilters {
    /// Substring match on store_name.
    pub name: Option<String>,
    /// Exact match on partner_level.
    pub level: Option<i64>,
}

const STORE_COLUMNS: &str = "store_id, store_name, partner_level, created_at, gps_lat, gps_lng, \
     place_id, review_summary, top_dish_1, top_dish_2, top_dish_3, top_dish_4, top_dish_5, \
     main_photo_url";

fn store_from_row(row: &Row) -> Store {
    Store {
        store_id: row.get_i64("store_id").unwrap_or_default(),
        store_name: row.get_str("store_name").unwrap_or_default().to_string(),
        partner_level: row.get_i64("partner_level").unwrap_or_default(),
        created_at: row.get_str("created_at").map(str::to_string),
        gps_lat: row.get_f64("gps_lat"),
        gps_lng: row.get_f64("gps_lng"),
        place_id: row.get_str("place_id").map(str::to_string),
        review_summary: row.get_str("review_summary").map(str::to_string),
        top_dish_1: row.get_str("top_dish_1").map(str::to_string),
        top_dish_2: row.get_str("top_dish_2").map(str::to_string),
        top_dish_3: row.get_str("top_dish_3").map(str::to_string),
        top_dish_4: row.get_str("top_dish_4").map(str::to_string),
        top_dish_5: row.get_str("top_dish_5").map(str::to_string),
        main_photo_url: row.get_str("main_photo_url").map(str::to_string),
    }
}

impl MenuService {
    /// Create a store. `store_name` and `partner_level` are required.
    pub fn create_store(&self, fields: StoreFields) -> Result<Store, ServiceError> {
        let store_name = fields.store_name.trim().to_string();
        if store_name.is_empty() {
            return Err(ServiceError::Validation("store_name is required".into()));
        }
        let partner_level = fields
            .partner_level
            .ok_or_else(|| ServiceError::Validation("partner_level is required".into()))?;

        let created_at = now_rfc3339();
        let markers: Vec<String> = (1..=14).map(|i| self.sql.marker(i)).collect();
        let sql = format!(
            "INSERT INTO stores ({}) VALUES ({})",
            STORE_COLUMNS
                .split(", ")
                .filter(|c| *c != "store_id")
                .collect::<Vec<_>>()
                .join(", "),
            markers[..13].join(", ")
        );
        let params = vec![
            Value::Text(store_name.clone()),
            Value::Integer(partner_level),
            Value::Text(created_at.clone()),
            fields.gps_lat.map(Value::Real).unwrap_or(Value::Null),
            fields.gps_lng.map(Value::Real).unwrap_or(Value::Null),
            Value::opt_text(fields.place_id.clone()),
            Value::opt_text(fields.review_summary.clone()),
            Value::opt_text(fields.top_dish_1.clone()),
            Value::opt_text(fields.top_dish_2.clone()),
            Value::opt_text(fields.top_dish_3.clone()),
            Value::opt_text(fields.top_dish_4.clone()),
            Value::opt_text(fields.top_dish_5.clone()),
            Value::opt_text(fields.main_photo_url.clone()),
        ];

        let store_id = self
            .sql
            .insert_returning_id(&sql, &params)
            .map_err(|e| self.storage_err("store creation", e))?;

        info!(store_id, store_name = %store_name, "store created");
        Ok(Store {
            store_id,
            store_name,
            partner_level,
            created_at: Some(created_at),
            gps_lat: fields.gps_lat,
            gps_lng: fields.gps_lng,
            place_id: fields.place_id,
            review_summary: fields.review_summary,
            top_dish_1: fields.top_dish_1,
            top_dish_2: fields.top_dish_2,
            top_dish_3: fields.top_dish_3,
            top_dish_4: fields.top_dish_4,
            top_dish_5: fields.top_dish_5,
            main_photo_url: fields.main_photo_url,
        })
    }

    /// Fetch one store by id.
    pub fn get_store(&self, store_id: i64) -> Result<Store, ServiceError> {
        let sql = format!(
            "SELECT {} FROM stores WHERE store_id = {}",
            STORE_COLUMNS,
            self.sql.marker(1)
        );
        let rows = self
            .sql
            .query(&sql, &[Value::Integer(store_id)])
            .map_err(|e| self.storage_err("store lookup", e))?;
        rows.first()
            .map(store_from_row)
            .ok_or_else(|| ServiceError::NotFound(format!("store {} not found", store_id)))
    }

    /// Update a store's metadata. The name and level stay required.
    pub fn update_store(&self, store_id: i64, fields: StoreFields) -> Result<Store, ServiceError> {
        let store_name = fields.store_name.trim().to_string();
        if store_name.is_empty() {
            return Err(ServiceError::Validation("store_name is required".into()));
        }
        let partner_level = fields
            .partner_level
            .ok_or_else(|| ServiceError::Validation("partner_level is required".into()))?;

        let cols = [
            "store_name",
            "partner_level",
            "gps_lat",
            "gps_lng",
            "place_id",
            "review_summary",
            "top_dish_1",
            "top_dish_2",
            "top_dish_3",
            "top_dish_4",
            "top_dish_5",
            "main_photo_url",
        ];
        let sets: Vec<String> = cols
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", c, self.sql.marker(i + 1)))
            .collect();
        let sql = format!(
            "UPDATE stores SET {} WHERE store_id = {}",
            sets.join(", "),
            self.sql.marker(cols.len() + 1)
        );
        let params = vec![
            Value::Text(store_name),
            Value::Integer(partner_level),
            fields.gps_lat.map(Value::Real).unwrap_or(Value::Null),
            fields.gps_lng.map(Value::Real).unwrap_or(Value::Null),
            Value::opt_text(fields.place_id),
            Value::opt_text(fields.review_summary),
            Value::opt_text(fields.top_dish_1),
            Value::opt_text(fields.top_dish_2),
            Value::opt_text(fields.top_dish_3),
            Value::opt_text(fields.top_dish_4),
            Value::opt_text(fields.top_dish_5),
            Value::opt_text(fields.main_photo_url),
            Value::Integer(store_id),
        ];

        let affected = self
            .sql
            .exec(&sql, &params)
            .map_err(|e| self.storage_err("store update", e))?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("store {} not found", store_id)));
        }
        self.get_store(store_id)
    }

    /// Paginated, filtered store listing, newest first.
    pub fn list_stores(
        &self,
        filters: &StoreFilters,
        limit: usize,
        offset: usize,
    ) -> Result<ListResult<Store>, ServiceError> {
        let mut params: Vec<Value> = Vec::new();
        let mut clauses: Vec<String> = Vec::new();

        if let Some(name) = filters.name.as_deref().filter(|s| !s.is_empty()) {
            params.push(Value::Text(format!("%{}%", name)));
            clauses.push(format!("store_name LIKE {}", self.sql.marker(params.len())));
        }
        if let Some(level) = filters.level {
            params.push(Value::Integer(level));
            clauses.push(format!("partner_level = {}", self.sql.marker(params.len())));
        }
        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) AS cnt FROM stores{}", where_sql);
        let count_rows = self
            .sql
            .query(&count_sql, &params)
            .map_err(|e| self.storage_err("store count", e))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let page_clause = self.sql.paginate(
            "store_id DESC",
            params.len() + 1,
            &mut params,
            limit as i64,
            offset as i64,
        );
        let data_sql = format!(
            "SELECT {} FROM stores{} {}",
            STORE_COLUMNS, where_sql, page_clause
        );
        let rows = self
            .sql
            .query(&data_sql, &params)
            .map_err(|e| self.storage_err("store listing", e))?;

        Ok(ListResult {
            items: rows.iter().map(store_from_row).collect(),
            total,
        })
    }

    /// Every store, id and name only, ordered by id.
    pub fn list_all_stores(&self) -> Result<Vec<StoreSummary>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT store_id, store_name FROM stores ORDER BY store_id",
                &[],
            )
            .map_err(|e| self.storage_err("store listing", e))?;
        Ok(rows
            .iter()
            .map(|r| StoreSummary {
                store_id: r.get_i64("store_id").unwrap_or_default(),
                store_name: r.get_str("store_name").unwrap_or_default().to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::service;

    fn fields(name: &str, level: i64) -> StoreFields {
        StoreFields {
            store_name: name.into(),
            partner_level: Some(level),
            ..Default::default()
        }
    }

    #[test]
    fn create_and_get_store() {
        let svc = service();
        let created = svc
            .create_store(StoreFields {
                gps_lat: Some(25.033),
                place_id: Some("abc".into()),
                ..fields("Din Tai Fung", 2)
            })
            .unwrap();
        let fetched = svc.get_store(created.store_id).unwrap();
        assert_eq!(fetched.store_name, "Din Tai Fung");
        assert_eq!(fetched.partner_level, 2);
        assert_eq!(fetched.place_id.as_deref(), Some("abc"));
        assert!(fetched.gps_lat.is_some());
    }

    #[test]
    fn create_requires_name_and_level() {
        let svc = service();
        assert!(matches!(
            svc.create_store(fields("  ", 1)),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.create_store(StoreFields {
                store_name: "X".into(),
                partner_level: None,
                ..Default::default()
            }),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn update_store_round_trips() {
        let svc = service();
        let s = svc.create_store(fields("Old Name", 1)).unwrap();
        let updated = svc
            .update_store(
                s.store_id,
                StoreFields {
                    review_summary: Some("busy at noon".into()),
                    ..fields("New Name", 3)
                },
            )
            .unwrap();
        assert_eq!(updated.store_name, "New Name");
        assert_eq!(updated.partner_level, 3);
        assert_eq!(updated.review_summary.as_deref(), Some("busy at noon"));
    }

    #[test]
    fn update_missing_store_not_found() {
        let svc = service();
        assert!(matches!(
            svc.update_store(999, fields("X", 1)),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn list_stores_filters_and_pages() {
        let svc = service();
        for i in 0..12 {
            svc.create_store(fields(&format!("Shop {}", i), (i % 2) + 1))
                .unwrap();
        }
        svc.create_store(fields("Noodle House", 1)).unwrap();

        let all = svc.list_stores(&StoreFilters::default(), 10, 0).unwrap();
        assert_eq!(all.total, 13);
        assert_eq!(all.items.len(), 10);
        // Newest first.
        assert_eq!(all.items[0].store_name, "Noodle House");

        let by_name = svc
            .list_stores(
                &StoreFilters {
                    name: Some("Noodle".into()),
                    level: None,
                },
                10,
                0,
            )
            .unwrap();
        assert_eq!(by_name.total, 1);

        let by_level = svc
            .list_stores(
                &StoreFilters {
                    name: None,
                    level: Some(2),
                },
                10,
                0,
            )
            .unwrap();
        assert!(by_level.items.iter().all(|s| s.partner_level == 2));

        let page2 = svc.list_stores(&StoreFilters::default(), 10, 10).unwrap();
        assert_eq!(page2.items.len(), 3);
    }

    #[test]
    fn all_stores_ordered_by_id() {
        let svc = service();
        svc.create_store(fields("A", 1)).unwrap();
        svc.create_store(fields("B", 1)).unwrap();
        let all = svc.list_all_stores().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].store_id < all[1].store_id);
        assert_eq!(all[0].store_name, "A");
    }
}
