use tracing::info;

use menuerp_core::ServiceError;
use menuerp_sql::{SqlError, Value};

use crate::model::Language;
use super::MenuService;

impl MenuService {
    /// List languages, optionally filtered by a substring of the code or
    /// display name, ordered by lang_code.
    pub fn list_languages(&self, search: Option<&str>) -> Result<Vec<Language>, ServiceError> {
        let mut params: Vec<Value> = Vec::new();
        let mut sql = String::from(
            "SELECT lang_code, lang_name, translation_lang_code, stt_lang_code FROM languages",
        );

        if let Some(term) = search.filter(|s| !s.is_empty()) {
            let like = format!("%{}%", term);
            params.push(Value::Text(like.clone()));
            params.push(Value::Text(like));
            sql.push_str(&format!(
                " WHERE lang_code LIKE {} OR lang_name LIKE {}",
                self.sql.marker(1),
                self.sql.marker(2)
            ));
        }
        sql.push_str(" ORDER BY lang_code");

        let rows = self
            .sql
            .query(&sql, &params)
            .map_err(|e| self.storage_err("language listing", e))?;

        Ok(rows
            .iter()
            .map(|r| Language {
                lang_code: r.get_str("lang_code").unwrap_or_default().to_string(),
                lang_name: r.get_str("lang_name").unwrap_or_default().to_string(),
                translation_lang_code: r.get_str("translation_lang_code").map(str::to_string),
                stt_lang_code: r.get_str("stt_lang_code").map(str::to_string),
            })
            .collect())
    }

    /// Add a language. The code must be unique.
    pub fn add_language(&self, lang: Language) -> Result<Language, ServiceError> {
        if lang.lang_code.trim().is_empty() || lang.lang_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "lang_code and lang_name are required".into(),
            ));
        }

        let sql = format!(
            "INSERT INTO languages (lang_code, lang_name, translation_lang_code, stt_lang_code) \
             VALUES ({}, {}, {}, {})",
            self.sql.marker(1),
            self.sql.marker(2),
            self.sql.marker(3),
            self.sql.marker(4)
        );
        self.sql
            .exec(
                &sql,
                &[
                    Value::Text(lang.lang_code.clone()),
                    Value::Text(lang.lang_name.clone()),
                    Value::opt_text(lang.translation_lang_code.clone()),
                    Value::opt_text(lang.stt_lang_code.clone()),
                ],
            )
            .map_err(|e| match e {
                SqlError::Constraint(_) => ServiceError::Conflict(format!(
                    "language code '{}' already exists",
                    lang.lang_code
                )),
                other => self.storage_err("language creation", other),
            })?;

        info!(lang_code = %lang.lang_code, "language added");
        Ok(lang)
    }

    /// Rename/update a language identified by its original code.
    pub fn edit_language(
        &self,
        original_lang_code: &str,
        lang_name: &str,
        translation_lang_code: Option<String>,
        stt_lang_code: Option<String>,
    ) -> Result<(), ServiceError> {
        if original_lang_code.trim().is_empty() || lang_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "original_lang_code and lang_name are required".into(),
            ));
        }

        let sql = format!(
            "UPDATE languages SET lang_name = {}, translation_lang_code = {}, \
             stt_lang_code = {} WHERE lang_code = {}",
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
                    Value::Text(lang_name.to_string()),
                    Value::opt_text(translation_lang_code),
                    Value::opt_text(stt_lang_code),
                    Value::Text(original_lang_code.to_string()),
                ],
            )
            .map_err(|e| self.storage_err("language update", e))?;

        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "language '{}' not found",
                original_lang_code
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::service;

    fn lang(code: &str, name: &str) -> Language {
        Language {
            lang_code: code.into(),
            lang_name: name.into(),
            translation_lang_code: None,
            stt_lang_code: None,
        }
    }

    #[test]
    fn add_and_list_languages() {
        let svc = service();
        svc.add_language(lang("ja", "Japanese")).unwrap();
        svc.add_language(lang("en", "English")).unwrap();

        let all = svc.list_languages(None).unwrap();
        let codes: Vec<&str> = all.iter().map(|l| l.lang_code.as_str()).collect();
        assert_eq!(codes, vec!["en", "ja"]);
    }

    #[test]
    fn search_matches_code_or_name() {
        let svc = service();
        svc.add_language(lang("en", "English")).unwrap();
        svc.add_language(lang("ja", "Japanese")).unwrap();

        let by_code = svc.list_languages(Some("ja")).unwrap();
        assert_eq!(by_code.len(), 2); // "ja" matches code ja and name Japanese
        let by_name = svc.list_languages(Some("Engl")).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].lang_code, "en");
    }

    #[test]
    fn duplicate_code_conflicts() {
        let svc = service();
        svc.add_language(lang("en", "English")).unwrap();
        let err = svc.add_language(lang("en", "Anglais")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn edit_renames_language() {
        let svc = service();
        svc.add_language(lang("zh", "Chinese")).unwrap();
        svc.edit_language("zh", "Mandarin", Some("zh-TW".into()), None)
            .unwrap();
        let all = svc.list_languages(Some("zh")).unwrap();
        assert_eq!(all[0].lang_name, "Mandarin");
        assert_eq!(all[0].translation_lang_code.as_deref(), Some("zh-TW"));
    }

    #[test]
    fn edit_unknown_language_not_found() {
        let svc = service();
        assert!(matches!(
            svc.edit_language("xx", "Nothing", None, None),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let svc = service();
        assert!(matches!(
            svc.add_language(lang("", "X")),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            svc.edit_language("en", "", None, None),
            Err(ServiceError::Validation(_))
        ));
    }
}
