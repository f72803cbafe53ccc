use std::collections::HashMap;

use regex::Regex;

use crate::models::Row;

/// Localized (Korean) column labels of the `stores` dataset and their storage names.
pub const STORES_COLUMNS: [(&str, &str); 39] = [
    ("상가업소번호", "col1"),
    ("상호명", "col2"),
    ("지점명", "col3"),
    ("상권업종대분류코드", "col4"),
    ("상권업종대분류명", "col5"),
    ("상권업종중분류코드", "col6"),
    ("상권업종중분류명", "col7"),
    ("상권업종소분류코드", "col8"),
    ("상권업종소분류명", "col9"),
    ("표준산업분류코드", "col10"),
    ("표준산업분류명", "col11"),
    ("시도코드", "col12"),
    ("시도명", "col13"),
    ("시군구코드", "col14"),
    ("시군구명", "col15"),
    ("행정동코드", "col16"),
    ("행정동명", "col17"),
    ("법정동코드", "col18"),
    ("법정동명", "col19"),
    ("지번코드", "col20"),
    ("대지구분코드", "col21"),
    ("대지구분명", "col22"),
    ("지번본번지", "col23"),
    ("지번부번지", "col24"),
    ("지번주소", "col25"),
    ("도로명코드", "col26"),
    ("도로명", "col27"),
    ("건물본번지", "col28"),
    ("건물부번지", "col29"),
    ("건물관리번호", "col30"),
    ("건물명", "col31"),
    ("도로명주소", "col32"),
    ("구우편번호", "col33"),
    ("신우편번호", "col34"),
    ("동정보", "col35"),
    ("층정보", "col36"),
    ("호정보", "col37"),
    ("경도", "col38"),
    ("위도", "col39"),
];

struct Replacement {
    pattern: Regex,
    internal: String,
}

/// Rewrites localized column names in query text to storage names, and storage
/// names in result rows back to localized ones.
///
/// Substitution is purely textual: a localized name that appears inside a
/// string literal or a longer identifier is rewritten as well.
pub struct ColumnTranslator {
    // Longest localized name first, so `도로명주소` is consumed before `도로명`.
    replacements: Vec<Replacement>,
    to_internal: HashMap<String, String>,
    to_localized: HashMap<String, String>,
}

impl ColumnTranslator {
    pub fn new<I, K, V>(mapping: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = mapping
            .into_iter()
            .map(|(localized, internal)| (localized.into(), internal.into()))
            .collect();
        pairs.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()));

        let replacements = pairs
            .iter()
            .map(|(localized, internal)| {
                Ok(Replacement {
                    pattern: quoted_name_pattern(localized)?,
                    internal: internal.clone(),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let to_internal = pairs.iter().cloned().collect();
        let to_localized = pairs
            .iter()
            .map(|(localized, internal)| (internal.clone(), localized.clone()))
            .collect();

        Ok(Self {
            replacements,
            to_internal,
            to_localized,
        })
    }

    pub fn stores() -> Result<Self, regex::Error> {
        Self::new(STORES_COLUMNS)
    }

    pub fn to_internal(&self, query: &str) -> String {
        let mut translated = query.to_string();
        for replacement in &self.replacements {
            translated = replacement
                .pattern
                .replace_all(&translated, regex::NoExpand(&replacement.internal))
                .into_owned();
        }
        translated
    }

    pub fn to_external(&self, rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(key, value)| (self.localize(&key), value))
                    .collect()
            })
            .collect()
    }

    pub fn columns_to_external(&self, columns: Vec<String>) -> Vec<String> {
        columns.iter().map(|name| self.localize(name)).collect()
    }

    pub fn internal_name(&self, localized: &str) -> Option<&str> {
        self.to_internal.get(localized).map(String::as_str)
    }

    pub fn localized_name(&self, internal: &str) -> Option<&str> {
        self.to_localized.get(internal).map(String::as_str)
    }

    fn localize(&self, name: &str) -> String {
        self.localized_name(name).unwrap_or(name).to_string()
    }
}

fn quoted_name_pattern(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("[\"'`]?{}[\"'`]?", regex::escape(name)))
}
