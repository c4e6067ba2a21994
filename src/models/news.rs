use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Title colors offered by the admin form, in display order.
/// An unset color renders with the default ink.
pub const TITLE_COLORS: [&str; 5] = ["#e60000", "#0066cc", "#008000", "#ff9900", "#9933ff"];

/// One announcement, as the rest of the crate sees it.
///
/// `id` is the store-assigned row identifier. It is never synthesized from
/// list position: a row without one is logged as a data-quality problem and
/// cannot be targeted by update/delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display date, independent of the publish window.
    pub date: NaiveDate,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,
    /// Markdown or raw HTML, exactly as authored in the admin form.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub default_expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Row shape as the spreadsheet store actually sends it: ids may be numbers,
/// dates may carry a time component, absent fields may arrive as `""`.
/// Coerced into [`NewsItem`] at the store boundary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNewsItem {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_color: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub default_expanded: Option<Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TryFrom<RawNewsItem> for NewsItem {
    type Error = String;

    fn try_from(raw: RawNewsItem) -> Result<Self, Self::Error> {
        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "row without a title".to_string())?;
        let date = parse_store_date(raw.date.as_deref().unwrap_or_default())
            .ok_or_else(|| format!("bad date on \"{title}\""))?;
        let start_date = parse_optional_date(raw.start_date.as_deref())
            .map_err(|_| format!("bad startDate on \"{title}\""))?;
        let end_date = parse_optional_date(raw.end_date.as_deref())
            .map_err(|_| format!("bad endDate on \"{title}\""))?;

        Ok(NewsItem {
            id: raw.id.and_then(coerce_id),
            date,
            title,
            title_color: raw.title_color.filter(|c| !c.is_empty()),
            content: raw.content.unwrap_or_default(),
            start_date,
            end_date,
            default_expanded: raw.default_expanded.map(truthy).unwrap_or(false),
            created_at: raw.created_at.filter(|c| !c.is_empty()),
        })
    }
}

/// Admin form payload for create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsForm {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub title_color: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub default_expanded: bool,
}

impl NewsForm {
    /// Field object in the wire shape the store expects: camelCase keys,
    /// empty strings for unset optionals.
    pub fn to_store_fields(&self) -> Value {
        json!({
            "date": self.date.to_string(),
            "title": self.title,
            "titleColor": self.title_color.clone().unwrap_or_default(),
            "content": self.content,
            "startDate": self.start_date.map(|d| d.to_string()).unwrap_or_default(),
            "endDate": self.end_date.map(|d| d.to_string()).unwrap_or_default(),
            "defaultExpanded": self.default_expanded,
        })
    }
}

/// Calendar date out of a store date string, tolerating a trailing time
/// component (`2024-01-01T00:00:00.000Z`).
fn parse_store_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Absent or empty means no bound; anything else must parse.
fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>, ()> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(day) => parse_store_date(day).map(Some).ok_or(()),
    }
}

fn coerce_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: Value) -> bool {
    match value {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Treats `""` (and null) the same as an absent field, as HTML forms and
/// the spreadsheet store both produce empty strings for "unset".
fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn coerces_a_loose_store_row() {
        let raw: RawNewsItem = serde_json::from_value(json!({
            "id": 3,
            "date": "2024-06-01T00:00:00.000Z",
            "title": "休診のお知らせ",
            "titleColor": "",
            "content": "6月10日は休診です。",
            "startDate": "2024-06-01",
            "endDate": "",
            "defaultExpanded": "TRUE",
            "createdAt": ""
        }))
        .unwrap();

        let item = NewsItem::try_from(raw).unwrap();
        assert_eq!(item.id.as_deref(), Some("3"));
        assert_eq!(item.date, date("2024-06-01"));
        assert_eq!(item.title_color, None);
        assert_eq!(item.start_date, Some(date("2024-06-01")));
        assert_eq!(item.end_date, None);
        assert!(item.default_expanded);
        assert_eq!(item.created_at, None);
    }

    #[test]
    fn missing_id_stays_missing() {
        let raw: RawNewsItem = serde_json::from_value(json!({
            "date": "2024-06-01",
            "title": "A",
            "content": ""
        }))
        .unwrap();

        // No positional fallback: absence is carried through.
        assert_eq!(NewsItem::try_from(raw).unwrap().id, None);
    }

    #[test]
    fn rejects_rows_without_title_or_date() {
        let no_title: RawNewsItem =
            serde_json::from_value(json!({ "date": "2024-06-01", "content": "x" })).unwrap();
        assert!(NewsItem::try_from(no_title).is_err());

        let bad_date: RawNewsItem =
            serde_json::from_value(json!({ "date": "not a date", "title": "A" })).unwrap();
        assert!(NewsItem::try_from(bad_date).is_err());
    }

    #[test]
    fn rejects_unparseable_window_bound() {
        let raw: RawNewsItem = serde_json::from_value(json!({
            "date": "2024-06-01",
            "title": "A",
            "startDate": "sometime"
        }))
        .unwrap();
        assert!(NewsItem::try_from(raw).is_err());
    }

    #[test]
    fn form_accepts_empty_strings_for_optionals() {
        let form: NewsForm = serde_json::from_value(json!({
            "date": "2024-06-01",
            "title": "A",
            "titleColor": "",
            "content": "",
            "startDate": "",
            "endDate": "2024-07-01"
        }))
        .unwrap();

        assert_eq!(form.title_color, None);
        assert_eq!(form.start_date, None);
        assert_eq!(form.end_date, Some(date("2024-07-01")));
        assert!(!form.default_expanded);
    }

    #[test]
    fn form_wire_shape_uses_empty_strings() {
        let form: NewsForm = serde_json::from_value(json!({
            "date": "2024-06-01",
            "title": "A",
            "defaultExpanded": true
        }))
        .unwrap();

        let fields = form.to_store_fields();
        assert_eq!(fields["date"], "2024-06-01");
        assert_eq!(fields["startDate"], "");
        assert_eq!(fields["endDate"], "");
        assert_eq!(fields["titleColor"], "");
        assert_eq!(fields["defaultExpanded"], true);
    }
}
