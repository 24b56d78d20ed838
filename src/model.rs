use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::normalize::categories::Category;
use crate::normalize::region::Region;

// ── Source shapes ──

/// One record as served by the tourism API. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub contentsid: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub roadaddress: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub alltag: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub phoneno: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(rename = "repPhoto", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rep_photo: Option<RepPhoto>,
    /// Source fields the pipeline does not interpret, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepPhoto {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub photoid: Option<PhotoId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoId {
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub imgpath: Option<String>,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub thumbnailpath: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawItem {
    /// Title used in log lines; falls back to the id, then to a placeholder.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.contentsid.as_deref())
            .unwrap_or("<untitled>")
    }

    pub fn photo(&self) -> Option<&PhotoId> {
        self.rep_photo.as_ref().and_then(|p| p.photoid.as_ref())
    }
}

/// One page of the source API response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    #[serde(default)]
    pub result_code: Option<Value>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub result_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<RawItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub page_info: Option<PageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default, deserialize_with = "count")]
    pub total_count: Option<u64>,
}

impl RawPage {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.page_info.as_ref().and_then(|p| p.total_count)
    }
}

/// The intermediate artifact written by `fetch` and read by `upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedPayload {
    #[serde(default)]
    pub result_code: i64,
    #[serde(default)]
    pub result_message: String,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<RawItem>,
    #[serde(default)]
    pub total_items: usize,
}

impl CombinedPayload {
    pub fn from_items(items: Vec<RawItem>) -> Self {
        CombinedPayload {
            result_code: 0,
            result_message: "Success".to_string(),
            total_items: items.len(),
            items,
        }
    }
}

// ── Output shapes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceStatus {
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCompleteness {
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    #[serde(rename = "가능")]
    Allowed,
    #[serde(rename = "불가")]
    NotAllowed,
}

/// Visitor-facing flags. Only `with_kids` is derived; the rest are defaults
/// an editor refines later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub target_audience: Vec<String>,
    pub recommended_seasons: Vec<String>,
    pub with_kids: Availability,
    pub with_pets: Availability,
    pub parking_difficulty: String,
    pub admission_fee: String,
}

impl Attributes {
    pub fn with_kids(kid_friendly: bool) -> Self {
        Attributes {
            target_audience: Vec::new(),
            recommended_seasons: Vec::new(),
            with_kids: if kid_friendly {
                Availability::Allowed
            } else {
                Availability::NotAllowed
            },
            with_pets: Availability::NotAllowed,
            parking_difficulty: "보통".to_string(),
            admission_fee: "무료".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicInfo {
    pub phone_number: Option<String>,
    pub operating_hours: Option<String>,
    pub website_url: Option<String>,
}

/// Store-ready record keyed by `place_id`. `created_at`/`updated_at` are
/// stamped by the store at commit time and are not part of this value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPlace {
    pub place_id: String,
    pub place_name: String,
    pub status: PlaceStatus,
    pub categories: Vec<Category>,
    pub categories_kr: Vec<String>,
    pub data_completeness: DataCompleteness,
    pub address: Option<String>,
    pub region: Option<Region>,
    pub location: Option<GeoPoint>,
    pub images: Vec<ImageInfo>,
    pub attributes: Attributes,
    pub public_info: PublicInfo,
    pub expert_tip_raw: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl CanonicalPlace {
    /// Top-level document fields for an upsert-with-merge write.
    pub fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "place serialized to non-object: {}",
                other
            ))),
        }
    }
}

/// Accept a JSON string or number; anything else (null, bool, object) is absent.
// Source fields are loosely typed. A value of the wrong shape reads as
// absent instead of failing the whole page.

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| serde_json::from_value(v).ok()))
}

/// Items that are not objects are dropped with a warning; the rest of the
/// list is kept.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<RawItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values,
        _ => return Ok(Vec::new()),
    };
    Ok(values
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<RawItem>(v) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Dropping malformed source item: {}", e);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_item_accepts_numeric_coordinates() {
        let item: RawItem = serde_json::from_str(
            r#"{"contentsid":"CONT_1","latitude":33.25,"longitude":"126.5","alltag":null}"#,
        )
        .unwrap();
        assert_eq!(item.latitude.as_deref(), Some("33.25"));
        assert_eq!(item.longitude.as_deref(), Some("126.5"));
        assert!(item.alltag.is_none());
    }

    #[test]
    fn raw_item_keeps_unknown_fields() {
        let json = r#"{"contentsid":"CONT_1","contentscd":{"value":"c1","label":"관광지"},"repPhoto":{"descseo":"x","photoid":{"photoid":7,"imgpath":"a.jpg"}}}"#;
        let item: RawItem = serde_json::from_str(json).unwrap();
        assert!(item.extra.contains_key("contentscd"));
        assert_eq!(item.photo().and_then(|p| p.imgpath.as_deref()), Some("a.jpg"));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["contentscd"]["label"], "관광지");
        assert_eq!(back["repPhoto"]["descseo"], "x");
        assert_eq!(back["repPhoto"]["photoid"]["photoid"], 7);
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        let page: RawPage = serde_json::from_str(
            r#"{"items":[{"contentsid":"A","title":"ok"},{"contentsid":"B","title":12345,"alltag":[],"address":{"x":1},"repPhoto":"none"}],"pageInfo":{"totalCount":"2"}}"#,
        )
        .unwrap();
        assert_eq!(page.item_count(), 2);
        assert_eq!(page.total_count(), Some(2));
        let b = &page.items[1];
        assert_eq!(b.title.as_deref(), Some("12345"));
        assert!(b.alltag.is_none());
        assert!(b.address.is_none());
        assert!(b.rep_photo.is_none());
    }

    #[test]
    fn non_object_items_are_dropped_and_odd_totals_ignored() {
        let page: RawPage = serde_json::from_str(
            r#"{"items":[null,{"contentsid":"A"},"junk"],"pageInfo":{"totalCount":"many"}}"#,
        )
        .unwrap();
        assert_eq!(page.item_count(), 1);
        assert_eq!(page.total_count(), None);

        let payload: CombinedPayload =
            serde_json::from_str(r#"{"items":[{"contentsid":"A","alltag":7},{"title":false}],"totalItems":2}"#)
                .unwrap();
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].alltag.as_deref(), Some("7"));
        assert!(payload.items[1].title.is_none());
    }

    #[test]
    fn page_without_items_or_page_info() {
        let page: RawPage = serde_json::from_str(r#"{"resultCode":"00"}"#).unwrap();
        assert_eq!(page.item_count(), 0);
        assert_eq!(page.total_count(), None);
    }

    #[test]
    fn payload_counts_its_items() {
        let payload = CombinedPayload::from_items(vec![RawItem::default(), RawItem::default()]);
        assert_eq!(payload.total_items, 2);
        let v = serde_json::to_value(&payload).unwrap();
        assert_eq!(v["resultMessage"], "Success");
        assert_eq!(v["totalItems"], 2);
    }

    #[test]
    fn display_title_fallbacks() {
        let mut item = RawItem::default();
        assert_eq!(item.display_title(), "<untitled>");
        item.contentsid = Some("CONT_9".into());
        assert_eq!(item.display_title(), "CONT_9");
        item.title = Some("성산일출봉".into());
        assert_eq!(item.display_title(), "성산일출봉");
    }
}
