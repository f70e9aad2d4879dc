// Response envelope normalization
//
// The backend answers in three shapes: a plain payload, a payload nested
// under `data`, or a paginated list (`data` plus `current_page` at the top
// level, or plus a `meta` object carrying the pagination fields).
// `normalize` folds all of them into `Normalized`. It is total: any JSON
// value maps to exactly one variant.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The canonical shape of every successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Plain payload (or the unwrapped `data` of a non-paginated envelope).
    Bare(Value),
    /// Paginated list with its metadata hoisted to the top level.
    Paginated(Page<Value>),
}

/// One page of a paginated listing.
///
/// Serializes as `{ data, currentPage, lastPage, total, perPage, links? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u64,
    pub last_page: u64,
    pub total: u64,
    pub per_page: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

impl<T> Page<T> {
    /// A single page holding every item (for endpoints that didn't paginate).
    pub fn single(data: Vec<T>) -> Self {
        let len = u64::try_from(data.len()).unwrap_or(u64::MAX);
        Self {
            data,
            current_page: 1,
            last_page: 1,
            total: len,
            per_page: len,
            from: None,
            to: None,
            links: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }
}

impl Page<Value> {
    /// Decode every item into `T`, keeping the pagination metadata.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Page<T>, serde_json::Error> {
        let data = self
            .data
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Page {
            data,
            current_page: self.current_page,
            last_page: self.last_page,
            total: self.total,
            per_page: self.per_page,
            from: self.from,
            to: self.to,
            links: self.links,
        })
    }
}

impl Normalized {
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Paginated(_))
    }

    /// Collapse back into a single JSON value (paginated shape as an object).
    pub fn into_value(self) -> Value {
        match self {
            Self::Bare(value) => value,
            Self::Paginated(page) => {
                let mut map = Map::new();
                map.insert("data".into(), Value::Array(page.data));
                map.insert("currentPage".into(), page.current_page.into());
                map.insert("lastPage".into(), page.last_page.into());
                map.insert("total".into(), page.total.into());
                map.insert("perPage".into(), page.per_page.into());
                if let Some(from) = page.from {
                    map.insert("from".into(), from.into());
                }
                if let Some(to) = page.to {
                    map.insert("to".into(), to.into());
                }
                if let Some(links) = page.links {
                    map.insert("links".into(), links);
                }
                Value::Object(map)
            }
        }
    }

    /// Decode a bare payload into `T`. A paginated payload decodes its items
    /// as if the caller had asked for the list.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        match self {
            Self::Bare(value) => serde_json::from_value(value),
            Self::Paginated(page) => serde_json::from_value(Value::Array(page.data)),
        }
    }

    /// Decode into a page of `T`. A bare array becomes a single page.
    pub fn decode_page<T: DeserializeOwned>(self) -> Result<Page<T>, serde_json::Error> {
        match self {
            Self::Paginated(page) => page.decode(),
            Self::Bare(value) => serde_json::from_value::<Vec<T>>(value).map(Page::single),
        }
    }
}

/// Normalize a decoded response body.
///
/// Order matters: the paginated check runs before the plain `data` unwrap,
/// so a body with both pagination markers and `data` yields a page.
pub fn normalize(body: Value) -> Normalized {
    let Value::Object(mut map) = body else {
        return Normalized::Bare(body);
    };

    if map.get("data").is_none_or(Value::is_null) {
        return Normalized::Bare(Value::Object(map));
    }

    let meta = pagination_meta(&map);
    let data = map.remove("data").unwrap_or(Value::Null);

    match (meta, data) {
        (Some(meta), Value::Array(items)) => Normalized::Paginated(meta.into_page(items)),
        (_, data) => Normalized::Bare(data),
    }
}

// ── Pagination markers ───────────────────────────────────────────────

struct PageMeta {
    current_page: u64,
    last_page: Option<u64>,
    total: Option<u64>,
    per_page: Option<u64>,
    from: Option<u64>,
    to: Option<u64>,
    links: Option<Value>,
}

impl PageMeta {
    fn into_page(self, data: Vec<Value>) -> Page<Value> {
        let len = u64::try_from(data.len()).unwrap_or(u64::MAX);
        Page {
            data,
            current_page: self.current_page,
            last_page: self.last_page.unwrap_or(self.current_page),
            total: self.total.unwrap_or(len),
            per_page: self.per_page.unwrap_or(len),
            from: self.from,
            to: self.to,
            links: self.links,
        }
    }
}

/// Extract pagination metadata, `meta` fields taking precedence over the
/// top level. `None` when there is no usable `current_page`.
fn pagination_meta(map: &Map<String, Value>) -> Option<PageMeta> {
    let meta = map.get("meta").and_then(Value::as_object);
    let field = |name: &str| {
        meta.and_then(|m| m.get(name))
            .filter(|v| !v.is_null())
            .or_else(|| map.get(name))
            .and_then(as_count)
    };

    let current_page = field("current_page")?;

    // Top-level `links` is the first/last/prev/next object; `meta.links`
    // is the per-page button list. Prefer the former.
    let links = map
        .get("links")
        .filter(|v| !v.is_null())
        .or_else(|| meta.and_then(|m| m.get("links")).filter(|v| !v.is_null()))
        .cloned();

    Some(PageMeta {
        current_page,
        last_page: field("last_page"),
        total: field("total"),
        per_page: field("per_page"),
        from: field("from"),
        to: field("to"),
        links,
    })
}

/// Accept counts sent as numbers or as digit strings.
fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn paginated_top_level_markers() {
        let body = json!({
            "data": [{"id": 1}, {"id": 2}],
            "current_page": 2,
            "last_page": 5,
            "total": 10,
            "per_page": 2,
            "links": {"first": "?page=1", "last": "?page=5", "prev": "?page=1", "next": "?page=3"}
        });

        let Normalized::Paginated(page) = normalize(body) else {
            panic!("expected paginated shape");
        };
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 5);
        assert_eq!(page.total, 10);
        assert_eq!(page.per_page, 2);
        assert_eq!(page.data, vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(page.links.as_ref().unwrap()["next"], json!("?page=3"));
        assert!(page.has_next());
    }

    #[test]
    fn paginated_meta_fields_are_hoisted() {
        let body = json!({
            "data": [{"id": 1}],
            "links": {"first": "a", "last": "b", "prev": null, "next": null},
            "meta": {
                "current_page": 1,
                "last_page": 1,
                "total": 1,
                "per_page": 15,
                "from": 1,
                "to": 1,
                "links": [{"url": null, "label": "1", "active": true}],
                "path": "/api/users"
            }
        });

        let Normalized::Paginated(page) = normalize(body) else {
            panic!("expected paginated shape");
        };
        assert_eq!(page.per_page, 15);
        assert_eq!(page.from, Some(1));
        assert_eq!(page.links.unwrap()["first"], json!("a"));

        let value = Normalized::Paginated(Page::single(vec![json!(1)])).into_value();
        assert_eq!(value["currentPage"], json!(1));
        assert_eq!(value["perPage"], json!(1));
    }

    #[test]
    fn data_only_is_unwrapped() {
        let body = json!({"data": {"id": 3, "name": "x"}});
        assert_eq!(normalize(body), Normalized::Bare(json!({"id": 3, "name": "x"})));

        let body = json!({"data": [1, 2, 3], "message": "ok"});
        assert_eq!(normalize(body), Normalized::Bare(json!([1, 2, 3])));
    }

    #[test]
    fn bodies_without_data_pass_through() {
        for body in [
            json!({"type": "success", "token": "abc"}),
            json!([1, 2]),
            json!("plain"),
            json!(null),
            json!({"data": null, "message": "empty"}),
        ] {
            assert_eq!(normalize(body.clone()), Normalized::Bare(body));
        }
    }

    #[test]
    fn markers_without_array_data_fall_back_to_unwrap() {
        let body = json!({"data": {"id": 1}, "current_page": 1});
        assert_eq!(normalize(body), Normalized::Bare(json!({"id": 1})));
    }

    #[test]
    fn unusable_current_page_is_not_pagination() {
        let body = json!({"data": [1], "current_page": "first"});
        assert_eq!(normalize(body), Normalized::Bare(json!([1])));
    }

    #[test]
    fn missing_counts_default_from_data() {
        let body = json!({"data": [1, 2, 3], "current_page": "1"});
        let Normalized::Paginated(page) = normalize(body) else {
            panic!("expected paginated shape");
        };
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.total, 3);
        assert_eq!(page.per_page, 3);
    }

    #[test]
    fn decode_page_accepts_bare_lists() {
        let page: Page<u32> = normalize(json!({"data": [4, 5]})).decode_page().unwrap();
        assert_eq!(page.data, vec![4, 5]);
        assert_eq!(page.total, 2);
        assert!(!page.has_next());
    }
}
