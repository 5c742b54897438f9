//! Capturing identifiers and cursors from responses
//!
//! Responses are walked with an ordered list of typed lookups; the first one
//! that finds a value wins.

use serde_json::Value;

use super::placeholders::{collection_name, PlaceholderContext};

/// Fields holding a record's identifier, in preference order
const ID_FIELDS: &[&str] = &["id", "_id", "ulid", "uuid"];

/// Fields holding the record array of a list response
const ARRAY_FIELDS: &[&str] = &["data", "records", "items"];

/// One way of locating a representative record id in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdLookup {
    /// `body[field]`
    TopLevel(&'static str),
    /// `body[wrapper][field]`
    Wrapped {
        wrapper: &'static str,
        field: &'static str,
    },
    /// Second element of the first non-empty record array, or the only one
    ListElement,
    /// `body.meta.next`
    MetaNextCursor,
    /// `body[field]`, then `body.data[field]`
    Alternate(&'static str),
}

/// Lookups tried, in order, to capture the record id for `$ULID`
const RECORD_ID_LOOKUPS: &[IdLookup] = &[
    IdLookup::TopLevel("id"),
    IdLookup::Wrapped {
        wrapper: "data",
        field: "id",
    },
    IdLookup::Wrapped {
        wrapper: "record",
        field: "id",
    },
    IdLookup::ListElement,
    IdLookup::MetaNextCursor,
    IdLookup::Alternate("_id"),
    IdLookup::Alternate("ulid"),
    IdLookup::Alternate("uuid"),
];

impl IdLookup {
    fn find(&self, body: &Value) -> Option<String> {
        match *self {
            IdLookup::TopLevel(field) => body.get(field).and_then(scalar_id),
            IdLookup::Wrapped { wrapper, field } => body
                .get(wrapper)
                .filter(|w| w.is_object())
                .and_then(|w| w.get(field))
                .and_then(scalar_id),
            IdLookup::ListElement => ARRAY_FIELDS.iter().find_map(|key| {
                let items = body.get(*key)?.as_array()?;
                // The first record of a user list is usually the caller's own
                let item = items.get(1).or_else(|| items.first())?;
                record_id(item)
            }),
            IdLookup::MetaNextCursor => body
                .get("meta")
                .and_then(|meta| meta.get("next"))
                .and_then(scalar_id),
            IdLookup::Alternate(field) => body
                .get(field)
                .and_then(scalar_id)
                .or_else(|| IdLookup::Wrapped { wrapper: "data", field }.find(body)),
        }
    }
}

/// Strings and numbers can serve as identifiers; empty strings cannot
fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier of one record: its first present id field
fn record_id(record: &Value) -> Option<String> {
    let record = record.as_object()?;
    ID_FIELDS
        .iter()
        .find_map(|field| record.get(*field))
        .and_then(scalar_id)
}

/// Representative record id of a create or list response
pub fn extract_record_id(body: &Value) -> Option<String> {
    if !body.is_object() {
        return None;
    }
    RECORD_ID_LOOKUPS.iter().find_map(|lookup| lookup.find(body))
}

/// Up to `max` record ids from the first record array of a list response
pub fn extract_record_ids(body: &Value, max: usize) -> Vec<String> {
    let Some(items) = ARRAY_FIELDS
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
    else {
        return Vec::new();
    };

    items.iter().filter_map(record_id).take(max).collect()
}

/// Update cursors from `meta.next`/`meta.prev`; returns whether `meta` had either
pub fn capture_cursors(body: &Value, context: &mut PlaceholderContext) -> bool {
    let Some(meta) = body.get("meta").and_then(Value::as_object) else {
        return false;
    };

    let mut found = false;
    if let Some(next) = meta.get("next") {
        context.set_next_cursor(scalar_id(next));
        found = true;
    }
    if let Some(prev) = meta.get("prev") {
        context.set_prev_cursor(scalar_id(prev));
        found = true;
    }
    found
}

pub fn is_create_endpoint(endpoint: &str) -> bool {
    endpoint.contains(":create")
}

pub fn is_list_endpoint(endpoint: &str) -> bool {
    endpoint.contains(":list")
}

pub fn is_destroy_endpoint(endpoint: &str) -> bool {
    endpoint.contains(":destroy")
}

/// Drop the stored identifier list after its collection's records were
/// destroyed; returns whether anything was dropped
pub fn forget_destroyed(endpoint: &str, context: &mut PlaceholderContext) -> bool {
    if !is_destroy_endpoint(endpoint) {
        return false;
    }
    match collection_name(endpoint) {
        Some(collection) if context.holds_ids_of(&collection) => {
            tracing::debug!(collection = %collection, "Dropped stale record id list");
            context.clear_record_ids();
            true
        }
        _ => false,
    }
}

/// Update the context from a successful response body
///
/// Cursors are taken from any response. Create and list responses supply the
/// record id until one has been captured; list responses also replace the
/// stored identifier list.
pub fn capture_response(
    endpoint: &str,
    body: &Value,
    context: &mut PlaceholderContext,
    max_ids: usize,
) {
    if capture_cursors(body, context) {
        tracing::debug!(
            next = ?context.next_cursor(),
            prev = ?context.prev_cursor(),
            "Updated pagination cursors"
        );
    }

    let is_list = is_list_endpoint(endpoint);
    if !(is_list || is_create_endpoint(endpoint)) {
        return;
    }

    if context.record_id().is_none() {
        if let Some(id) = extract_record_id(body) {
            tracing::debug!(id = %id, endpoint = %endpoint, "Captured record id");
            context.capture_record_id(id);
        }
    }

    if is_list {
        let ids = extract_record_ids(body, max_ids);
        if !ids.is_empty() {
            context.set_record_ids(collection_name(endpoint), ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_lookup_order() {
        assert_eq!(extract_record_id(&json!({ "id": "top", "data": { "id": "nested" } })), Some("top".into()));
        assert_eq!(extract_record_id(&json!({ "data": { "id": "d1" } })), Some("d1".into()));
        assert_eq!(extract_record_id(&json!({ "record": { "id": "r1" } })), Some("r1".into()));
        assert_eq!(extract_record_id(&json!({ "id": 42 })), Some("42".into()));
        assert_eq!(extract_record_id(&json!({ "_id": "alt" })), Some("alt".into()));
        assert_eq!(extract_record_id(&json!({ "data": { "uuid": "u-1" } })), Some("u-1".into()));
        assert_eq!(extract_record_id(&json!({ "status": "ok" })), None);
        assert_eq!(extract_record_id(&json!(["a"])), None);
    }

    #[test]
    fn test_list_prefers_second_element() {
        let two = json!({ "data": [{ "id": "u1" }, { "id": "u2" }] });
        assert_eq!(extract_record_id(&two), Some("u2".into()));

        let one = json!({ "items": [{ "ulid": "only" }] });
        assert_eq!(extract_record_id(&one), Some("only".into()));

        let empty_then_records = json!({ "data": [], "records": [{ "id": "a" }, { "id": "b" }] });
        assert_eq!(extract_record_id(&empty_then_records), Some("b".into()));
    }

    #[test]
    fn test_meta_next_cursor_before_alternate_ids() {
        let body = json!({ "data": [], "meta": { "next": "cur-1" }, "_id": "alt" });
        assert_eq!(extract_record_id(&body), Some("cur-1".into()));
    }

    #[test]
    fn test_extract_record_ids() {
        let body = json!({
            "data": [
                { "id": "a" },
                { "_id": "b" },
                { "name": "no id" },
                { "uuid": "c" },
                { "id": "d" }
            ]
        });
        assert_eq!(extract_record_ids(&body, 10), ["a", "b", "c", "d"]);
        assert_eq!(extract_record_ids(&body, 2), ["a", "b"]);
        assert!(extract_record_ids(&json!({ "data": { "id": "x" } }), 10).is_empty());
        assert!(extract_record_ids(&json!("plain"), 10).is_empty());
    }

    #[test]
    fn test_capture_cursors() {
        let mut context = PlaceholderContext::new();
        assert!(!capture_cursors(&json!({ "data": [] }), &mut context));
        assert!(!context.cursors_initialized());

        assert!(capture_cursors(&json!({ "meta": { "next": "n1", "prev": null } }), &mut context));
        assert!(context.cursors_initialized());
        assert_eq!(context.next_cursor(), Some("n1"));
        assert_eq!(context.prev_cursor(), None);

        capture_cursors(&json!({ "meta": { "prev": "p1" } }), &mut context);
        assert_eq!(context.next_cursor(), Some("n1"));
        assert_eq!(context.prev_cursor(), Some("p1"));
    }

    #[test]
    fn test_capture_response_keeps_first_record_id() {
        let mut context = PlaceholderContext::new();
        capture_response("/items:create", &json!({ "id": "first" }), &mut context, 10);
        capture_response("/items:create", &json!({ "id": "second" }), &mut context, 10);
        assert_eq!(context.record_id(), Some("first"));
    }

    #[test]
    fn test_capture_response_only_for_create_and_list() {
        let mut context = PlaceholderContext::new();
        capture_response("/items:get", &json!({ "id": "x", "meta": { "next": "n" } }), &mut context, 10);
        assert_eq!(context.record_id(), None);
        assert_eq!(context.next_cursor(), Some("n"));
    }

    #[test]
    fn test_capture_response_stores_list_ids_per_collection() {
        let mut context = PlaceholderContext::new();
        let body = json!({ "data": [{ "id": "u1" }, { "id": "u2" }] });
        capture_response("/users:list", &body, &mut context, 10);

        assert_eq!(context.record_id(), Some("u2"));
        assert_eq!(context.record_ids(), ["u1", "u2"]);
        assert!(context.has_ids_for(Some("users"), 2));
        assert!(!context.has_ids_for(Some("products"), 1));
    }

    #[test]
    fn test_destroy_drops_ids_of_same_collection_only() {
        let mut context = PlaceholderContext::new();
        let body = json!({ "data": [{ "id": "u1" }, { "id": "u2" }] });
        capture_response("/users:list", &body, &mut context, 10);

        assert!(!forget_destroyed("/products:destroy?filterByTk=p1", &mut context));
        assert!(!forget_destroyed("/users:get?filterByTk=u1", &mut context));
        assert!(context.has_ids_for(Some("users"), 2));

        assert!(forget_destroyed("/users:destroy?filterByTk=u1", &mut context));
        assert!(context.record_ids().is_empty());
        // The single captured id is not part of the list
        assert_eq!(context.record_id(), Some("u2"));
    }
}
