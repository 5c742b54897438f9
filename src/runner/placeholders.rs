//! Placeholder resolution
//!
//! Suite authors reference runtime values through literal tokens embedded in
//! endpoints and bodies. Record and cursor tokens are resolved in a fixed
//! order against a [`PlaceholderContext`]:
//!
//! 1. `$PREV_CURSOR` - previous-page cursor
//! 2. `$NEXT_CURSOR` - next-page cursor once a list response initialized the
//!    cursors, otherwise the captured record id
//! 3. `$ULID<N>` - N-th (1-based) captured id; out-of-range indices stay literal
//! 4. `$ULID` - the captured record id
//!
//! Tokens without a value stay in the request as literal text. The server then
//! rejects the request, which is how a misconfigured suite shows up.

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::suite::TestCase;

use super::auth::AuthState;

pub const ACCESS_TOKEN: &str = "$ACCESS_TOKEN";
pub const REFRESH_TOKEN: &str = "$REFRESH_TOKEN";
pub const ULID: &str = "$ULID";
pub const NEXT_CURSOR: &str = "$NEXT_CURSOR";
pub const PREV_CURSOR: &str = "$PREV_CURSOR";

/// `$ULID` optionally followed by a 1-based index
static ULID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$ULID(\d*)").expect("static regex"));

/// Kind of record placeholder that was substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    PrevCursor,
    NextCursor,
    NumberedUlid,
    Ulid,
}

impl PlaceholderKind {
    /// Token a substitution of this kind replaced
    pub fn token(&self) -> &'static str {
        match self {
            PlaceholderKind::PrevCursor => PREV_CURSOR,
            PlaceholderKind::NextCursor => NEXT_CURSOR,
            PlaceholderKind::NumberedUlid | PlaceholderKind::Ulid => ULID,
        }
    }
}

/// Values captured from earlier responses in the current suite run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderContext {
    record_id: Option<String>,
    record_ids: Vec<String>,
    record_ids_collection: Option<String>,
    next_cursor: Option<String>,
    prev_cursor: Option<String>,
    cursors_initialized: bool,
    last_kind: Option<PlaceholderKind>,
}

impl PlaceholderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn record_ids(&self) -> &[String] {
        &self.record_ids
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn prev_cursor(&self) -> Option<&str> {
        self.prev_cursor.as_deref()
    }

    pub fn cursors_initialized(&self) -> bool {
        self.cursors_initialized
    }

    pub fn last_kind(&self) -> Option<PlaceholderKind> {
        self.last_kind
    }

    /// Store the representative record id; it is never cleared afterwards
    pub fn capture_record_id(&mut self, id: impl Into<String>) {
        self.record_id = Some(id.into());
    }

    /// Store the identifier list of a collection for `$ULID<N>`
    pub fn set_record_ids(&mut self, collection: Option<String>, ids: Vec<String>) {
        self.record_ids = ids;
        self.record_ids_collection = collection;
    }

    /// Copy of this context whose identifier list is replaced, for use by a
    /// single test
    pub fn scoped_with_ids(&self, collection: Option<String>, ids: Vec<String>) -> Self {
        let mut scoped = self.clone();
        scoped.set_record_ids(collection, ids);
        scoped
    }

    /// Whether the stored identifier list came from `collection` and has at
    /// least `count` entries
    pub fn has_ids_for(&self, collection: Option<&str>, count: usize) -> bool {
        let same_collection = match collection {
            Some(name) => self.record_ids_collection.as_deref() == Some(name),
            None => true,
        };
        same_collection && !self.record_ids.is_empty() && self.record_ids.len() >= count
    }

    /// Forget the stored identifier list
    ///
    /// Called once a test has consumed the list, or once the records of its
    /// collection were destroyed, so later `$ULID<N>` tests fetch fresh ids.
    pub fn clear_record_ids(&mut self) {
        self.record_ids.clear();
        self.record_ids_collection = None;
    }

    /// Whether the stored identifier list came from `collection`
    pub fn holds_ids_of(&self, collection: &str) -> bool {
        !self.record_ids.is_empty() && self.record_ids_collection.as_deref() == Some(collection)
    }

    pub fn set_next_cursor(&mut self, cursor: Option<String>) {
        self.next_cursor = cursor;
        self.cursors_initialized = true;
    }

    pub fn set_prev_cursor(&mut self, cursor: Option<String>) {
        self.prev_cursor = cursor;
        self.cursors_initialized = true;
    }

    pub fn record_kind(&mut self, kind: PlaceholderKind) {
        self.last_kind = Some(kind);
    }

    /// Value `$NEXT_CURSOR` resolves to
    ///
    /// Before any list response initialized the cursors this falls back to
    /// the captured record id, for suites that never page through a list.
    fn next_cursor_value(&self) -> Option<&str> {
        if self.cursors_initialized {
            self.next_cursor.as_deref()
        } else {
            self.record_id.as_deref()
        }
    }
}

/// A test case with its record placeholders substituted
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub test: TestCase,
    /// Last placeholder kind substituted, if any
    pub kind: Option<PlaceholderKind>,
}

/// Substitute record and cursor placeholders in the endpoint and body
///
/// Headers are left alone. The input test case is not modified.
pub fn resolve(test: &TestCase, context: &PlaceholderContext) -> Resolution {
    let mut resolved = test.clone();

    let (endpoint, mut kind) = substitute(&test.endpoint, context);
    resolved.endpoint = endpoint;

    if let Some(body) = &test.body {
        let mut body_kind = None;
        resolved.body = Some(map_strings(body, &mut |text| {
            let (out, k) = substitute(text, context);
            body_kind = k.or(body_kind);
            out
        }));
        kind = body_kind.or(kind);
    }

    Resolution {
        test: resolved,
        kind,
    }
}

/// Apply the four record/cursor substitutions to one string, in precedence order
fn substitute(text: &str, context: &PlaceholderContext) -> (String, Option<PlaceholderKind>) {
    let mut out = text.to_string();
    let mut kind = None;

    if out.contains(PREV_CURSOR) {
        if let Some(cursor) = context.prev_cursor() {
            out = out.replace(PREV_CURSOR, cursor);
            kind = Some(PlaceholderKind::PrevCursor);
        }
    }

    if out.contains(NEXT_CURSOR) {
        if let Some(cursor) = context.next_cursor_value() {
            out = out.replace(NEXT_CURSOR, cursor);
            kind = Some(PlaceholderKind::NextCursor);
        }
    }

    if out.contains(ULID) {
        let mut numbered = false;
        out = ULID_PATTERN
            .replace_all(&out, |caps: &Captures| {
                let whole = caps[0].to_string();
                let digits = &caps[1];
                if digits.is_empty() {
                    return whole;
                }
                match digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| context.record_ids.get(i))
                {
                    Some(id) => {
                        numbered = true;
                        id.clone()
                    }
                    None => whole,
                }
            })
            .into_owned();
        if numbered {
            kind = Some(PlaceholderKind::NumberedUlid);
        }

        if let Some(id) = context.record_id() {
            let mut bare = false;
            out = ULID_PATTERN
                .replace_all(&out, |caps: &Captures| {
                    if caps[1].is_empty() {
                        bare = true;
                        id.to_string()
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned();
            if bare {
                kind = Some(PlaceholderKind::Ulid);
            }
        }
    }

    (out, kind)
}

/// Rebuild a JSON value with every string (keys included) passed through `f`
fn map_strings(value: &Value, f: &mut dyn FnMut(&str) -> String) -> Value {
    match value {
        Value::String(text) => Value::String(f(text)),
        Value::Array(items) => Value::Array(items.iter().map(|v| map_strings(v, f)).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, v) in map {
                let key = f(key);
                let v = map_strings(v, f);
                out.insert(key, v);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Substitute `$ACCESS_TOKEN` in the Authorization header and `$REFRESH_TOKEN`
/// anywhere in the body
pub fn substitute_auth(test: &mut TestCase, auth: &AuthState) {
    if let (Some(token), Some(headers)) = (auth.access_token(), test.headers.as_mut()) {
        for (key, value) in headers.iter_mut() {
            if key.eq_ignore_ascii_case("authorization") && value.contains(ACCESS_TOKEN) {
                *value = value.replace(ACCESS_TOKEN, token);
            }
        }
    }

    if let (Some(token), Some(body)) = (auth.refresh_token(), test.body.as_ref()) {
        test.body = Some(map_strings(body, &mut |text| text.replace(REFRESH_TOKEN, token)));
    }
}

/// Highest `$ULID<N>` index referenced in a string
fn max_numbered_in(text: &str) -> Option<usize> {
    ULID_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .max()
}

fn max_numbered_in_value(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => max_numbered_in(text),
        Value::Array(items) => items.iter().filter_map(max_numbered_in_value).max(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, v)| max_numbered_in(key).max(max_numbered_in_value(v)))
            .max(),
        _ => None,
    }
}

/// Highest `$ULID<N>` index a test references in its endpoint or body
pub fn max_numbered_index(test: &TestCase) -> Option<usize> {
    let body = test.body.as_ref().and_then(max_numbered_in_value);
    max_numbered_in(&test.endpoint).max(body)
}

/// Collection a test's endpoint addresses: the path segment before `:`
///
/// `/products:destroy?filterByTk=1` → `products`
pub fn collection_name(endpoint: &str) -> Option<String> {
    let path = endpoint.split('?').next().unwrap_or(endpoint);
    if !path.contains('/') {
        return None;
    }
    path.split('/')
        .find_map(|segment| segment.split_once(':').map(|(name, _)| name))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::Method;
    use serde_json::json;

    fn context_with_id(id: &str) -> PlaceholderContext {
        let mut context = PlaceholderContext::new();
        context.capture_record_id(id);
        context
    }

    #[test]
    fn test_bare_ulid_in_endpoint() {
        let context = context_with_id("abc123");
        let test = TestCase::new(Method::Get, "/items/$ULID:get");
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.endpoint, "/items/abc123:get");
        assert_eq!(resolution.kind, Some(PlaceholderKind::Ulid));
        assert_eq!(test.endpoint, "/items/$ULID:get");
    }

    #[test]
    fn test_nested_body_tokens() {
        let context = context_with_id("r1");
        let test = TestCase::new(Method::Post, "/items:update").with_body(json!({
            "filter": { "ids": ["$ULID", { "deep": "x-$ULID" }] },
            "count": 3
        }));
        let resolution = resolve(&test, &context);
        assert_eq!(
            resolution.test.body,
            Some(json!({ "filter": { "ids": ["r1", { "deep": "x-r1" }] }, "count": 3 }))
        );
    }

    #[test]
    fn test_missing_values_stay_literal() {
        let context = PlaceholderContext::new();
        let test = TestCase::new(Method::Get, "/items/$ULID:get?after=$NEXT_CURSOR&before=$PREV_CURSOR");
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test, test);
        assert_eq!(resolution.kind, None);
    }

    #[test]
    fn test_next_cursor_falls_back_to_record_id_until_initialized() {
        let mut context = context_with_id("rec-9");
        let test = TestCase::new(Method::Get, "/items:list?after=$NEXT_CURSOR");

        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.endpoint, "/items:list?after=rec-9");
        assert_eq!(resolution.kind, Some(PlaceholderKind::NextCursor));

        context.set_next_cursor(Some("cur-2".to_string()));
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.endpoint, "/items:list?after=cur-2");

        // Initialized without a next page: the record id is no longer used
        context.set_next_cursor(None);
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.endpoint, "/items:list?after=$NEXT_CURSOR");
    }

    #[test]
    fn test_prev_cursor() {
        let mut context = PlaceholderContext::new();
        context.set_prev_cursor(Some("p1".to_string()));
        let test = TestCase::new(Method::Get, "/items:list?before=$PREV_CURSOR");
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.endpoint, "/items:list?before=p1");
        assert_eq!(resolution.kind, Some(PlaceholderKind::PrevCursor));
    }

    #[test]
    fn test_numbered_ids_and_out_of_range() {
        let mut context = context_with_id("single");
        context.set_record_ids(None, vec!["a".into(), "b".into(), "c".into()]);
        let test = TestCase::new(Method::Post, "/items:destroy")
            .with_body(json!({ "ids": ["$ULID1", "$ULID3", "$ULID5", "$ULID"] }));

        let resolution = resolve(&test, &context);
        assert_eq!(
            resolution.test.body,
            Some(json!({ "ids": ["a", "c", "$ULID5", "single"] }))
        );
        assert_eq!(resolution.kind, Some(PlaceholderKind::Ulid));
    }

    #[test]
    fn test_numbered_index_ten_is_not_index_one() {
        let mut context = PlaceholderContext::new();
        context.set_record_ids(None, (1..=10).map(|i| format!("id{i}")).collect());
        let test = TestCase::new(Method::Get, "/a/$ULID10/b/$ULID1:get");
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.endpoint, "/a/id10/b/id1:get");
        assert_eq!(resolution.kind, Some(PlaceholderKind::NumberedUlid));
    }

    #[test]
    fn test_headers_are_not_resolved() {
        let context = context_with_id("abc");
        let test = TestCase::new(Method::Get, "/x").with_header("X-Record", "$ULID");
        let resolution = resolve(&test, &context);
        assert_eq!(resolution.test.header("X-Record"), Some("$ULID"));
    }

    #[test]
    fn test_substitute_auth() {
        let mut auth = AuthState::default();
        auth.update_access_token("T1");
        auth.update_refresh_token("R1");

        let mut test = TestCase::new(Method::Post, "/auth:refresh")
            .with_header("authorization", "Bearer $ACCESS_TOKEN")
            .with_header("X-Other", "$ACCESS_TOKEN")
            .with_body(json!({ "refresh_token": "$REFRESH_TOKEN" }));
        substitute_auth(&mut test, &auth);

        assert_eq!(test.header("authorization"), Some("Bearer T1"));
        assert_eq!(test.header("X-Other"), Some("$ACCESS_TOKEN"));
        assert_eq!(test.body, Some(json!({ "refresh_token": "R1" })));
    }

    #[test]
    fn test_substitute_auth_without_tokens_is_noop() {
        let auth = AuthState::default();
        let original = TestCase::new(Method::Get, "/x")
            .with_header("Authorization", "Bearer $ACCESS_TOKEN");
        let mut test = original.clone();
        substitute_auth(&mut test, &auth);
        assert_eq!(test, original);
    }

    #[test]
    fn test_max_numbered_index() {
        let test = TestCase::new(Method::Post, "/users/$ULID2:update")
            .with_body(json!({ "ids": ["$ULID7"], "owner": "$ULID" }));
        assert_eq!(max_numbered_index(&test), Some(7));
        assert_eq!(max_numbered_index(&TestCase::new(Method::Get, "/users/$ULID:get")), None);
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(collection_name("/products:get"), Some("products".to_string()));
        assert_eq!(
            collection_name("/products:destroy?filterByTk=$ULID1"),
            Some("products".to_string())
        );
        assert_eq!(collection_name("/api/users:list"), Some("users".to_string()));
        assert_eq!(collection_name("/health"), None);
        assert_eq!(collection_name("products:get"), None);
    }

    #[test]
    fn test_has_ids_for() {
        let mut context = PlaceholderContext::new();
        assert!(!context.has_ids_for(Some("users"), 1));

        context.set_record_ids(Some("users".into()), vec!["u1".into(), "u2".into()]);
        assert!(context.has_ids_for(Some("users"), 2));
        assert!(!context.has_ids_for(Some("users"), 3));
        assert!(!context.has_ids_for(Some("products"), 1));

        let scoped = context.scoped_with_ids(Some("products".into()), vec!["p1".into()]);
        assert!(scoped.has_ids_for(Some("products"), 1));
        assert!(context.has_ids_for(Some("users"), 1));

        assert!(context.holds_ids_of("users"));
        context.clear_record_ids();
        assert!(!context.has_ids_for(Some("users"), 1));
        assert!(!context.holds_ids_of("users"));
    }

    #[test]
    fn test_kind_tokens() {
        assert_eq!(PlaceholderKind::PrevCursor.token(), "$PREV_CURSOR");
        assert_eq!(PlaceholderKind::NextCursor.token(), "$NEXT_CURSOR");
        assert_eq!(PlaceholderKind::NumberedUlid.token(), "$ULID");
        assert_eq!(PlaceholderKind::Ulid.token(), "$ULID");

        let mut context = PlaceholderContext::new();
        assert_eq!(context.last_kind(), None);
        context.record_kind(PlaceholderKind::PrevCursor);
        assert_eq!(context.last_kind(), Some(PlaceholderKind::PrevCursor));
    }
}
