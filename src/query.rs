// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Query parameters in the array's PostgREST-like dialect.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in query keys and values.
///
/// Commas stay unescaped: the dialect uses them to join multi-value fields.
const QUERY_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// A resource type with a declared field list.
///
/// Every JSON-mapped resource type exposes the minimal field projection
/// needed to populate itself; [`QueryParams::fields`] turns it into a
/// `select` clause.
pub trait Queryable {
    /// The fields to request when fetching this type.
    fn fields() -> &'static [&'static str];
}

/// A builder for a query string.
///
/// The encoded dialect is PostgREST-like: `select=a,b,c`, `order=col`,
/// `limit=N`, `offset=N`, `async=bool` and arbitrary `column=op.value`
/// filters added through [`raw_arg`](QueryParams::raw_arg).
///
/// ```rust
/// use powerstore::QueryParams;
///
/// let query = QueryParams::default()
///     .select(["id", "name"])
///     .raw_arg("name", "eq.my-volume")
///     .limit(100);
/// assert_eq!(query.encode(), "limit=100&select=id,name&name=eq.my-volume");
/// ```
///
/// A raw argument for a reserved key overrides the structured setter for
/// the same key; within raw arguments, the last call per key wins.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    select: Vec<String>,
    order: Vec<String>,
    limit: Option<u32>,
    offset: Option<u32>,
    is_async: Option<bool>,
    raw: Vec<(String, String)>,
}

impl QueryParams {
    /// Build a query selecting the declared field list of a resource type.
    pub fn fields<T: Queryable>() -> QueryParams {
        QueryParams::default().select(T::fields().iter().copied())
    }

    /// Add fields to the `select` projection.
    ///
    /// Repeated calls accumulate.
    pub fn select<I>(mut self, fields: I) -> QueryParams
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.select.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add fields to the `order` clause.
    ///
    /// Repeated calls accumulate.
    pub fn order<I>(mut self, fields: I) -> QueryParams
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.order.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Limit the number of returned rows.
    pub fn limit(mut self, limit: u32) -> QueryParams {
        self.limit = Some(limit);
        self
    }

    /// Start the returned rows at the given offset.
    pub fn offset(mut self, offset: u32) -> QueryParams {
        self.offset = Some(offset);
        self
    }

    /// Request asynchronous execution of the operation.
    pub fn is_async(mut self, is_async: bool) -> QueryParams {
        self.is_async = Some(is_async);
        self
    }

    /// Add a raw key/value argument, usually a `column=op.value` filter.
    ///
    /// A repeated key overwrites the previous raw value, and a raw key
    /// collides with and overrides a same-named structured field.
    pub fn raw_arg<K, V>(mut self, key: K, value: V) -> QueryParams
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        let value = value.into();
        match self.raw.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.raw.push((key, value)),
        }
        self
    }

    /// Whether no parameters have been set.
    pub fn is_empty(&self) -> bool {
        self.select.is_empty()
            && self.order.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
            && self.is_async.is_none()
            && self.raw.is_empty()
    }

    /// Encode into a URL query string.
    ///
    /// Each present key is emitted exactly once; an empty builder encodes to
    /// an empty string.
    pub fn encode(&self) -> String {
        let mut parts: Vec<(Cow<'_, str>, String)> = Vec::new();
        if let Some(limit) = self.limit {
            parts.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            parts.push(("offset".into(), offset.to_string()));
        }
        if let Some(is_async) = self.is_async {
            parts.push(("async".into(), is_async.to_string()));
        }
        if !self.order.is_empty() {
            parts.push(("order".into(), self.order.join(",")));
        }
        if !self.select.is_empty() {
            parts.push(("select".into(), self.select.join(",")));
        }
        // Raw arguments go last and displace structured fields of the same
        // name, so that e.g. raw_arg("async", ..) wins over is_async(..).
        for (key, value) in &self.raw {
            parts.retain(|(existing, _)| existing != key);
            parts.push((key.as_str().into(), value.clone()));
        }

        let mut result = String::new();
        for (key, value) in parts {
            if !result.is_empty() {
                result.push('&');
            }
            result.push_str(&utf8_percent_encode(&key, QUERY_ESCAPE).to_string());
            result.push('=');
            result.push_str(&utf8_percent_encode(&value, QUERY_ESCAPE).to_string());
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::{QueryParams, Queryable};

    struct Fake;

    impl Queryable for Fake {
        fn fields() -> &'static [&'static str] {
            &["id", "name", "state"]
        }
    }

    #[test]
    fn test_empty_encodes_to_empty_string() {
        let q = QueryParams::default();
        assert!(q.is_empty());
        assert_eq!(q.encode(), "");
    }

    #[test]
    fn test_select_accumulates() {
        let q = QueryParams::default().select(["a"]).select(["b"]);
        assert_eq!(q.encode(), "select=a,b");
    }

    #[test]
    fn test_select_omitted_when_unset() {
        let q = QueryParams::default().limit(5);
        assert_eq!(q.encode(), "limit=5");
    }

    #[test]
    fn test_structured_field_order() {
        let q = QueryParams::default()
            .select(["id"])
            .order(["name"])
            .offset(10)
            .limit(100)
            .is_async(true);
        assert_eq!(
            q.encode(),
            "limit=100&offset=10&async=true&order=name&select=id"
        );
    }

    #[test]
    fn test_raw_arg_overrides_structured() {
        let q = QueryParams::default().is_async(false).raw_arg("async", "true");
        let encoded = q.encode();
        assert_eq!(encoded, "async=true");
        assert!(!encoded.contains("async=false"));
    }

    #[test]
    fn test_raw_arg_last_write_wins() {
        let q = QueryParams::default()
            .raw_arg("name", "eq.one")
            .raw_arg("name", "eq.two");
        assert_eq!(q.encode(), "name=eq.two");
    }

    #[test]
    fn test_raw_filters_keep_insertion_order() {
        let q = QueryParams::default()
            .raw_arg("name", "like.vol*")
            .raw_arg("state", "eq.ready");
        assert_eq!(q.encode(), "name=like.vol*&state=eq.ready");
    }

    #[test]
    fn test_values_are_escaped() {
        let q = QueryParams::default().raw_arg("name", "eq.my volume&more");
        assert_eq!(q.encode(), "name=eq.my%20volume%26more");
    }

    #[test]
    fn test_fields_projection() {
        let q = QueryParams::fields::<Fake>();
        assert_eq!(q.encode(), "select=id,name,state");
    }
}
