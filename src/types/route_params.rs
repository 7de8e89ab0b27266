use std::collections::hash_map::{HashMap, Iter};

/// Represents a map of the route parameters bound for a single request.
///
/// A fresh `RouteParams` is produced every time a route pattern matches a path, and it is stored in
/// that request's extensions only, so concurrent requests hitting the same route never share it.
///
/// # Examples
///
/// ```
/// use switchyard::RouteParams;
///
/// let mut params = RouteParams::new();
/// params.set("id", "42");
///
/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    /// Creates an empty route parameters map.
    pub fn new() -> RouteParams {
        RouteParams(HashMap::new())
    }

    /// Creates an empty route parameters map with the specified capacity.
    pub fn with_capacity(capacity: usize) -> RouteParams {
        RouteParams(HashMap::with_capacity(capacity))
    }

    /// Sets a new parameter entry with the specified key and the value.
    pub fn set<N: Into<String>, V: Into<String>>(&mut self, param_name: N, param_val: V) {
        self.0.insert(param_name.into(), param_val.into());
    }

    /// Returns the route parameter value mapped with the specified key.
    pub fn get<N: AsRef<str>>(&self, param_name: N) -> Option<&String> {
        self.0.get(param_name.as_ref())
    }

    /// Checks if a route parameter exists.
    pub fn has<N: AsRef<str>>(&self, param_name: N) -> bool {
        self.0.contains_key(param_name.as_ref())
    }

    /// Returns the length of the route parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameter was bound.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an [`Iterator`](https://doc.rust-lang.org/std/collections/hash_map/struct.Iter.html) over the parameter entries
    /// as `(&String, &String)`.
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.0.iter()
    }

    /// Extends the current parameters map with another one.
    pub fn extend(&mut self, other_route_params: RouteParams) {
        other_route_params.0.into_iter().for_each(|(key, val)| {
            self.set(key, val);
        })
    }
}

impl<'a> IntoIterator for &'a RouteParams {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
