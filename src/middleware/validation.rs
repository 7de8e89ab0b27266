use crate::handler::Next;
use crate::helpers;
use crate::middleware::Middleware;
use http_body_util::{BodyExt, Full};
use hyper::header::{self, HeaderMap};
use hyper::{Request, StatusCode};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::sync::Arc;

impl Middleware {
    /// Creates a middleware which rejects requests missing any of the `fields` form values.
    ///
    /// Form values are read from the query string and, for `application/x-www-form-urlencoded`
    /// requests, from the body; a value present in both comes from the body. A missing or empty
    /// field short-circuits the chain with `400 Bad Request`.
    pub fn required_fields<I, S>(fields: I) -> Middleware
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Arc<Vec<String>> = Arc::new(fields.into_iter().map(Into::into).collect());

        Middleware::new(move |next: Next| {
            let fields = fields.clone();
            Next::new(move |req| {
                let next = next.clone();
                let fields = fields.clone();
                async move {
                    let (parts, body) = req.into_parts();
                    let body = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();

                    let mut form = parse_form(parts.uri.query().unwrap_or(""));
                    if is_form_body(&parts.headers) {
                        form.extend(parse_form(&String::from_utf8_lossy(&body)));
                    }

                    let missing: Vec<&str> = fields
                        .iter()
                        .filter(|f| form.get(f.as_str()).map_or(true, |v| v.is_empty()))
                        .map(String::as_str)
                        .collect();

                    if !missing.is_empty() {
                        return Ok(helpers::text_response(
                            StatusCode::BAD_REQUEST,
                            format!("Missing required fields: {}", missing.join(", ")),
                        ));
                    }

                    next.run(Request::from_parts(parts, Full::new(body))).await
                }
            })
        })
        .with_name("required_fields")
    }
}

fn is_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

// Keeps the first value of each key, like a typical form lookup.
fn parse_form(input: &str) -> HashMap<String, String> {
    let mut form = HashMap::new();
    for pair in input.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        form.entry(decode_component(key)).or_insert_with(|| decode_component(value));
    }
    form
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
