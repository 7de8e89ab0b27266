use crate::constants::{CATCH_ALL_GROUP, CATCH_ALL_SEGMENT, DEFAULT_SEGMENT_REGEX};
use crate::types::RouteParams;
use crate::Error;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Debug, Formatter};
use std::iter::Peekable;
use std::str::Chars;

lazy_static! {
    static ref PARAM_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// A compiled route path template.
///
/// Templates are `/`-delimited. A segment may hold literal text and placeholders of the form
/// `{name}` (one or more non-`/` characters) or `{name:constraint}` (exactly the `constraint`
/// regex). A final segment made of a single `*` is a catch-all: it matches the rest of the path,
/// slashes included, and binds it under the parameter name `*`.
///
/// Apart from the catch-all, a path only matches when it has the same number of segments as the
/// template, and the match is always anchored to the whole path.
///
/// # Examples
///
/// ```
/// use switchyard::PathPattern;
///
/// let pattern = PathPattern::compile("/users/{id:[0-9]+}/books/{book}").unwrap();
///
/// let params = pattern.matches("/users/42/books/dune").unwrap();
/// assert_eq!(params.get("id").unwrap(), "42");
/// assert_eq!(params.get("book").unwrap(), "dune");
///
/// assert!(pattern.matches("/users/alice/books/dune").is_none());
/// assert!(pattern.matches("/users/42/books/dune/extra").is_none());
/// ```
#[derive(Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    param_names: Vec<String>,
    segments: usize,
    catch_all: bool,
}

impl PathPattern {
    /// Compiles a path template. Malformed templates are reported as [`Error::InvalidPattern`].
    pub fn compile<T: Into<String>>(template: T) -> crate::Result<PathPattern> {
        let template = template.into();
        let mut compiler = Compiler::new(&template);
        compiler.run()?;

        let Compiler {
            mut source,
            param_names,
            segments,
            catch_all,
            ..
        } = compiler;

        if catch_all {
            source.push_str(&format!("(?P<{}>.*)", CATCH_ALL_GROUP));
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| Error::invalid_pattern(template.as_str(), e.to_string()))?;

        Ok(PathPattern {
            template,
            regex,
            param_names,
            segments,
            catch_all,
        })
    }

    /// Returns the template this pattern was compiled from.
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    /// Returns the names of the placeholders, in template order. The catch-all is not listed.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns `true` if the template ends with the `*` catch-all segment.
    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    /// Matches a concrete, already decoded request path and returns the bound parameters.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let path_segments = path.split('/').count();
        if self.catch_all {
            if path_segments < self.segments {
                return None;
            }
        } else if path_segments != self.segments {
            return None;
        }

        let caps = self.regex.captures(path)?;

        let mut params = RouteParams::with_capacity(self.param_names.len() + self.catch_all as usize);
        for name in &self.param_names {
            if let Some(m) = caps.name(name) {
                params.set(name.as_str(), m.as_str());
            }
        }
        if self.catch_all {
            let rest = caps.name(CATCH_ALL_GROUP).map_or("", |m| m.as_str());
            params.set(CATCH_ALL_SEGMENT, rest);
        }

        Some(params)
    }
}

impl Debug for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ template: {:?}, regex: {:?}, param_names: {:?} }}",
            self.template,
            self.regex.as_str(),
            self.param_names
        )
    }
}

struct Compiler<'a> {
    template: &'a str,
    source: String,
    literal: String,
    segment: String,
    param_names: Vec<String>,
    segments: usize,
    catch_all: bool,
}

impl<'a> Compiler<'a> {
    fn new(template: &'a str) -> Self {
        let mut source = String::with_capacity(template.len() * 2);
        source.push('^');
        Compiler {
            template,
            source,
            literal: String::new(),
            segment: String::new(),
            param_names: Vec::new(),
            segments: 1,
            catch_all: false,
        }
    }

    fn run(&mut self) -> crate::Result<()> {
        let mut chars = self.template.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    let placeholder = self.read_placeholder(&mut chars)?;
                    self.segment.push('{');
                    self.segment.push_str(&placeholder);
                    self.segment.push('}');
                    self.push_placeholder(&placeholder)?;
                }
                '}' => return Err(self.error("unbalanced `}`")),
                '/' => {
                    if self.segment == CATCH_ALL_SEGMENT {
                        return Err(self.error("the `*` catch-all is only allowed as the last segment"));
                    }
                    self.segment.clear();
                    self.segments += 1;
                    self.literal.push('/');
                }
                c => {
                    self.segment.push(c);
                    self.literal.push(c);
                }
            }
        }

        if self.segment == CATCH_ALL_SEGMENT {
            self.catch_all = true;
            self.literal.pop();
        }
        self.flush_literal();

        Ok(())
    }

    fn read_placeholder(&self, chars: &mut Peekable<Chars<'_>>) -> crate::Result<String> {
        let mut inner = String::new();
        let mut depth = 1;

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    inner.push(ch);
                    if let Some(escaped) = chars.next() {
                        inner.push(escaped);
                    }
                }
                '{' => {
                    depth += 1;
                    inner.push(ch);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(inner);
                    }
                    inner.push(ch);
                }
                c => inner.push(c),
            }
        }

        Err(self.error("unbalanced `{`"))
    }

    fn push_placeholder(&mut self, placeholder: &str) -> crate::Result<()> {
        let (name, constraint) = match placeholder.split_once(':') {
            Some((name, constraint)) => (name, constraint),
            None => (placeholder, DEFAULT_SEGMENT_REGEX),
        };

        if !PARAM_NAME_RE.is_match(name) {
            return Err(self.error(format!("invalid parameter name `{}`", name)));
        }
        if name == CATCH_ALL_GROUP || self.param_names.iter().any(|n| n == name) {
            return Err(self.error(format!("duplicate parameter name `{}`", name)));
        }
        if constraint.is_empty() {
            return Err(self.error(format!("empty constraint for parameter `{}`", name)));
        }

        self.flush_literal();
        self.source.push_str(&format!("(?P<{}>{})", name, constraint));
        self.param_names.push(name.to_owned());

        Ok(())
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.source.push_str(&regex::escape(&self.literal));
            self.literal.clear();
        }
    }

    fn error<R: Into<String>>(&self, reason: R) -> Error {
        Error::invalid_pattern(self.template, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_static_paths_exactly() {
        let pattern = PathPattern::compile("/about").unwrap();
        assert!(pattern.matches("/about").is_some());
        assert!(pattern.matches("/about/").is_none());
        assert!(pattern.matches("/aboutus").is_none());
        assert!(pattern.matches("/x/about").is_none());
    }

    #[test]
    fn should_extract_named_params() {
        let pattern = PathPattern::compile("/users/{id}").unwrap();
        let params = pattern.matches("/users/42").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id").unwrap(), "42");
    }

    #[test]
    fn should_reject_segment_count_mismatch() {
        let pattern = PathPattern::compile("/users/{id}").unwrap();
        assert!(pattern.matches("/users/42/extra").is_none());
        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/").is_none());
    }

    #[test]
    fn should_reject_wide_constraints_crossing_segments() {
        let pattern = PathPattern::compile("/files/{name:.+}").unwrap();
        assert_eq!(pattern.matches("/files/a.txt").unwrap().get("name").unwrap(), "a.txt");
        assert!(pattern.matches("/files/dir/a.txt").is_none());
    }

    #[test]
    fn should_apply_constraints() {
        let pattern = PathPattern::compile(r"/posts/{year:\d{4}}/{slug:[a-z-]+}").unwrap();
        let params = pattern.matches("/posts/2024/hello-world").unwrap();
        assert_eq!(params.get("year").unwrap(), "2024");
        assert_eq!(params.get("slug").unwrap(), "hello-world");
        assert!(pattern.matches("/posts/24/hello-world").is_none());
        assert!(pattern.matches("/posts/2024/Hello").is_none());
    }

    #[test]
    fn should_mix_literals_and_params_in_a_segment() {
        let pattern = PathPattern::compile("/files/{name}.txt").unwrap();
        assert_eq!(pattern.matches("/files/notes.txt").unwrap().get("name").unwrap(), "notes");
        assert!(pattern.matches("/files/notes.md").is_none());
    }

    #[test]
    fn should_escape_literal_regex_characters() {
        let pattern = PathPattern::compile("/v1.0/(items)").unwrap();
        assert!(pattern.matches("/v1.0/(items)").is_some());
        assert!(pattern.matches("/v1x0/(items)").is_none());
    }

    #[test]
    fn should_match_catch_all() {
        let pattern = PathPattern::compile("/static/*").unwrap();
        assert!(pattern.is_catch_all());
        assert_eq!(pattern.matches("/static/css/site.css").unwrap().get("*").unwrap(), "css/site.css");
        assert_eq!(pattern.matches("/static/").unwrap().get("*").unwrap(), "");
        assert!(pattern.matches("/static").is_none());

        let root = PathPattern::compile("/*").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/anything/at/all").is_some());
    }

    #[test]
    fn should_compile_deterministically() {
        let a = PathPattern::compile("/a/{b:[0-9]+}").unwrap();
        let b = PathPattern::compile("/a/{b:[0-9]+}").unwrap();
        assert_eq!(a.regex.as_str(), b.regex.as_str());
        assert_eq!(a.param_names(), b.param_names());
    }

    #[test]
    fn should_reject_malformed_templates() {
        for template in [
            "/users/{id",
            "/users/id}",
            "/users/{}",
            "/users/{1id}",
            "/users/{id}/{id}",
            "/users/{id:}",
            "/users/{id:[0-9}",
            "/*/tail",
        ] {
            match PathPattern::compile(template) {
                Err(Error::InvalidPattern { template: t, .. }) => assert_eq!(t, template),
                other => panic!("expected an invalid pattern error for {}, got {:?}", template, other),
            }
        }
    }
}
