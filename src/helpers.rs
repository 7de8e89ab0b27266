use crate::types::RequestMeta;
use bytes::Bytes;
use http::Extensions;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use once_cell::sync::OnceCell;
use percent_encoding::percent_decode_str;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::panic;

thread_local! {
    static PANIC_BACKTRACE: Cell<Option<Backtrace>> = const { Cell::new(None) };
}

static BACKTRACE_HOOK: OnceCell<()> = OnceCell::new();

pub(crate) fn update_req_meta_in_extensions(ext: &mut Extensions, req_meta: RequestMeta) {
    if let Some(existing_req_meta) = ext.get_mut::<RequestMeta>() {
        existing_req_meta.extend(req_meta);
    } else {
        ext.insert(req_meta);
    }
}

pub(crate) fn percent_decode_request_path(val: &str) -> crate::Result<String> {
    percent_decode_str(val)
        .decode_utf8()
        .map_err(|e| crate::Error::new(format!("Couldn't percent decode request path: {}", e)))
        .map(|val| val.to_string())
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

/// Chains a panic hook which records the backtrace of the panicking thread, taken at the panic
/// site, before the previous hook runs. Installed once per process.
pub(crate) fn install_backtrace_hook() {
    BACKTRACE_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let _ = PANIC_BACKTRACE.try_with(|slot| slot.set(Some(Backtrace::force_capture())));
            previous(info);
        }));
    });
}

/// Takes the backtrace recorded by the last panic on this thread, if the hook is installed.
pub(crate) fn take_panic_backtrace() -> Option<Backtrace> {
    PANIC_BACKTRACE.try_with(Cell::take).ok().flatten()
}

pub(crate) fn text_response<B: Into<Bytes>>(status: StatusCode, body: B) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(body.into()));
    *res.status_mut() = status;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}

pub(crate) fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_percent_encoded_paths() {
        assert_eq!(percent_decode_request_path("/users/j%C3%BCrgen").unwrap(), "/users/jürgen");
        assert!(percent_decode_request_path("/bad/%FF").is_err());
    }

    #[test]
    fn should_read_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }

    #[inline(never)]
    fn fail_deep_inside() {
        panic!("deep failure");
    }

    #[test]
    fn should_record_backtrace_at_panic_site() {
        install_backtrace_hook();
        take_panic_backtrace();

        assert!(panic::catch_unwind(fail_deep_inside).is_err());

        let backtrace = take_panic_backtrace().unwrap().to_string();
        assert!(backtrace.contains("fail_deep_inside"), "unexpected backtrace: {}", backtrace);
        assert!(take_panic_backtrace().is_none());
    }
}
