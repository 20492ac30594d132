use futures::future::LocalBoxFuture;
use futures::FutureExt;
use guardwatch_core::{DataFetcher, FetchError};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, RequestMode, Response};

/// Same-origin API prefix served next to the dashboard page.
pub const API_BASE: &str = "api/1/";

/// `window.fetch` with the session cookie attached.
pub struct WebFetcher {
    base: String,
}

impl WebFetcher {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
        }
    }
}

impl DataFetcher for WebFetcher {
    type Fetch = LocalBoxFuture<'static, Result<String, FetchError>>;

    fn fetch(&self, path_and_query: &str) -> Self::Fetch {
        let url = format!("{}{path_and_query}", self.base);
        get_text(url).boxed_local()
    }
}

fn js_error(value: &JsValue) -> FetchError {
    FetchError::Transport(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

async fn get_text(url: String) -> Result<String, FetchError> {
    let Some(window) = web_sys::window() else {
        return Err(FetchError::Transport("no window".to_string()));
    };

    let headers = Headers::new().map_err(|e| js_error(&e))?;
    headers
        .set("Accept", "application/json, text/plain, */*")
        .map_err(|e| js_error(&e))?;
    headers
        .set("Accept-Language", "en-US,en;q=0.5")
        .map_err(|e| js_error(&e))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::SameOrigin);
    opts.set_credentials(RequestCredentials::Include);
    opts.set_headers(&headers);

    let request = Request::new_with_str_and_init(&url, &opts).map_err(|e| js_error(&e))?;

    let response_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| js_error(&e))?;

    let Ok(response) = response_value.dyn_into::<Response>() else {
        return Err(FetchError::Body("fetch did not return a Response".to_string()));
    };

    let text_promise = response
        .text()
        .map_err(|e| FetchError::Body(format!("{e:?}")))?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|e| FetchError::Body(format!("{e:?}")))?;

    text.as_string()
        .ok_or_else(|| FetchError::Body("response body is not text".to_string()))
}
