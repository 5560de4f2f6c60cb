//! Request parameters.
//!
//! Clients may send parameters in the query string or as an
//! `application/x-www-form-urlencoded` body. Both sources are merged; the
//! query string wins when a name appears in both, and within one source the
//! first occurrence of a name wins.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use grouperserve_engine::GroupOptions;
use std::collections::HashMap;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn from_parts(query: Option<&str>, form: Option<&[u8]>) -> Self {
        let mut values = HashMap::new();
        let sources = query
            .map(str::as_bytes)
            .into_iter()
            .chain(form);
        for source in sources {
            for (name, value) in url::form_urlencoded::parse(source) {
                values
                    .entry(name.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }

    /// Flags are set only by the exact value `true`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn pretty(&self) -> bool {
        self.flag("pretty")
    }

    pub fn options(&self) -> GroupOptions {
        GroupOptions {
            annotate: self.flag("annotate"),
            supplements: self.flag("zegroup"),
        }
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE))
}

impl<S> FromRequest<S> for Params
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(str::to_owned);
        let form = is_form(&req);
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let form_body = if form { Some(&body[..]) } else { None };
        Ok(Self::from_parts(query.as_deref(), form_body))
    }
}
