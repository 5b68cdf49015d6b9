//! Form field extraction
//!
//! Fields come from an `application/x-www-form-urlencoded` or
//! `multipart/form-data` body and from the query string. Body fields shadow
//! query fields, and the first occurrence of a repeated name wins.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use bytes::Bytes;
use thiserror::Error;
use tracing::warn;

use crate::protocol::reply::Reply;

/// Reasons a form body is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("invalid percent escape at byte {0}")]
    InvalidEscape(usize),

    #[error("invalid semicolon separator")]
    Semicolon,

    #[error("unreadable body: {0}")]
    Body(String),
}

/// Decoded form fields of one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    fields: HashMap<String, String>,
}

impl FormFields {
    /// Value of a field, empty when absent
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Add the pairs of a urlencoded string.
    pub fn extend_encoded(&mut self, raw: &[u8]) -> Result<(), FormError> {
        for (name, value) in decode_pairs(raw)? {
            self.insert(name, value);
        }
        Ok(())
    }

    /// Build from already-decoded pairs.
    #[cfg(test)]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = Self::default();
        for (name, value) in pairs {
            form.insert(name, value);
        }
        form
    }
}

/// Decode a urlencoded string, rejecting broken escapes and `;` separators.
pub fn decode_pairs(raw: &[u8]) -> Result<Vec<(String, String)>, FormError> {
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'%' => {
                let valid = raw.len() > i + 2
                    && raw[i + 1].is_ascii_hexdigit()
                    && raw[i + 2].is_ascii_hexdigit();
                if !valid {
                    return Err(FormError::InvalidEscape(i));
                }
                i += 3;
            }
            b';' => return Err(FormError::Semicolon),
            _ => i += 1,
        }
    }

    Ok(url::form_urlencoded::parse(raw)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

fn malformed(err: impl std::fmt::Display) -> Reply {
    warn!("Rejecting malformed form: {}", err);
    Reply::TryAgain
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = Reply;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(str::to_owned);
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut form = FormFields::default();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(malformed)?;
            while let Some(field) = multipart.next_field().await.map_err(malformed)? {
                // file uploads are not form values
                if field.file_name().is_some() {
                    continue;
                }
                let name = field.name().unwrap_or_default().to_string();
                let value = field.text().await.map_err(malformed)?;
                form.insert(name, value);
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| malformed(FormError::Body(e.to_string())))?;
            form.extend_encoded(&body).map_err(malformed)?;
        }

        if let Some(query) = query {
            form.extend_encoded(query.as_bytes()).map_err(malformed)?;
        }

        Ok(form)
    }
}
