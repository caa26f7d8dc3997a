use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-rapidapi-key";
pub const API_HOST_HEADER: &str = "x-rapidapi-host";

/// Builds the blocking client with both auth headers attached to every request.
pub fn http_client(
    api_key: &str,
    api_host: &str,
    timeout: Option<Duration>,
) -> Result<Client, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("football_ingest/0.1"));
    insert_header(&mut headers, API_KEY_HEADER, api_key)?;
    insert_header(&mut headers, API_HOST_HEADER, api_host)?;

    let mut builder = Client::builder().default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), ApiError> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|err| ApiError::InvalidHeader(format!("{name}: {err}")))?;
    value.set_sensitive(name == API_KEY_HEADER);
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
