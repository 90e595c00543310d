use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{instrument, trace};

pub const API_URL: &str = "https://api.dropboxapi.com/2";
pub const CONTENT_URL: &str = "https://content.dropboxapi.com/2";

const ARG_HEADER: &str = "Dropbox-API-Arg";
const RESULT_HEADER: &str = "Dropbox-API-Result";

/// Failure reported by the API for a request.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Endpoint-specific failure, e.g. `path/not_found/..`.
    #[error("{summary}{}", user_suffix(.user_message))]
    Route {
        summary: String,
        user_message: Option<String>,
    },
    #[error("invalid or expired access token: {0}")]
    Unauthorized(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
}

fn user_suffix(user_message: &Option<String>) -> String {
    match user_message {
        Some(text) => format!(" ({text})"),
        None => String::new(),
    }
}

#[derive(Deserialize)]
struct UserMessage {
    text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error_summary: String,
    #[serde(default)]
    user_message: Option<UserMessage>,
}

impl ApiError {
    pub fn from_response(status: StatusCode, body: &str) -> ApiError {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();

        match (status, parsed) {
            (StatusCode::CONFLICT, Some(err)) => ApiError::Route {
                summary: err.error_summary,
                user_message: err.user_message.map(|m| m.text),
            },
            (StatusCode::UNAUTHORIZED, Some(err)) => ApiError::Unauthorized(err.error_summary),
            (status, Some(err)) => ApiError::Http {
                status: status.as_u16(),
                message: err.error_summary,
            },
            (status, None) => ApiError::Http {
                status: status.as_u16(),
                message: body.trim().to_owned(),
            },
        }
    }
}

/// JSON argument encoded for an HTTP header: non-ASCII characters are
/// escaped as `\uXXXX`.
pub fn header_json<T: Serialize + ?Sized>(arg: &T) -> Result<String> {
    let json = serde_json::to_string(arg)?;
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];

    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                write!(out, "\\u{unit:04x}")?;
            }
        }
    }

    Ok(out)
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp
        .text()
        .await
        .with_context(|| format!("reading HTTP {status} error response"))?;
    trace!(%status, %body, "request rejected");
    Err(ApiError::from_response(status, &body).into())
}

/// Authenticated access to the RPC and content endpoints.
pub struct Transport {
    http: reqwest::Client,
    token: String,
    api_url: String,
    content_url: String,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("token", &"*****")
            .field("api_url", &self.api_url)
            .field("content_url", &self.content_url)
            .finish()
    }
}

impl Transport {
    pub fn new(token: String) -> Result<Transport> {
        Transport::with_urls(token, API_URL, CONTENT_URL)
    }

    pub fn with_urls(token: String, api_url: &str, content_url: &str) -> Result<Transport> {
        if token.is_empty() {
            return Err(anyhow!("empty access token"));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("dropme/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Transport {
            http,
            token,
            api_url: api_url.trim_end_matches('/').to_owned(),
            content_url: content_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Calls an RPC endpoint with a JSON body and decodes the JSON result.
    #[instrument(skip(self, arg))]
    pub async fn rpc<A, R>(&self, route: &str, arg: &A) -> Result<R>
    where
        A: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .http
            .post(format!("{}/{}", self.api_url, route))
            .bearer_auth(&self.token)
            .json(arg)
            .send()
            .await
            .with_context(|| format!("sending {route} request"))?;

        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Calls a content-upload endpoint: argument in a header, raw body.
    #[instrument(skip(self, arg, body), fields(len = body.len()))]
    pub async fn upload<A, R>(&self, route: &str, arg: &A, body: Bytes) -> Result<R>
    where
        A: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .http
            .post(format!("{}/{}", self.content_url, route))
            .bearer_auth(&self.token)
            .header(ARG_HEADER, header_json(arg)?)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .with_context(|| format!("sending {route} request"))?;

        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Calls a content-download endpoint; the result is carried in a
    /// response header and the body is left for the caller to stream.
    #[instrument(skip(self, arg))]
    pub async fn download<A, R>(&self, route: &str, arg: &A) -> Result<(R, Response)>
    where
        A: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .http
            .post(format!("{}/{}", self.content_url, route))
            .bearer_auth(&self.token)
            .header(ARG_HEADER, header_json(arg)?)
            .send()
            .await
            .with_context(|| format!("sending {route} request"))?;

        let resp = check_status(resp).await?;
        let result = resp
            .headers()
            .get(RESULT_HEADER)
            .ok_or_else(|| anyhow!("missing {RESULT_HEADER} header"))?
            .to_str()?;
        let result = serde_json::from_str(result)
            .with_context(|| format!("decoding {RESULT_HEADER} header"))?;

        Ok((result, resp))
    }
}
