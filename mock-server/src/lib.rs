//! Echo server that stands in for the far end of the transport.
//!
//! Every request is answered with a JSON description of what actually arrived
//! on the socket, so tests can compare the normalizer's declared headers with
//! the bytes the server framed.

use axum::{
    body::Bytes,
    extract::Multipart,
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// What the server saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    /// Header names as lowercased by the server, in arrival order.
    pub headers: Vec<(String, String)>,
    pub body_len: usize,
    pub body: String,
}

impl Echo {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A parsed `multipart/form-data` field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub value: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/form", post(parse_form))
        .fallback(echo)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers: Vec<(String, String)> = headers
        .iter()
        .map(|(n, v)| (n.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    debug!(%method, %uri, headers = headers.len(), body_len = body.len(), "echo");
    Json(Echo {
        method: method.to_string(),
        path: uri.path_and_query().map(|p| p.as_str().to_string()).unwrap_or_default(),
        headers,
        body_len: body.len(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn parse_form(mut multipart: Multipart) -> Result<Json<Vec<FormField>>, (StatusCode, String)> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let value = field
            .text()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        fields.push(FormField {
            name,
            filename,
            content_type,
            value,
        });
    }
    debug!(fields = fields.len(), "form parsed");
    Ok(Json(fields))
}
