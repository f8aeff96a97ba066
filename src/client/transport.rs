use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use super::error::UploadError;
use super::file::SelectedFile;
use crate::api::handlers::convert::FILE_FIELD;

/// Fixed path of the conversion endpoint
pub const CONVERT_PATH: &str = "/convert";

/// The outbound half of an upload: send the file, get the converted bytes back.
#[async_trait::async_trait]
pub trait ConvertTransport: Send + Sync {
    async fn convert(&self, file: &SelectedFile) -> Result<Bytes, UploadError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `POST /convert` over HTTP with reqwest
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str, timeout: Option<Duration>) -> Result<Self, UploadError> {
        let base = Url::parse(server_url)
            .map_err(|e| UploadError::Transport(format!("invalid server url {}: {}", server_url, e)))?;
        let endpoint = base
            .join(CONVERT_PATH)
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ConvertTransport for HttpTransport {
    async fn convert(&self, file: &SelectedFile) -> Result<Bytes, UploadError> {
        let part = Part::stream_with_length(file.content.clone(), file.len() as u64)
            .file_name(file.name.clone());
        let form = Form::new().part(FILE_FIELD, part);

        let res = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            tracing::warn!("Converter rejected upload '{}': {} {}", file.name, status, message);
            return Err(UploadError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(res.bytes().await?)
    }
}
