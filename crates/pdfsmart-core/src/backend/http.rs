//! HTTP backend over `reqwest`.

use super::{Backend, BackendError, BackendResult, BinaryResponse};
use crate::BoxFuture;
use crate::config::EditorConfig;
use crate::sync::CanvasPayload;
use crate::tools::{FormPart, Tool, ToolForm};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

/// Backend client speaking the document service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the configured base URL.
    pub fn new(config: &EditorConfig) -> BackendResult<Self> {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.request_timeout());
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Turn a non-success status into an error, keeping the body as the message.
async fn check_status(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn into_binary(response: Response) -> BackendResult<BinaryResponse> {
    let response = check_status(response).await?;
    let content_disposition = header_string(response.headers(), CONTENT_DISPOSITION);
    let content_type = header_string(response.headers(), CONTENT_TYPE);
    let bytes = response.bytes().await?.to_vec();
    Ok(BinaryResponse {
        bytes,
        content_disposition,
        content_type,
    })
}

fn multipart_form(form: ToolForm) -> Form {
    form.into_parts()
        .into_iter()
        .fold(Form::new(), |multipart, part| match part {
            FormPart::Text { name, value } => multipart.text(name, value),
            FormPart::File { name, file } => {
                multipart.part(name, Part::bytes(file.bytes).file_name(file.filename))
            }
        })
}

impl Backend for HttpBackend {
    fn save_page_canvas<'a>(
        &'a self,
        session_id: &'a str,
        page_index: usize,
        payload: &'a CanvasPayload,
    ) -> BoxFuture<'a, BackendResult<()>> {
        Box::pin(async move {
            let url = self.url(&super::canvas_path(session_id, page_index));
            log::debug!("POST {} ({} objects)", url, payload.objects.len());

            let response = self.client.post(&url).json(payload).send().await?;
            check_status(response).await?;
            Ok(())
        })
    }

    fn download_document<'a>(
        &'a self,
        session_id: &'a str,
    ) -> BoxFuture<'a, BackendResult<BinaryResponse>> {
        Box::pin(async move {
            let url = self.url(&super::download_path(session_id));
            log::debug!("GET {}", url);

            let response = self.client.get(&url).send().await?;
            into_binary(response).await
        })
    }

    fn run_tool<'a>(
        &'a self,
        tool: Tool,
        form: ToolForm,
    ) -> BoxFuture<'a, BackendResult<BinaryResponse>> {
        Box::pin(async move {
            let url = self.url(&super::tool_path(tool));
            log::debug!("POST {} ({} form parts)", url, form.len());

            let response = self
                .client
                .post(&url)
                .multipart(multipart_form(form))
                .send()
                .await?;
            into_binary(response).await
        })
    }
}
