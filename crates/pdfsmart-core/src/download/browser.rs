//! Browser download sink (WASM).

use super::{DownloadError, DownloadResult, DownloadSink, DownloadedFile};
use wasm_bindgen::JsCast;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Hands files to the browser through a temporary object URL.
#[derive(Debug, Default)]
pub struct BrowserSink;

impl BrowserSink {
    pub fn new() -> Self {
        Self
    }
}

fn js_error(context: &str, err: wasm_bindgen::JsValue) -> DownloadError {
    DownloadError::Browser(format!("{}: {:?}", context, err))
}

impl DownloadSink for BrowserSink {
    fn deliver(&self, file: &DownloadedFile) -> DownloadResult<()> {
        let window =
            web_sys::window().ok_or_else(|| DownloadError::Browser("No window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| DownloadError::Browser("No document".to_string()))?;

        let uint8_array = js_sys::Uint8Array::from(file.bytes.as_slice());
        let blob_parts = js_sys::Array::new();
        blob_parts.push(&uint8_array);

        let options = web_sys::BlobPropertyBag::new();
        options.set_type(file.content_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE));

        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&blob_parts, &options)
            .map_err(|e| js_error("Failed to create blob", e))?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|e| js_error("Failed to create URL", e))?;

        let result = (|| {
            let anchor = document
                .create_element("a")
                .map_err(|e| js_error("Failed to create element", e))?
                .dyn_into::<web_sys::HtmlAnchorElement>()
                .map_err(|_| DownloadError::Browser("Failed to cast to anchor".to_string()))?;
            anchor.set_href(&url);
            anchor.set_download(&file.filename);
            anchor.click();
            Ok(())
        })();

        // The object URL is released whether or not the click went through.
        web_sys::Url::revoke_object_url(&url).ok();
        result
    }
}
