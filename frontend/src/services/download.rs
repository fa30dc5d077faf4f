//! Browser file downloads and printable documents.

use gloo::file::futures::read_as_text;
use mentor_match_domain::export_service::ExportFile;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlInputElement, Url};

fn object_url(content: &str, mime_type: &str) -> Result<String, JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(content));
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    Url::create_object_url_with_blob(&blob)
}

/// Save `file` through a temporary anchor pointing at an object URL
pub fn download_file(file: &ExportFile) -> Result<(), JsValue> {
    let url = object_url(&file.content, &file.mime_type)?;
    let document = gloo::utils::document();
    let body = gloo::utils::body();

    let anchor: HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into()
        .map_err(JsValue::from)?;
    anchor.set_href(&url);
    anchor.set_download(&file.filename);
    body.append_child(&anchor)?;
    anchor.click();
    body.remove_child(&anchor)?;
    Url::revoke_object_url(&url)
}

/// Open a self-contained HTML document in a new tab for print-to-PDF
pub fn open_printable(html: &str) -> Result<(), JsValue> {
    let url = object_url(html, "text/html")?;
    gloo::utils::window().open_with_url_and_target(&url, "_blank")?;
    Ok(())
}

/// Text of the first file picked in a file input
pub async fn read_selected_file(input: &HtmlInputElement) -> Option<Result<String, String>> {
    let file = input.files()?.get(0)?;
    let file = gloo::file::File::from(file);
    Some(read_as_text(&file).await.map_err(|err| err.to_string()))
}
