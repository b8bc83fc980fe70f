//! Pull the model's text out of a provider response body.

use serde_json::Value;

/// Text carried by a generation response, whatever envelope it came in.
///
/// An `error` key is a hard error. A body with no recognised text field is
/// returned serialized, so the extractor still gets a chance at it.
pub fn response_text(body: &Value) -> anyhow::Result<String> {
    if let Some(error) = body.get("error") {
        let message = error["message"]
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        anyhow::bail!("Provider returned an error: {message}");
    }

    let text = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .or_else(|| body["outputs"][0]["content"]["parts"][0]["text"].as_str())
        .or_else(|| body["outputs"][0]["content"].as_str())
        .or_else(|| body["content"].as_str())
        .or_else(|| body["output"].as_str())
        .or_else(|| body["choices"][0]["message"]["content"].as_str());

    Ok(text.map_or_else(|| body.to_string(), |text| text.trim().to_string()))
}
