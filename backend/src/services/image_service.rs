use crate::config::GEMINI_API_KEY;
use crate::models::GeneratedImage;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Optional reference image sent along with the prompt.
#[derive(Debug, Clone)]
pub struct AnchorImage {
    pub data: String, // base64
    pub mime_type: String,
}

/// One generateContent call against the image model. When an anchor image
/// is present it goes first in the parts, then the text.
pub async fn generate_image(
    http: &Client,
    prompt: &str,
    anchor: Option<&AnchorImage>,
) -> Result<GeneratedImage> {
    let Some(api_key) = GEMINI_API_KEY.as_ref() else {
        return Err(anyhow!("GEMINI_API_KEY not configured"));
    };

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{IMAGE_MODEL}:generateContent?key={api_key}"
    );
    let body = json!({
        "contents": [{"role": "user", "parts": build_parts(prompt, anchor)}],
        "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
    });

    let response = http
        .post(&url)
        .json(&body)
        .send()
        .await
        .context("Image API request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(anyhow!("Image API: {status} {text}"));
    }

    let data: Value = response
        .json()
        .await
        .context("Failed to parse image API response as JSON")?;

    let block_reason = data["candidates"][0]["finishReason"]
        .as_str()
        .or_else(|| data["promptFeedback"]["blockReason"].as_str());
    if let Some(reason) = block_reason {
        if reason != "STOP" && reason != "END_TURN" {
            return Err(anyhow!("Image generation blocked: {reason}"));
        }
    }

    let parts = data["candidates"][0]["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    let image_part = parts
        .iter()
        .find(|p| p["inlineData"]["data"].is_string())
        .ok_or_else(|| anyhow!("Image API returned no image data"))?;
    let text = parts
        .iter()
        .find_map(|p| p["text"].as_str())
        .map(str::to_string);

    Ok(GeneratedImage {
        image_base64: image_part["inlineData"]["data"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        mime_type: image_part["inlineData"]["mimeType"]
            .as_str()
            .unwrap_or("image/png")
            .to_string(),
        text,
    })
}

fn build_parts(prompt: &str, anchor: Option<&AnchorImage>) -> Value {
    let text = if prompt.trim().is_empty() {
        "Generate an image based on this reference.".to_string()
    } else {
        format!("Generate an image: {prompt}")
    };
    let text_part = json!({"text": text});

    match anchor {
        Some(image) => json!([
            {"inline_data": {"mime_type": image.mime_type, "data": image.data}},
            text_part
        ]),
        None => json!([text_part]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_image_goes_first() {
        let anchor = AnchorImage {
            data: "AAAA".into(),
            mime_type: "image/png".into(),
        };
        let parts = build_parts("a boat", Some(&anchor));
        assert!(parts[0]["inline_data"]["data"].is_string());
        assert_eq!(parts[1]["text"], json!("Generate an image: a boat"));

        let parts = build_parts("a boat", None);
        assert_eq!(parts[0]["text"], json!("Generate an image: a boat"));
    }

    #[test]
    fn empty_prompt_falls_back_to_reference_text() {
        let parts = build_parts("   ", None);
        assert_eq!(
            parts[0]["text"],
            json!("Generate an image based on this reference.")
        );
    }
}
