use base64::{engine::general_purpose, Engine as _};
use tracing::{error, info, warn};

use crate::llm::gemini::{inline_data_part, text_part, GeminiClient};
use crate::llm::media::{gemini_supports_image_mime, normalize_image_mime_type};
use crate::makeover::error::RedesignError;
use crate::makeover::normalize::parse_design_brief;
use crate::makeover::prompts::{design_brief_instruction, design_brief_schema, render_instruction};
use crate::makeover::types::RedesignOutcome;
use crate::utils::data_uri::DataUri;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceImage {
    mime_type: String,
    payload: String,
}

/// Accepts either bare base64 or a full data URI; the URI's media type is used
/// when `mime_type` is blank.
fn prepare_image(image_data: &str, mime_type: &str) -> Result<SourceImage, RedesignError> {
    let image_data = image_data.trim();
    if image_data.is_empty() {
        return Err(RedesignError::Input("Missing image data.".to_string()));
    }

    let (declared_mime, payload) = if image_data.starts_with("data:") {
        let uri = DataUri::parse(image_data)
            .map_err(|err| RedesignError::Input(format!("Image data URI is malformed: {err}.")))?;
        let declared = if mime_type.trim().is_empty() {
            uri.mime_type().to_string()
        } else {
            mime_type.to_string()
        };
        (declared, uri.payload().to_string())
    } else {
        (mime_type.to_string(), image_data.to_string())
    };

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|_| RedesignError::Input("Image data is not valid base64.".to_string()))?;
    if decoded.is_empty() {
        return Err(RedesignError::Input("Missing image data.".to_string()));
    }

    let mime_type = normalize_image_mime_type(&declared_mime);
    if mime_type.is_empty() {
        return Err(RedesignError::Input("Missing image media type.".to_string()));
    }
    if !gemini_supports_image_mime(&mime_type) {
        return Err(RedesignError::Input(format!(
            "Unsupported image type {mime_type}. Please use a PNG, JPEG, WEBP or HEIC photo."
        )));
    }

    Ok(SourceImage { mime_type, payload })
}

fn upstream(stage: &str, err: anyhow::Error) -> RedesignError {
    error!("Redesign {} call failed: {:#}", stage, err);
    RedesignError::Upstream(err.to_string())
}

/// Produces a redesigned room image plus shoppable products for one photo.
///
/// Makes two sequential model calls: a schema-constrained design brief, then
/// an image render from that brief. Nothing partial is returned; inputs are
/// validated before either call goes out.
pub async fn redesign(
    client: &GeminiClient,
    image_data: &str,
    mime_type: &str,
    prompt: &str,
) -> Result<RedesignOutcome, RedesignError> {
    let image = prepare_image(image_data, mime_type)?;
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(RedesignError::Input("Missing style prompt.".to_string()));
    }

    info!(
        "Starting redesign (image_bytes_b64={}, mime={}, prompt_chars={})",
        image.payload.len(),
        image.mime_type,
        prompt.chars().count()
    );

    let brief_parts = vec![
        text_part(&design_brief_instruction(prompt)),
        inline_data_part(&image.mime_type, &image.payload),
    ];
    let brief_text = client
        .generate_structured(brief_parts, design_brief_schema())
        .await
        .map_err(|err| upstream("design brief", err))?;

    let brief = parse_design_brief(&brief_text).inspect_err(|_| {
        let preview: String = brief_text.chars().take(300).collect();
        warn!("Design brief could not be parsed (model={}): {:?}", client.brief_model(), preview);
    })?;
    info!(
        "Design brief parsed: products={} dimensions={} has_image_prompt={}",
        brief.products.len(),
        brief.dimensions.is_some(),
        brief.image_prompt.is_some()
    );

    let render_brief = brief
        .image_prompt
        .clone()
        .unwrap_or_else(|| format!("Apply this style: {prompt}."));
    let render_parts = vec![
        inline_data_part(&image.mime_type, &image.payload),
        text_part(&render_instruction(&render_brief)),
    ];
    let rendered = client
        .generate_image(render_parts)
        .await
        .map_err(|err| upstream("render", err))?
        .ok_or_else(|| {
            warn!("Render call returned no inline image (model={})", client.image_model());
            RedesignError::ImageNotProduced
        })?;

    let rendered_mime = normalize_image_mime_type(&rendered.mime_type);
    let redesigned_image = DataUri::new(rendered_mime, rendered.data.trim()).to_string();

    Ok(RedesignOutcome {
        redesigned_image,
        products: brief.products,
        estimated_dimensions: brief.dimensions,
        design_notes: brief.narrative,
    })
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::llm::mock::{spawn_mock_gemini, MockGemini, MockReply};
    use crate::makeover::types::{BoundingBox, RoomDimensions};

    fn photo() -> String {
        general_purpose::STANDARD.encode(b"pretend these are jpeg bytes")
    }

    fn brief_reply(value: serde_json::Value) -> MockReply {
        MockReply::Text(value.to_string())
    }

    async fn client_for(brief: MockReply, image: MockReply) -> (GeminiClient, MockGemini) {
        let mock = spawn_mock_gemini(brief, image).await;
        let client = GeminiClient::from_config(&Config::for_tests(&mock.base_url)).unwrap();
        (client, mock)
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_any_call() {
        let (client, mock) = client_for(MockReply::Empty, MockReply::Empty).await;

        let err = redesign(&client, &photo(), "image/jpeg", "   ").await.unwrap_err();
        assert!(err.is_input());
        assert_eq!(mock.brief_calls(), 0);
        assert_eq!(mock.image_calls(), 0);
    }

    #[tokio::test]
    async fn bad_image_inputs_are_rejected_before_any_call() {
        let (client, mock) = client_for(MockReply::Empty, MockReply::Empty).await;

        for (data, mime) in [
            ("", "image/png"),
            ("not base64 at all!", "image/png"),
            (photo().as_str(), "image/gif"),
            (photo().as_str(), "application/pdf"),
            (photo().as_str(), ""),
            ("data:image/png,raw", ""),
        ] {
            let err = redesign(&client, data, mime, "modern").await.unwrap_err();
            assert!(err.is_input(), "{data:?} {mime:?} -> {err:?}");
        }
        assert_eq!(mock.brief_calls(), 0);
    }

    #[tokio::test]
    async fn full_redesign_returns_normalized_triple() {
        let (client, mock) = client_for(
            brief_reply(json!({
                "imagePrompt": "Scandinavian living room with oak and linen",
                "narrative": "Light woods keep it airy.",
                "estimatedDimensions": { "length": 15.2, "width": "12", "height": 8.6 },
                "products": [
                    { "name": "Lamp", "url": "https://x.com/l", "description": "d", "store": "s", "price": 129 },
                    { "name": "Ghost", "url": "not-a-url" }
                ]
            })),
            MockReply::png("UE5HREFUQQ=="),
        )
        .await;

        let outcome = redesign(&client, &photo(), "image/jpg", "Scandi calm").await.unwrap();

        assert_eq!(outcome.redesigned_image, "data:image/png;base64,UE5HREFUQQ==");
        assert_eq!(outcome.products.len(), 1);
        assert_eq!(outcome.products[0].price, "$129");
        assert_eq!(outcome.products[0].bounding_box, BoundingBox::FULL_FRAME);
        assert_eq!(
            outcome.estimated_dimensions,
            Some(RoomDimensions { length: 15.0, width: 12.0, height: 9.0 })
        );
        assert_eq!(outcome.design_notes.as_deref(), Some("Light woods keep it airy."));

        let brief_request = mock.last_brief_request().unwrap();
        assert!(brief_request.call.starts_with("brief-model:"));
        assert_eq!(
            brief_request.body.pointer("/contents/0/parts/1/inlineData/mimeType"),
            Some(&json!("image/jpeg"))
        );

        let image_request = mock.last_image_request().unwrap();
        assert!(image_request.call.starts_with("image-model:"));
        assert_eq!(
            image_request.body.pointer("/contents/0/parts/0/inlineData/data"),
            Some(&json!(photo()))
        );
        let render_text = image_request
            .body
            .pointer("/contents/0/parts/1/text")
            .and_then(|v| v.as_str())
            .unwrap();
        assert!(render_text.contains("Scandinavian living room with oak and linen"));
    }

    #[tokio::test]
    async fn missing_rendered_image_fails_whole_request() {
        let (client, mock) = client_for(
            brief_reply(json!({
                "imagePrompt": "x",
                "products": [{ "name": "Lamp", "url": "https://x.com/l" }]
            })),
            MockReply::Empty,
        )
        .await;

        let err = redesign(&client, &photo(), "image/png", "boho").await.unwrap_err();
        assert!(matches!(err, RedesignError::ImageNotProduced));
        assert_eq!(mock.brief_calls(), 1);
        assert_eq!(mock.image_calls(), 1);
    }

    #[tokio::test]
    async fn unparseable_brief_stops_before_render() {
        let (client, mock) = client_for(
            MockReply::Text("Sorry, I can't help with that room.".to_string()),
            MockReply::png("UE5H"),
        )
        .await;

        let err = redesign(&client, &photo(), "image/png", "boho").await.unwrap_err();
        assert!(matches!(err, RedesignError::Unintelligible));
        assert_eq!(mock.image_calls(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_not_retried() {
        let (client, mock) = client_for(
            MockReply::Status(503, json!({ "error": { "message": "overloaded" } })),
            MockReply::png("UE5H"),
        )
        .await;

        let err = redesign(&client, &photo(), "image/png", "boho").await.unwrap_err();
        assert!(matches!(err, RedesignError::Upstream(ref msg) if msg.contains("overloaded")));
        assert_eq!(mock.brief_calls(), 1);
        assert_eq!(mock.image_calls(), 0);
    }

    #[tokio::test]
    async fn data_uri_input_and_blank_brief_fall_back_sensibly() {
        let (client, mock) = client_for(
            brief_reply(json!({ "imagePrompt": "  ", "products": [] })),
            MockReply::Image {
                mime_type: "image/jpeg".to_string(),
                data: "SlBH".to_string(),
            },
        )
        .await;

        let source = format!("data:image/webp;base64,{}", photo());
        let outcome = redesign(&client, &source, "", "industrial loft").await.unwrap();
        assert_eq!(outcome.redesigned_image, "data:image/jpeg;base64,SlBH");
        assert!(outcome.products.is_empty());
        assert!(outcome.estimated_dimensions.is_none());

        let brief_request = mock.last_brief_request().unwrap();
        assert_eq!(
            brief_request.body.pointer("/contents/0/parts/1/inlineData/mimeType"),
            Some(&json!("image/webp"))
        );
        let render_text = mock
            .last_image_request()
            .unwrap()
            .body
            .pointer("/contents/0/parts/1/text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap();
        assert!(render_text.contains("industrial loft"));
    }
}
