//! One-shot redesign of a photo on disk, driven through the same session
//! workflow the browser front end uses.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::llm::media::{extension_for_mime, load_image_file};
use crate::llm::GeminiClient;
use crate::makeover::{redesign, RedesignOutcome};
use crate::state::{AppState, InputMode};
use crate::utils::data_uri::DataUri;
use crate::utils::timing::{complete_request_timer, start_request_timer};

#[derive(Debug, Clone)]
pub struct FileRedesignArgs {
    pub image_path: PathBuf,
    pub prompt: String,
    pub out_path: Option<PathBuf>,
    pub mode: InputMode,
}

#[derive(Debug)]
pub struct FileRedesignReport {
    pub state: AppState,
    pub image_path: PathBuf,
    pub json_path: PathBuf,
    pub summary: String,
}

fn default_output_base(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "room".to_string());
    image_path.with_file_name(format!("{stem}-redesigned"))
}

/// Plain-text rendering of an outcome; tolerates no products and no room size.
pub fn render_summary(outcome: &RedesignOutcome) -> String {
    let mut out = String::new();

    match &outcome.estimated_dimensions {
        Some(dims) => {
            let _ = writeln!(
                out,
                "Estimated room: {} ft x {} ft, {} ft ceiling",
                dims.length, dims.width, dims.height
            );
        }
        None => {
            let _ = writeln!(out, "Room size unavailable");
        }
    }

    if let Some(notes) = &outcome.design_notes {
        let _ = writeln!(out, "{notes}");
    }

    if outcome.products.is_empty() {
        let _ = writeln!(out, "No products suggested");
    } else {
        let _ = writeln!(out, "Shop the look:");
        for (index, product) in outcome.products.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} ({}, {}) {}",
                index + 1,
                product.name,
                product.store,
                product.price,
                product.url
            );
        }
    }

    out.trim_end().to_string()
}

async fn write_outputs(base: &Path, outcome: &RedesignOutcome) -> Result<(PathBuf, PathBuf)> {
    let image = DataUri::parse(&outcome.redesigned_image)
        .map_err(|err| anyhow!("Redesigned image is not a data URI: {err}"))?;
    let bytes = image
        .decode()
        .context("Redesigned image payload is not valid base64")?;

    let image_path = base.with_extension(extension_for_mime(image.mime_type()));
    let json_path = base.with_extension("json");

    tokio::fs::write(&image_path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", image_path.display()))?;
    tokio::fs::write(&json_path, serde_json::to_vec_pretty(outcome)?)
        .await
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    Ok((image_path, json_path))
}

pub async fn run_file_redesign(
    client: &GeminiClient,
    args: FileRedesignArgs,
) -> Result<FileRedesignReport> {
    let mut state = AppState::new();
    state.select_mode(args.mode);
    if args.mode == InputMode::Live {
        return Err(anyhow!(
            "Live camera capture is only available in the browser; use --mode upload."
        ));
    }

    match load_image_file(&args.image_path).await {
        Ok(image) => state.image_ready(&image),
        Err(err) => {
            state.capture_failed(&err.to_string());
            return Err(anyhow!(err));
        }
    }

    state.set_prompt(&args.prompt);
    let input = state.begin_generation()?;

    let mut timer = start_request_timer("redesign", "cli", Some(&input.prompt));
    let outcome = match redesign(client, &input.image_base64, &input.mime_type, &input.prompt).await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            complete_request_timer(&mut timer, "error", Some(err.kind().to_string()));
            state.fail(&err);
            return Err(anyhow!(state.error.clone().unwrap_or_else(|| err.to_string())));
        }
    };
    complete_request_timer(&mut timer, "success", None);

    let base = args
        .out_path
        .clone()
        .unwrap_or_else(|| default_output_base(&args.image_path));
    let (image_path, json_path) = write_outputs(&base, &outcome).await?;
    info!(
        "Wrote redesign to {} and {}",
        image_path.display(),
        json_path.display()
    );

    let summary = render_summary(&outcome);
    state.complete(outcome);

    Ok(FileRedesignReport {
        state,
        image_path,
        json_path,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::llm::media::{NOT_AN_IMAGE_MESSAGE, PNG_HEADER};
    use crate::llm::mock::{spawn_mock_gemini, MockReply};
    use crate::makeover::types::{BoundingBox, Product, RoomDimensions};
    use crate::state::AppStep;

    fn write_photo(dir: &Path) -> PathBuf {
        let path = dir.join("living-room.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(PNG_HEADER).unwrap();
        path
    }

    async fn client(brief: MockReply, image: MockReply) -> GeminiClient {
        let mock = spawn_mock_gemini(brief, image).await;
        GeminiClient::from_config(&Config::for_tests(&mock.base_url)).unwrap()
    }

    #[test]
    fn summary_tolerates_empty_results() {
        let outcome = RedesignOutcome {
            redesigned_image: "data:image/png;base64,UE5H".to_string(),
            products: Vec::new(),
            estimated_dimensions: None,
            design_notes: None,
        };
        assert_eq!(render_summary(&outcome), "Room size unavailable\nNo products suggested");
    }

    #[test]
    fn summary_lists_products_and_size() {
        let outcome = RedesignOutcome {
            redesigned_image: "data:image/png;base64,UE5H".to_string(),
            products: vec![Product {
                name: "Lamp".to_string(),
                description: "d".to_string(),
                url: "https://x.com/l".to_string(),
                store: "GlowHaus".to_string(),
                price: "$289".to_string(),
                bounding_box: BoundingBox::FULL_FRAME,
                silhouette: None,
            }],
            estimated_dimensions: Some(RoomDimensions { length: 12.0, width: 14.0, height: 9.0 }),
            design_notes: None,
        };
        let summary = render_summary(&outcome);
        assert!(summary.starts_with("Estimated room: 12 ft x 14 ft, 9 ft ceiling"));
        assert!(summary.contains("1. Lamp (GlowHaus, $289) https://x.com/l"));
    }

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_base(Path::new("/photos/den.jpg")),
            PathBuf::from("/photos/den-redesigned")
        );
    }

    #[tokio::test]
    async fn writes_image_and_json_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let photo = write_photo(dir.path());
        let client = client(
            MockReply::Text(
                json!({ "imagePrompt": "x", "products": [{ "name": "Lamp", "url": "https://x.com/l" }] })
                    .to_string(),
            ),
            MockReply::png("UE5HREFUQQ=="),
        )
        .await;

        let report = run_file_redesign(
            &client,
            FileRedesignArgs {
                image_path: photo.clone(),
                prompt: "warm minimalist".to_string(),
                out_path: Some(dir.path().join("result")),
                mode: InputMode::Upload,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.state.step, AppStep::ShowResult);
        assert_eq!(report.image_path, dir.path().join("result.png"));
        assert_eq!(std::fs::read(&report.image_path).unwrap(), b"PNGDATA");
        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&report.json_path).unwrap()).unwrap();
        assert_eq!(saved["products"][0]["name"], "Lamp");
        assert!(report.summary.contains("Room size unavailable"));
    }

    #[tokio::test]
    async fn failed_generation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let photo = write_photo(dir.path());
        let client = client(
            MockReply::Text(json!({ "imagePrompt": "x", "products": [] }).to_string()),
            MockReply::Empty,
        )
        .await;

        let err = run_file_redesign(
            &client,
            FileRedesignArgs {
                image_path: photo,
                prompt: "warm minimalist".to_string(),
                out_path: Some(dir.path().join("result")),
                mode: InputMode::Upload,
            },
        )
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("Failed to generate redesign."));
        assert!(!dir.path().join("result.png").exists());
        assert!(!dir.path().join("result.json").exists());
    }

    #[tokio::test]
    async fn non_image_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "not a photo").unwrap();
        let client = client(MockReply::Empty, MockReply::Empty).await;

        let err = run_file_redesign(
            &client,
            FileRedesignArgs {
                image_path: notes,
                prompt: "warm minimalist".to_string(),
                out_path: None,
                mode: InputMode::Upload,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), NOT_AN_IMAGE_MESSAGE);
    }
}
