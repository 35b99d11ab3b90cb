//! End-to-end tests for the import pipeline
//!
//! These run a full import against a local HTTP server, with the external
//! tools replaced by a toolkit that records what would have been written.

use savedMedia2archive::error::ToolError;
use savedMedia2archive::import::{ImportResult, ImportSummary, Importer};
use savedMedia2archive::manifest::Manifest;
use savedMedia2archive::metadata::{TagAssignment, local_epoch_seconds};
use savedMedia2archive::toolkit::MediaToolkit;

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::tempdir;

static INIT: Once = Once::new();

/// Initialize the logger for tests
fn init_logger() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .is_test(true)
            .init();
    });
}

/// Detects every file as the same type and keeps the tags it was asked to write
struct FakeToolkit {
    token: &'static str,
    written: Mutex<Vec<(PathBuf, Vec<TagAssignment>)>>,
}

impl FakeToolkit {
    fn new(token: &'static str) -> Self {
        Self {
            token,
            written: Mutex::new(Vec::new()),
        }
    }

    fn tag(&self, name: &str) -> Option<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, tags)| tags.iter())
            .find(|t| t.tag == name)
            .map(|t| t.value.clone())
    }
}

impl MediaToolkit for FakeToolkit {
    async fn read_type(&self, _path: &Path) -> Result<String, ToolError> {
        Ok(self.token.to_string())
    }

    async fn write_tags(&self, path: &Path, tags: &[TagAssignment]) -> Result<(), ToolError> {
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), tags.to_vec()));
        Ok(())
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        std::fs::copy(input, output)
            .map(|_| ())
            .map_err(|source| ToolError::Spawn {
                tool: "copy".to_string(),
                source,
            })
    }
}

fn manifest_json(url: &str, date: &str, location: &str, media_type: &str) -> String {
    format!(
        r#"{{
            "Saved Media": [
                {{
                    "Date": "{date}",
                    "Media Type": "{media_type}",
                    "Location": "{location}",
                    "Media Download Url": "{url}"
                }}
            ]
        }}"#
    )
}

#[tokio::test]
async fn test_photo_end_to_end() -> anyhow::Result<()> {
    init_logger();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/memory")
        .with_body("jpeg bytes")
        .create_async()
        .await;

    let manifest = Manifest::from_json(&manifest_json(
        &format!("{}/memory", server.url()),
        "2025-06-15 12:00:00 UTC",
        "Latitude, Longitude: 40.0, -74.0",
        "Image",
    ))?;

    let temp_dir = tempdir()?;
    let out_dir = temp_dir.path().join("archive");
    let toolkit = FakeToolkit::new("jpeg");
    let importer = Importer::new(out_dir.clone(), &toolkit);
    let results = importer.run(&manifest).await?;
    mock.assert_async().await;

    let path = out_dir.join("00001.jpg");
    assert!(matches!(&results[0], ImportResult::Imported { path: p, .. } if p == &path));

    // round(-74 / 15) = -5, plus one hour of US summer time
    let expected = NaiveDateTime::parse_from_str("2025-06-15 08:00:00", "%Y-%m-%d %H:%M:%S")?;
    let modified = std::fs::metadata(&path)?.modified()?;
    assert_eq!(
        modified,
        UNIX_EPOCH + Duration::from_secs(local_epoch_seconds(expected) as u64)
    );

    assert_eq!(
        toolkit.tag("DateTimeOriginal").as_deref(),
        Some("2025:06:15 08:00:00")
    );

    Ok(())
}

#[tokio::test]
async fn test_written_tags_for_photo_and_video() -> anyhow::Result<()> {
    init_logger();

    let mut server = mockito::Server::new_async().await;
    let _memory = server
        .mock("GET", "/memory")
        .with_body("bytes")
        .create_async()
        .await;
    let url = format!("{}/memory", server.url());

    for (token, media_type) in [("jpeg", "Image"), ("mp4", "Video")] {
        let manifest = Manifest::from_json(&manifest_json(
            &url,
            "2025-06-15 12:00:00 UTC",
            "Latitude, Longitude: 38.73, -77.28",
            media_type,
        ))?;

        let temp_dir = tempdir()?;
        let toolkit = FakeToolkit::new(token);
        let importer = Importer::new(temp_dir.path().to_path_buf(), &toolkit);
        importer.run(&manifest).await?;

        // round(-77.28 / 15) = -5, plus one hour of US summer time
        assert_eq!(
            toolkit.tag("CreateDate").as_deref(),
            Some("2025:06:15 08:00:00")
        );

        if token == "jpeg" {
            assert_eq!(
                toolkit.tag("DateTimeOriginal").as_deref(),
                Some("2025:06:15 08:00:00")
            );
            assert_eq!(toolkit.tag("GPSLatitudeRef").as_deref(), Some("N"));
            assert_eq!(toolkit.tag("GPSLongitudeRef").as_deref(), Some("W"));
        } else {
            assert_eq!(
                toolkit.tag("Keys:GPSCoordinates").as_deref(),
                Some("+38.730000-077.280000/")
            );
            assert_eq!(
                toolkit.tag("UserData:GPSCoordinates").as_deref(),
                Some("+38.730000-077.280000/")
            );
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_second_run_skips_finished_items() -> anyhow::Result<()> {
    init_logger();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/memory")
        .with_body("bytes")
        .expect(1)
        .create_async()
        .await;

    let manifest = Manifest::from_json(&manifest_json(
        &format!("{}/memory", server.url()),
        "2025-01-01 00:00:00 UTC",
        "Latitude, Longitude: 0.000000, 0.000000",
        "Image",
    ))?;

    let temp_dir = tempdir()?;
    let toolkit = FakeToolkit::new("png");

    let first = Importer::new(temp_dir.path().to_path_buf(), &toolkit)
        .run(&manifest)
        .await?;
    let second = Importer::new(temp_dir.path().to_path_buf(), &toolkit)
        .run(&manifest)
        .await?;
    mock.assert_async().await;

    assert_eq!(ImportSummary::from_results(&first).imported, 1);
    assert_eq!(ImportSummary::from_results(&second).skipped, 1);

    // The (0, 0) sentinel means no location, so the UTC time is kept and no GPS is written
    assert_eq!(
        toolkit.tag("DateTimeOriginal").as_deref(),
        Some("2025:01:01 00:00:00")
    );
    assert!(toolkit.tag("GPSLatitude").is_none());

    Ok(())
}
