//! Recorridos completos a través del despachador público.

use bleach::scrubbers::verify_image_metadata_clean;
use bleach::{Dispatcher, FailureKind, FileKind, ScrubRequest, ToolConfig, TypeCache};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const EXIF_APP1: &[u8] = &[
    0xFF, 0xE1, 0x00, 0x22, b'E', b'x', b'i', b'f', 0x00, 0x00, 0x4D, 0x4D, 0x00, 0x2A, 0x00,
    0x00, 0x00, 0x08, 0x00, 0x01, 0x01, 0x0F, 0x00, 0x02, 0x00, 0x00, 0x00, 0x04, b'B', b'a',
    b'd', 0x00, 0x00, 0x00, 0x00, 0x00,
];

fn offline(dir: &Path) -> Dispatcher {
    Dispatcher::new(
        ToolConfig::default()
            .with_ffmpeg(dir.join("no-ffmpeg"))
            .with_exiftool(dir.join("no-exiftool")),
    )
}

fn write_photo(path: &Path) -> TestResult {
    let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 15) as u8, (y * 15) as u8, 64]));
    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;
    let mut bytes = jpeg[..2].to_vec();
    bytes.extend_from_slice(EXIF_APP1);
    bytes.extend_from_slice(&jpeg[2..]);
    fs::write(path, bytes)?;
    Ok(())
}

#[test]
fn photo_without_output_gets_scrubbed_sibling() -> TestResult {
    let dir = tempdir()?;
    let photo = dir.path().join("photo.jpg");
    write_photo(&photo)?;
    let original = fs::read(&photo)?;

    let mut cache = TypeCache::new();
    let result = offline(dir.path()).scrub(&mut cache, &ScrubRequest::new(&photo));

    assert!(result.success, "{}", result.message);
    assert_eq!(result.kind, Some(FileKind::Image));
    let output = dir.path().join("photo.scrubbed.jpg");
    assert_eq!(result.output.as_deref(), Some(output.as_path()));
    assert!(verify_image_metadata_clean(&output)?);
    assert_eq!(fs::read(&photo)?, original);
    Ok(())
}

#[test]
fn script_comments_are_removed_and_code_is_untouched() -> TestResult {
    let dir = tempdir()?;
    let script = dir.path().join("script.py");
    fs::write(&script, "# autor: ana\nimport sys\n\n    # nota privada\nprint(sys.argv)  # inline\n")?;

    let request = ScrubRequest::for_kind(FileKind::Text, &script).with_prefixes(["#"]);
    let mut cache = TypeCache::new();
    let result = offline(dir.path()).scrub(&mut cache, &request);

    assert!(result.success, "{}", result.message);
    assert_eq!(
        fs::read_to_string(dir.path().join("script.scrubbed.py"))?,
        "import sys\n\nprint(sys.argv)  # inline\n"
    );
    assert!(result.message.contains("2 líneas eliminadas"));
    Ok(())
}

#[test]
fn unknown_content_is_rejected_without_side_effects() -> TestResult {
    let dir = tempdir()?;
    let blob = dir.path().join("datos.bin");
    fs::write(&blob, [0u8, 159, 146, 150, 0, 1])?;

    let mut cache = TypeCache::new();
    let result = offline(dir.path()).scrub(&mut cache, &ScrubRequest::new(&blob).with_backup(true));

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::UnsupportedFormat));
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);

    let json = serde_json::to_value(&result)?;
    assert_eq!(json["failure"], "unsupported_format");
    assert_eq!(json["success"], false);
    Ok(())
}

#[test]
fn missing_ffmpeg_is_reported_before_any_write() -> TestResult {
    let dir = tempdir()?;
    let clip = dir.path().join("clip.mov");
    fs::write(&clip, b"contenido de video")?;

    let mut cache = TypeCache::new();
    let result = offline(dir.path()).scrub(
        &mut cache,
        &ScrubRequest::for_kind(FileKind::Video, &clip).with_backup(true),
    );

    assert_eq!(result.failure, Some(FailureKind::ExternalToolMissing));
    assert!(result.message.contains("ffmpeg"));
    assert_eq!(fs::read(&clip)?, b"contenido de video");
    assert!(!dir.path().join("clip.mov.backup").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn video_timeout_keeps_original_and_backup() -> TestResult {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    let dir = tempdir()?;
    let tools = dir.path().join("bin");
    fs::create_dir(&tools)?;
    let ffmpeg = tools.join("ffmpeg");
    {
        let mut file = fs::File::create(&ffmpeg)?;
        file.write_all(b"#!/bin/sh\nexec sleep 30\n")?;
        file.sync_all()?;
    }
    fs::set_permissions(&ffmpeg, fs::Permissions::from_mode(0o755))?;

    let clip = dir.path().join("clip.mp4");
    fs::write(&clip, b"video con metadata")?;

    let dispatcher = Dispatcher::new(
        ToolConfig::default()
            .with_ffmpeg(&ffmpeg)
            .with_timeout(Duration::from_millis(300)),
    );
    let mut cache = TypeCache::new();
    let result = dispatcher.scrub(&mut cache, &ScrubRequest::new(&clip).with_backup(true));

    assert_eq!(result.failure, Some(FailureKind::Timeout));
    assert_eq!(fs::read(&clip)?, b"video con metadata");
    assert_eq!(fs::read(dir.path().join("clip.mp4.backup"))?, b"video con metadata");
    assert_eq!(
        result.backup.map(|record| record.backup),
        Some(dir.path().join("clip.mp4.backup"))
    );
    // bin/, el original y el respaldo; ningún temporal.
    assert_eq!(fs::read_dir(dir.path())?.count(), 3);
    Ok(())
}
