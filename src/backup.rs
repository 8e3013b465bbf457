use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const SNAPSHOT_ENTRY: &str = "snapshot/planner.json";
pub const BUNDLE_FORMAT_V1: &str = "gradeplanner-bundle-v1";
pub const EXPORT_FILE_NAME: &str = "grade-planner-data.json";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub snapshot_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ImportedBundle {
    pub bundle_format_detected: String,
    pub snapshot_text: String,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory {}", parent.to_string_lossy())
            })?;
        }
    }
    Ok(())
}

/// Write a plain (pretty-printed) export document.
pub fn write_export_file(out_path: &Path, text: &str) -> anyhow::Result<()> {
    ensure_parent(out_path)?;
    std::fs::write(out_path, text)
        .with_context(|| format!("failed to write export {}", out_path.to_string_lossy()))
}

pub fn read_import_file(in_path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(in_path)
        .with_context(|| format!("failed to read import {}", in_path.to_string_lossy()))
}

pub fn export_planner_bundle(snapshot_text: &str, out_path: &Path) -> anyhow::Result<ExportSummary> {
    ensure_parent(out_path)?;
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let digest = sha256_hex(snapshot_text.as_bytes());
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "snapshotSha256": digest,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(SNAPSHOT_ENTRY, opts)
        .context("failed to start snapshot entry")?;
    zip.write_all(snapshot_text.as_bytes())
        .context("failed to write snapshot entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        snapshot_sha256: digest,
    })
}

/// Read a bundle and return its snapshot text after checking format and digest.
/// The caller still validates the snapshot itself.
pub fn import_planner_bundle(in_path: &Path) -> anyhow::Result<ImportedBundle> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a zip bundle: {}",
            in_path.to_string_lossy()
        ));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut snapshot_text = String::new();
    archive
        .by_name(SNAPSHOT_ENTRY)
        .context("bundle missing snapshot/planner.json")?
        .read_to_string(&mut snapshot_text)
        .context("failed to read snapshot entry")?;

    let expected = manifest
        .get("snapshotSha256")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let actual = sha256_hex(snapshot_text.as_bytes());
    if !expected.eq_ignore_ascii_case(&actual) {
        return Err(anyhow!("snapshot digest mismatch"));
    }

    Ok(ImportedBundle {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        snapshot_text,
    })
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
