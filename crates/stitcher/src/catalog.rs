use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use crate::error::Result;
use crate::stitch::StitchResult;

const HASH_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Generated,
    Uploaded,
    Stitched,
}

/// What the asset catalog records for a finished stitch. `file_hash` is the
/// deduplication key; two stitches producing identical bytes share it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StitchedAsset {
    pub id: Uuid,
    pub name: String,
    pub file_path: String,
    pub file_hash: String,
    pub size_bytes: u64,
    pub duration_seconds: f64,
    pub resolution: String,
    pub aspect_ratio: Option<String>,
    pub codec: String,
    pub source_type: SourceType,
    pub input_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StitchedAsset {
    pub async fn from_result(result: &StitchResult, input_ids: Vec<String>) -> Result<Self> {
        let file_hash = content_hash(&result.output_path).await?;
        let aspect_ratio = result
            .resolution
            .parse::<engine::Resolution>()
            .ok()
            .map(|r| r.aspect_ratio());

        Ok(StitchedAsset {
            id: Uuid::new_v4(),
            name: result.filename.clone(),
            file_path: result.output_path.to_string_lossy().to_string(),
            file_hash,
            size_bytes: result.size,
            duration_seconds: result.duration,
            resolution: result.resolution.clone(),
            aspect_ratio,
            codec: result.codec.clone(),
            source_type: SourceType::Stitched,
            input_ids,
            created_at: Utc::now(),
        })
    }
}

/// Lowercase hex SHA-256 of the file's bytes, read in fixed-size chunks.
pub async fn content_hash(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; HASH_CHUNK];
    loop {
        match file.read(&mut chunk).await? {
            0 => break,
            n => hasher.update(&chunk[..n]),
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_stitched_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stitched_abcd1234.mp4");
        std::fs::write(&path, b"abc").unwrap();

        let result = StitchResult {
            output_path: path.clone(),
            filename: "stitched_abcd1234.mp4".into(),
            duration: 16.0,
            size: 3,
            resolution: "1920x1080".into(),
            codec: "h264".into(),
            input_count: 2,
        };
        let asset = StitchedAsset::from_result(&result, vec!["v1".into(), "v2".into()])
            .await
            .unwrap();

        assert_eq!(asset.source_type, SourceType::Stitched);
        assert_eq!(asset.aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(asset.input_ids, vec!["v1", "v2"]);
        assert_eq!(
            asset.file_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["source_type"], "stitched");
    }

    #[tokio::test]
    async fn hash_spans_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.bin");
        let bytes = vec![7u8; HASH_CHUNK * 2 + 11];
        std::fs::write(&path, &bytes).unwrap();

        let expected = hex::encode(Sha256::digest(&bytes));
        assert_eq!(content_hash(&path).await.unwrap(), expected);

        let empty = dir.path().join("empty.bin");
        std::fs::write(&empty, b"").unwrap();
        assert_eq!(
            content_hash(&empty).await.unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn missing_output_is_an_error() {
        let result = StitchResult {
            output_path: "/no/such/file.mp4".into(),
            filename: "file.mp4".into(),
            duration: 1.0,
            size: 1,
            resolution: "640x480".into(),
            codec: "h264".into(),
            input_count: 1,
        };
        assert!(StitchedAsset::from_result(&result, vec![]).await.is_err());
    }
}
