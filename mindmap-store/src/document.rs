//! Document row type and embedding byte codec.

use serde::{Deserialize, Serialize};

/// Fixed embedding dimension for stored vectors.
pub const EMBEDDING_DIM: usize = 1536;

/// A single row of the `documents` table.
///
/// Only `module` is required: an "empty module" is represented by a row
/// whose `file_name`, `content`, `file_path`, and `embedding` are all NULL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Row id (assigned by the database).
    pub id: i64,
    /// Module this document belongs to.
    pub module: String,
    /// File name without extension, e.g. "3.1 Inbound Order Maintenance".
    pub file_name: Option<String>,
    /// Full markdown content.
    pub content: Option<String>,
    /// Embedding vector, when one has been computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Absolute path of the source file.
    pub file_path: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

/// Serialize an embedding to little-endian f32 bytes for BLOB storage.
pub fn vec_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Deserialize an embedding from little-endian f32 bytes.
///
/// Returns `None` when the byte length is not a multiple of 4.
pub fn bytes_to_vec(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }

    let mut values = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(chunk);
        values.push(f32::from_le_bytes(buf));
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_round_trip() {
        let embedding = vec![0.0f32, 1.5, -2.25, f32::MAX];
        let bytes = vec_to_bytes(&embedding);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes_to_vec(&bytes).unwrap(), embedding);
    }

    #[test]
    fn truncated_bytes_rejected() {
        assert!(bytes_to_vec(&[1, 2, 3]).is_none());
        assert_eq!(bytes_to_vec(&[]).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn document_serializes_without_embedding() {
        let doc = Document {
            id: 1,
            module: "1. Inventory".to_string(),
            file_name: Some("1.1 Item Master".to_string()),
            content: Some("# Overview".to_string()),
            embedding: None,
            file_path: None,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("embedding"));
    }
}
