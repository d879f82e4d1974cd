//! Asset source resolution.
//!
//! Turns a `.gltf` / `.glb` file (or an in-memory copy of one) into a parsed
//! [`Document`] plus the raw bytes of its buffers. External resources are
//! resolved relative to the document's directory; `data:` URIs are decoded
//! in place.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use log::{debug, warn};

use crate::assets::document::Document;
use crate::errors::{DecodeError, LoadError};

const GLB_MAGIC: &[u8; 4] = b"glTF";

/// A parsed document and where its external resources live.
#[derive(Debug, Clone)]
pub struct AssetSource {
    pub document: Document,
    /// Binary chunk of a GLB container
    blob: Option<Vec<u8>>,
    base_dir: PathBuf,
    path: Option<PathBuf>,
}

impl AssetSource {
    /// Reads and parses the document at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut source = Self::from_slice(&bytes, Some(base_dir))?;
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    /// Parses a document held in memory. `base_dir` resolves relative URIs
    /// and defaults to the working directory.
    pub fn from_slice(bytes: &[u8], base_dir: Option<&Path>) -> Result<Self, LoadError> {
        let (document, blob) = if bytes.starts_with(GLB_MAGIC) {
            let glb = gltf::Glb::from_slice(bytes)?;
            let document = Document::from_slice(&glb.json)?;
            (document, glb.bin.map(std::borrow::Cow::into_owned))
        } else {
            (Document::from_slice(bytes)?, None)
        };

        let major = document.asset.version.split('.').next().unwrap_or_default();
        if major != "2" {
            return Err(LoadError::UnsupportedVersion(document.asset.version.clone()));
        }
        for extension in &document.extensions_required {
            warn!("Required extension {extension} is not supported and will be ignored");
        }

        Ok(Self {
            document,
            blob,
            base_dir: base_dir.map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            path: None,
        })
    }

    /// File the document was read from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolves the bytes of every buffer, in document order.
    pub fn load_buffers(&self) -> Result<Vec<Vec<u8>>, LoadError> {
        let mut buffers = Vec::with_capacity(self.document.buffers.len());
        for (index, buffer) in self.document.buffers.iter().enumerate() {
            let data = match &buffer.uri {
                Some(uri) => self.read_uri(uri)?,
                None if index == 0 => self
                    .blob
                    .clone()
                    .ok_or(LoadError::MissingBinaryChunk(index))?,
                None => return Err(LoadError::MissingBinaryChunk(index)),
            };
            if data.len() < buffer.byte_length {
                debug!(
                    "Buffer {index} declares {} bytes but holds {}",
                    buffer.byte_length,
                    data.len()
                );
            }
            buffers.push(data);
        }
        Ok(buffers)
    }

    /// Encoded bytes of image `index`, from a URI or a buffer view.
    pub fn image_bytes(&self, index: usize, buffers: &[Vec<u8>]) -> Result<Vec<u8>, LoadError> {
        let images = &self.document.images;
        let image = images.get(index).ok_or(DecodeError::IndexOutOfRange {
            kind: "image",
            index,
            len: images.len(),
        })?;

        if let Some(uri) = &image.uri {
            return self.read_uri(uri);
        }
        let Some(view_index) = image.buffer_view else {
            return Err(DecodeError::MissingImageSource { image: index }.into());
        };

        let views = &self.document.buffer_views;
        let view = views.get(view_index).ok_or(DecodeError::IndexOutOfRange {
            kind: "buffer view",
            index: view_index,
            len: views.len(),
        })?;
        let buffer = buffers.get(view.buffer).ok_or(DecodeError::IndexOutOfRange {
            kind: "buffer",
            index: view.buffer,
            len: buffers.len(),
        })?;
        let end = view.byte_offset.checked_add(view.byte_length);
        end.and_then(|end| buffer.get(view.byte_offset..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                DecodeError::BufferViewOutOfBounds {
                    view: view_index,
                    buffer: view.buffer,
                    required: end.unwrap_or(usize::MAX),
                    available: buffer.len(),
                }
                .into()
            })
    }

    /// Reads a `data:` URI or a file relative to the document.
    pub fn read_uri(&self, uri: &str) -> Result<Vec<u8>, LoadError> {
        if let Some(rest) = uri.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        let path = self.base_dir.join(uri);
        fs::read(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Decodes the part of a data URI after `data:`.
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, LoadError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::DataUri("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(LoadError::DataUri(format!(
            "unsupported encoding in header {header:?}"
        )));
    }
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_payload_is_decoded() {
        let bytes = decode_data_uri("application/octet-stream;base64,AQID").unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn data_uri_without_base64_is_rejected() {
        assert!(matches!(
            decode_data_uri("text/plain,hello"),
            Err(LoadError::DataUri(_))
        ));
    }

    #[test]
    fn version_one_documents_are_rejected() {
        let err = AssetSource::from_slice(br#"{"asset":{"version":"1.0"}}"#, None).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedVersion(v) if v == "1.0"));
    }
}
