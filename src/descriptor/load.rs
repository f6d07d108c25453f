use super::proto::{CodeGeneratorRequest, FileDescriptor, FileDescriptorSet};
use crate::error::{Result, ScaffoldError};
use prost::Message;
use std::path::Path;
use tracing::warn;

/// One requested file and its decoded descriptor (or the reason it has none)
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub name: String,
    descriptor: std::result::Result<FileDescriptor, String>,
}

impl BatchEntry {
    pub fn descriptor(&self) -> Result<&FileDescriptor> {
        self.descriptor
            .as_ref()
            .map_err(|message| ScaffoldError::descriptor(&self.name, message.clone()))
    }
}

/// The files of one invocation, each decoded on its own
///
/// Decoding per file is what lets a batch continue past a malformed entry:
/// the broken file turns into an error entry and its neighbours still decode.
#[derive(Debug, Clone, Default)]
pub struct DescriptorBatch {
    entries: Vec<BatchEntry>,
}

fn decode_all(raw_files: &[Vec<u8>]) -> (Vec<FileDescriptor>, Vec<String>) {
    let mut decoded = Vec::new();
    let mut errors = Vec::new();
    for (index, raw) in raw_files.iter().enumerate() {
        match FileDescriptor::decode(raw.as_slice()) {
            Ok(file) => decoded.push(file),
            Err(e) => {
                warn!(index, error = %e, "failed to decode file descriptor");
                errors.push(format!("proto_file #{index}: {e}"));
            }
        }
    }
    (decoded, errors)
}

impl DescriptorBatch {
    /// Pair each requested file name with its descriptor
    pub fn for_requested(requested: &[String], raw_files: &[Vec<u8>]) -> Self {
        let (decoded, errors) = decode_all(raw_files);
        let entries = requested
            .iter()
            .map(|name| {
                let descriptor = decoded
                    .iter()
                    .find(|f| f.name.as_deref() == Some(name.as_str()))
                    .cloned()
                    .ok_or_else(|| {
                        if errors.is_empty() {
                            "descriptor missing from request".to_string()
                        } else {
                            format!("descriptor missing or malformed ({})", errors.join("; "))
                        }
                    });
                BatchEntry {
                    name: name.clone(),
                    descriptor,
                }
            })
            .collect();
        DescriptorBatch { entries }
    }

    /// Every raw file becomes an entry, in order
    pub fn all(raw_files: &[Vec<u8>]) -> Self {
        let entries = raw_files
            .iter()
            .enumerate()
            .map(|(index, raw)| match FileDescriptor::decode(raw.as_slice()) {
                Ok(file) => BatchEntry {
                    name: file
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("proto_file #{index}")),
                    descriptor: Ok(file),
                },
                Err(e) => BatchEntry {
                    name: format!("proto_file #{index}"),
                    descriptor: Err(e.to_string()),
                },
            })
            .collect();
        DescriptorBatch { entries }
    }

    pub fn from_request(request: &CodeGeneratorRequest) -> Self {
        Self::for_requested(&request.file_to_generate, &request.proto_file)
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode a plugin request read from stdin
pub fn decode_request(bytes: &[u8]) -> Result<CodeGeneratorRequest> {
    CodeGeneratorRequest::decode(bytes)
        .map_err(|e| ScaffoldError::descriptor("<code generator request>", e.to_string()))
}

/// Serialize a plugin response for stdout
pub fn encode_response(response: &prost_types::compiler::CodeGeneratorResponse) -> Vec<u8> {
    response.encode_to_vec()
}

/// Load a `FileDescriptorSet` written by `protoc --descriptor_set_out`
///
/// With an empty `only` list every file in the set is generated; otherwise
/// only the named files, in the order given.
pub fn load_descriptor_set(path: &Path, only: &[String]) -> Result<DescriptorBatch> {
    let bytes = std::fs::read(path).map_err(|e| ScaffoldError::io(path, e))?;
    let set = FileDescriptorSet::decode(bytes.as_slice())
        .map_err(|e| ScaffoldError::descriptor(path.display().to_string(), e.to_string()))?;
    if only.is_empty() {
        Ok(DescriptorBatch::all(&set.file))
    } else {
        Ok(DescriptorBatch::for_requested(only, &set.file))
    }
}
