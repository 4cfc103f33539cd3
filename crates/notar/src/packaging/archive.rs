/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Zip extraction and repacking.
//!
//! Archives are handled entirely in memory as a sorted map from entry path
//! to contents. Directory entries are skipped.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archive contents keyed by entry path.
pub type ArchiveFiles = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to read archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads every file entry of a zip archive into memory.
///
/// # Errors
///
/// Returns `ArchiveError` if the bytes are not a readable zip archive.
pub fn extract_files(bytes: &[u8]) -> Result<ArchiveFiles, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = ArchiveFiles::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        files.insert(entry.name().to_string(), contents);
    }

    Ok(files)
}

/// Packs files into a deflate-compressed zip archive, in path order.
///
/// # Errors
///
/// Returns `ArchiveError` if an entry cannot be written.
pub fn pack_files(files: &ArchiveFiles) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, contents) in files {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(contents)?;
    }

    Ok(writer.finish()?.into_inner())
}
