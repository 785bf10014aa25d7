//! DOCX package I/O.
//!
//! A DOCX file is a zip of XML parts. The package is kept as an ordered list
//! of (entry name, bytes) so untouched parts are written back unchanged and in
//! their original order.

use crate::error::{LetterError, Result};
use std::io::{Read, Seek, Write};
use std::path::Path;

pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self { entries }
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        Ok(Self { entries })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Replace a part, or append it when the package does not have it yet.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// The main document XML.
    pub fn document_xml(&self) -> Result<String> {
        let data = self
            .part(DOCUMENT_PART)
            .ok_or_else(|| LetterError::InvalidTemplate {
                reason: format!("no {} part", DOCUMENT_PART),
            })?;
        String::from_utf8(data.to_vec()).map_err(|e| LetterError::InvalidTemplate {
            reason: format!("{} is not UTF-8: {}", DOCUMENT_PART, e),
        })
    }

    pub fn set_document_xml(&mut self, xml: String) {
        self.set_part(DOCUMENT_PART, xml.into_bytes());
    }

    /// Write the package as a zip. Media is stored, everything else deflated.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let deflated = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let stored = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, data) in &self.entries {
            let opts = if name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(name.as_str(), opts)?;
            zip.write_all(data)?;
        }
        zip.finish()?;
        Ok(())
    }

    /// Write to a temporary file next to `path` and move it into place.
    ///
    /// A failure at any point leaves nothing at `path`. An existing file at
    /// `path` is never replaced: the save fails with
    /// `io::ErrorKind::AlreadyExists` instead.
    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".carta-")
            .suffix(".docx.part")
            .tempfile_in(dir)?;
        self.write_to(&mut tmp)?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(path)
            .map_err(|e| LetterError::Io(e.error))?;
        Ok(())
    }
}
