//! Zip-container formats: docx documents and zip archives.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use zip::ZipArchive;

use super::ExtractFailure;
use crate::utils::{file_extension, sanitize_filename};

/// A member written out of an archive for extraction.
#[derive(Debug)]
pub struct ArchiveMember {
    /// Path of the member inside the archive.
    pub name: String,
    /// Where it was unpacked.
    pub path: PathBuf,
}

/// Bounds on what an archive may expand to.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveLimits {
    /// Members written at most.
    pub max_entries: usize,
    /// Decompressed bytes allowed for one member.
    pub max_member_bytes: u64,
    /// Decompressed bytes allowed across all written members.
    pub max_total_bytes: u64,
}

/// Copy at most `limit` bytes from `reader`.
///
/// Returns `None` when the reader holds more than `limit` bytes. What was
/// copied before the limit was hit stays in `out`.
fn copy_bounded(
    reader: &mut impl Read,
    out: &mut impl Write,
    limit: u64,
) -> std::io::Result<Option<u64>> {
    let copied = std::io::copy(&mut reader.take(limit.saturating_add(1)), out)?;
    Ok((copied <= limit).then_some(copied))
}

/// Any XML tag.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Read the body text of a docx file.
///
/// `max_bytes` bounds the decompressed size of the document body.
pub fn docx_text(path: &Path, max_bytes: u64) -> Result<String, ExtractFailure> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut body = archive.by_name("word/document.xml").map_err(|_| {
        ExtractFailure::ExtractionFailed("docx has no word/document.xml".to_string())
    })?;

    let mut xml = Vec::new();
    if copy_bounded(&mut body, &mut xml, max_bytes)?.is_none() {
        return Err(ExtractFailure::ExtractionFailed(format!(
            "docx body is larger than {} bytes",
            max_bytes
        )));
    }

    Ok(xml_to_text(&String::from_utf8_lossy(&xml)))
}

/// Strip WordprocessingML markup, keeping paragraph and line breaks.
fn xml_to_text(xml: &str) -> String {
    let with_breaks = xml
        .replace("</w:p>", "\n")
        .replace("<w:br/>", "\n")
        .replace("<w:tab/>", "\t");
    let stripped = TAG_PATTERN.replace_all(&with_breaks, "");

    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Unpack supported archive members into `dest`.
///
/// Directories, members with unsafe paths and members `accept` rejects are
/// skipped. At most `limits.max_entries` files are written; a member or
/// archive that decompresses past its byte limit fails the whole unpack.
pub fn unpack_archive(
    path: &Path,
    dest: &Path,
    limits: ArchiveLimits,
    accept: impl Fn(&str) -> bool,
) -> Result<Vec<ArchiveMember>, ExtractFailure> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut members = Vec::new();
    let mut total: u64 = 0;

    for index in 0..archive.len() {
        if members.len() >= limits.max_entries {
            tracing::warn!(
                "Archive {} has more than {} members, ignoring the rest",
                path.display(),
                limits.max_entries
            );
            break;
        }

        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let Some(inner) = entry.enclosed_name() else {
            continue;
        };
        let name = inner.to_string_lossy().replace('\\', "/");
        let accepted = file_extension(&name)
            .map(|ext| accept(&ext))
            .unwrap_or(false);
        if !accepted {
            continue;
        }

        // Flatten into dest; the index keeps same-named members apart.
        let flat = format!("{}-{}", index, sanitize_filename(&name));
        let out_path = dest.join(flat);

        let remaining = limits.max_total_bytes.saturating_sub(total);
        let cap = limits.max_member_bytes.min(remaining);
        let oversized = || {
            let message = if cap < limits.max_member_bytes {
                format!(
                    "archive expands past {} bytes at member {}",
                    limits.max_total_bytes, name
                )
            } else {
                format!("archive member {} is larger than {} bytes", name, cap)
            };
            ExtractFailure::ExtractionFailed(message)
        };

        // The declared size can lie, so the copy below is bounded as well.
        if entry.size() > cap {
            return Err(oversized());
        }
        let mut out = File::create(&out_path)?;
        let Some(written) = copy_bounded(&mut entry, &mut out, cap)? else {
            drop(out);
            let _ = std::fs::remove_file(&out_path);
            return Err(oversized());
        };
        total += written;

        members.push(ArchiveMember {
            name,
            path: out_path,
        });
    }

    Ok(members)
}
