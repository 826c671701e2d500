//! Resume document parsing: uploaded bytes → normalised text plus contact metadata.

pub mod docx;
pub mod handlers;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("file is {size_bytes} bytes; the limit is {limit_bytes} bytes")]
    TooLarge { size_bytes: usize, limit_bytes: usize },

    #[error("unsupported file type '{0}'. Supported: pdf, docx, txt")]
    UnsupportedFormat(String),

    #[error("no text could be extracted from the document")]
    Empty,

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("could not read DOCX: {0}")]
    Docx(String),

    #[error("text file is not valid UTF-8")]
    Encoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Format from a file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, DocumentError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Txt),
            "" => Err(DocumentError::UnsupportedFormat(file_name.to_string())),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResumeMetadata {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_of_experience: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedResume {
    pub file_name: String,
    pub format: DocumentFormat,
    pub text: String,
    pub char_count: usize,
    pub metadata: ResumeMetadata,
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern is valid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("phone pattern is valid")
});

static YEARS_OF_EXPERIENCE: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(\d+)\+?\s*years?\s+(?:of\s+)?experience")
            .expect("years-of-experience pattern is valid"),
        Regex::new(r"(?i)experience:\s*(\d+)\+?\s*years?")
            .expect("experience-years pattern is valid"),
    ]
});

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank line pattern is valid"));

/// CRLF → LF, runs of blank lines collapsed to one, outer whitespace trimmed.
pub fn normalize_text(text: &str) -> String {
    let unix = text.replace("\r\n", "\n").replace('\r', "\n");
    EXCESS_BLANK_LINES
        .replace_all(&unix, "\n\n")
        .trim()
        .to_string()
}

pub fn extract_metadata(text: &str) -> ResumeMetadata {
    ResumeMetadata {
        email: EMAIL.find(text).map(|m| m.as_str().to_string()),
        phone: PHONE.find(text).map(|m| m.as_str().to_string()),
        years_of_experience: YEARS_OF_EXPERIENCE
            .iter()
            .find_map(|pattern| pattern.captures(text)?.get(1)?.as_str().parse().ok()),
    }
}

/// Extracts and normalises the text of an uploaded resume.
pub fn parse_resume(
    file_name: &str,
    bytes: &[u8],
    limit_bytes: usize,
) -> Result<ParsedResume, DocumentError> {
    if bytes.len() > limit_bytes {
        return Err(DocumentError::TooLarge {
            size_bytes: bytes.len(),
            limit_bytes,
        });
    }

    let format = DocumentFormat::from_file_name(file_name)?;
    let raw = match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?,
        DocumentFormat::Docx => docx::extract_docx_text(bytes)?,
        DocumentFormat::Txt => decode_text(bytes)?,
    };

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(DocumentError::Empty);
    }
    debug!(file_name, chars = text.chars().count(), "Parsed resume document");

    Ok(ParsedResume {
        file_name: file_name.to_string(),
        format,
        char_count: text.chars().count(),
        metadata: extract_metadata(&text),
        text,
    })
}

/// UTF-8 with a BOM tolerated. Invalid sequences are replaced unless the
/// file is mostly undecodable, which usually means a binary upload.
fn decode_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let decoded = String::from_utf8_lossy(bytes);
    let replaced = decoded.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
    if replaced * 10 > decoded.chars().count() {
        return Err(DocumentError::Encoding);
    }
    Ok(decoded.into_owned())
}
