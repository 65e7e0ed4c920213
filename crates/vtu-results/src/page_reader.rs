use std::path::Path;
use std::sync::LazyLock;

use encoding_rs::{Encoding, WINDOWS_1252};
use regex::Regex;
use scraper::Html;

use crate::error::ResultsError;
use crate::model::FetchedPage;

static PAGE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^page_(?P<usn>.+)\.html$").expect("hardcoded page file regex is valid")
});
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?(?P<label>[A-Za-z0-9_\-:.]+)"#)
        .expect("hardcoded meta charset regex is valid")
});

/// Portal messages that mean the body is the form page, not a result page.
const REJECTION_MARKERS: &[(&str, PageStatus)] = &[
    ("Invalid USN", PageStatus::InvalidUsn),
    ("Results are not yet available", PageStatus::NotAvailable),
    ("Please enter valid captcha", PageStatus::CaptchaRejected),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Results,
    Empty,
    InvalidUsn,
    NotAvailable,
    CaptchaRejected,
}

impl PageStatus {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Results => "result page",
            Self::Empty => "empty page body",
            Self::InvalidUsn => "portal reported an invalid USN",
            Self::NotAvailable => "portal reported results are not yet available",
            Self::CaptchaRejected => "portal rejected the captcha entry",
        }
    }
}

#[must_use]
pub fn screen_page(body: &str) -> PageStatus {
    if body.trim().is_empty() {
        return PageStatus::Empty;
    }
    REJECTION_MARKERS
        .iter()
        .find(|(marker, _)| body.contains(marker))
        .map_or(PageStatus::Results, |(_, status)| *status)
}

/// Parsed tree of one result page, alive for a single extraction.
pub struct RawDocument {
    html: Html,
}

impl RawDocument {
    #[must_use]
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    #[must_use]
    pub fn html(&self) -> &Html {
        &self.html
    }
}

/// Decodes saved page bytes: UTF-8 (or BOM), then the charset named by a
/// `<meta>` tag, then windows-1252.
#[must_use]
pub fn decode_page_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.decode(bytes).0.into_owned();
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let sniff = String::from_utf8_lossy(&bytes[..bytes.len().min(2048)]);
    let encoding = META_CHARSET_RE
        .captures(&sniff)
        .and_then(|capture| capture.name("label"))
        .and_then(|label| Encoding::for_label(label.as_str().as_bytes()))
        .unwrap_or(WINDOWS_1252);
    encoding.decode(bytes).0.into_owned()
}

#[must_use]
pub fn usn_from_file_name(file_name: &str) -> Option<String> {
    PAGE_FILE_RE
        .captures(file_name)
        .and_then(|capture| capture.name("usn"))
        .map(|usn| usn.as_str().trim().to_string())
        .filter(|usn| !usn.is_empty())
}

/// Reads every `page_<USN>.html` in `dir`, sorted by file name.
pub fn read_pages_dir(dir: &Path) -> Result<Vec<FetchedPage>, ResultsError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if let Some(usn) = usn_from_file_name(&file_name) {
            files.push((file_name, usn, entry.path()));
        }
    }
    files.sort_by(|left, right| left.0.cmp(&right.0));

    let mut pages = Vec::with_capacity(files.len());
    for (_, usn, path) in files {
        let bytes = std::fs::read(&path)?;
        pages.push(FetchedPage {
            usn,
            body: Some(decode_page_bytes(&bytes)),
        });
    }
    Ok(pages)
}
