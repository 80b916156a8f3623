use std::cmp::Ordering;

use crate::SelectionError;

/// One entry of a raw file selection, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFileHandle {
    pub name: String,
    /// Declared media type, e.g. `video/mp4`. `None` or empty means unknown.
    pub media_type: Option<String>,
}

impl RawFileHandle {
    pub fn new(name: impl Into<String>, media_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub order: usize,
    pub media_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameOrder {
    /// Plain case-sensitive string comparison.
    #[default]
    Lexicographic,
    /// Digit runs compare by numeric value, so `clip2` sorts before `clip10`.
    Natural,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedFileType { media_type: String },
    IndeterminateType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the raw selection.
    pub index: usize,
    pub name: String,
    pub reason: RejectReason,
}

/// Validated selection: accepted descriptors in merge order plus what was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    descriptors: Vec<FileDescriptor>,
    rejected: Vec<RejectedEntry>,
}

impl Selection {
    pub fn descriptors(&self) -> &[FileDescriptor] {
        &self.descriptors
    }

    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }

    pub fn names(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.name.clone()).collect()
    }

    pub fn into_descriptors(self) -> Vec<FileDescriptor> {
        self.descriptors
    }
}

/// Validates a raw selection with lexicographic name ordering.
pub fn validate(raw: &[RawFileHandle]) -> Result<Selection, SelectionError> {
    validate_with(raw, NameOrder::Lexicographic)
}

/// Keeps video entries only and orders them by name, then by enumeration index.
pub fn validate_with(raw: &[RawFileHandle], order: NameOrder) -> Result<Selection, SelectionError> {
    let mut accepted: Vec<(usize, &RawFileHandle, String)> = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (index, handle) in raw.iter().enumerate() {
        match classify(handle.media_type.as_deref()) {
            Ok(media_type) => accepted.push((index, handle, media_type)),
            Err(reason) => rejected.push(RejectedEntry {
                index,
                name: handle.name.clone(),
                reason,
            }),
        }
    }

    if accepted.is_empty() {
        return Err(SelectionError::EmptySelection { rejected });
    }

    accepted.sort_by(|(ia, a, _), (ib, b, _)| {
        compare_names(&a.name, &b.name, order).then(ia.cmp(ib))
    });

    let descriptors = accepted
        .into_iter()
        .enumerate()
        .map(|(order, (_, handle, media_type))| FileDescriptor {
            name: handle.name.clone(),
            order,
            media_type,
        })
        .collect();

    Ok(Selection {
        descriptors,
        rejected,
    })
}

/// True when a declared media type names a video stream (`video/<subtype>`).
pub fn is_video_media_type(media_type: &str) -> bool {
    classify(Some(media_type)).is_ok()
}

fn classify(media_type: Option<&str>) -> Result<String, RejectReason> {
    let declared = match media_type.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(RejectReason::IndeterminateType),
    };
    let essence = declared.split(';').next().unwrap_or(declared).trim();
    match essence.split_once('/') {
        Some((top, sub)) if top.eq_ignore_ascii_case("video") && !sub.trim().is_empty() => {
            Ok(declared.to_string())
        }
        Some(_) => Err(RejectReason::UnsupportedFileType {
            media_type: declared.to_string(),
        }),
        None => Err(RejectReason::IndeterminateType),
    }
}

const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("flv", "video/x-flv"),
    ("wmv", "video/x-ms-wmv"),
];

/// Media type a file picker would declare for `name`, judged by extension.
///
/// Names with more than one dot are left undeclared.
pub fn media_type_for_filename(name: &str) -> Option<&'static str> {
    if name.matches('.').count() != 1 {
        return None;
    }
    let (_, ext) = name.rsplit_once('.')?;
    VIDEO_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, media_type)| *media_type)
}

pub fn compare_names(a: &str, b: &str, order: NameOrder) -> Ordering {
    match order {
        NameOrder::Lexicographic => a.cmp(b),
        NameOrder::Natural => natural_cmp(a, b).then_with(|| a.cmp(b)),
    }
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => cmp_numeric(x, y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_digits(chunk: &str) -> bool {
    chunk.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

// Compares digit runs without parsing, so arbitrarily long runs never overflow.
fn cmp_numeric(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}

/// Splits a name into alternating digit and non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.bytes().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .bytes()
            .position(|b| b.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}
