use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AssemblyError, Result};

static LEADING_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+").unwrap());

/// A local image ready for upload: where it lives, the sanitized stem used as
/// its media title, and its alt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedImage {
    pub path: PathBuf,
    pub stem: String,
    pub alt_text: String,
}

/// Leading digit run with zeros stripped, so any length compares as a number
/// by (length, text).
fn leading_number(name: &str) -> Option<&str> {
    LEADING_DIGITS_RE
        .find(name)
        .map(|m| m.as_str().trim_start_matches('0'))
}

/// Numbered names first by their leading number, then unnumbered names.
/// Ties break on the lowercased name.
pub fn compare_image_names(a: &str, b: &str) -> Ordering {
    let key = |name: &str| {
        let number = leading_number(name).map_or((1, 0, String::new()), |d| (0, d.len(), d.to_string()));
        (number, name.to_lowercase())
    };
    key(a).cmp(&key(b))
}

pub fn sort_image_names<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| compare_image_names(a.as_ref(), b.as_ref()));
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Replace typographic punctuation that tends to sneak into file names with
/// plain ASCII.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
    }
    out
}

/// `"{title} - {stem}"`, or just the stem without a title.
pub fn alt_text(post_title: Option<&str>, stem: &str) -> String {
    match post_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("{title} - {stem}"),
        None => stem.to_string(),
    }
}

/// Alt text must survive a Latin-1 round trip on the media API.
pub fn check_latin1(alt_text: &str) -> Result<()> {
    match alt_text.chars().position(|c| u32::from(c) > 0xFF) {
        Some(position) => Err(AssemblyError::AltTextEncoding {
            alt_text: alt_text.to_string(),
            position,
        }),
        None => Ok(()),
    }
}

/// Sort by file name and derive stems and alt texts.
pub fn collect_images(paths: &[PathBuf], post_title: Option<&str>) -> Result<Vec<CollectedImage>> {
    let mut paths = paths.to_vec();
    paths.sort_by(|a, b| compare_image_names(&file_name(a), &file_name(b)));

    paths
        .into_iter()
        .map(|path| {
            let name = sanitize_file_name(&file_name(&path));
            let stem = Path::new(&name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(name);
            let alt_text = alt_text(post_title, &stem);
            check_latin1(&alt_text)?;
            Ok(CollectedImage {
                path,
                stem,
                alt_text,
            })
        })
        .collect()
}
