//! Splitting raw image paths into the directory / filename pair the
//! navigator is keyed by.

/// A raw image path split into its directory and extension-less base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    /// Directory including its trailing `/` (empty for a bare file name).
    pub dir: String,
    /// Base name with the last extension removed.
    pub filename: String,
}

/// Normalize separators (backslashes and runs of slashes become one `/`)
/// and split off the directory and extension-less file name.
///
/// Returns `None` for blank input.
pub fn split_image_path(raw: &str) -> Option<ImagePath> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let normalized = normalize_separators(raw);
    let (dir, base) = match normalized.rfind('/') {
        Some(pos) => normalized.split_at(pos + 1),
        None => ("", normalized.as_str()),
    };
    if base.is_empty() {
        return None;
    }

    Some(ImagePath {
        dir: dir.to_string(),
        filename: file_stem(base).to_string(),
    })
}

/// Whether two directory strings name the same directory, ignoring
/// separator style and trailing separators.
pub fn same_directory(a: &str, b: &str) -> bool {
    let a = normalize_separators(a.trim());
    let b = normalize_separators(b.trim());
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

fn normalize_separators(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for ch in raw.chars() {
        if ch == '/' || ch == '\\' {
            if !last_was_sep {
                normalized.push('/');
            }
            last_was_sep = true;
        } else {
            normalized.push(ch);
            last_was_sep = false;
        }
    }
    normalized
}

/// Base name without its last extension. Dot-files keep their full name.
pub fn file_stem(base: &str) -> &str {
    match base.rfind('.') {
        Some(0) | None => base,
        Some(pos) => &base[..pos],
    }
}
