//! Deterministic filename and folder-name rules.
//!
//! [`clean_asset_name`] is applied by every create and insert path before
//! storage is touched. Identical input always yields identical output and
//! cleaning an already-clean name is a no-op.

use unicode_normalization::UnicodeNormalization;

use assethub_core::config::StorageConfig;

/// Characters never allowed in a stored name.
pub const DISALLOWED_CHARS: &[char] = &[
    '\\', '/', '?', '%', '*', ':', '|', '"', '<', '>', '\'', '&', ';', '#', '$', '{', '}', '[',
    ']', '^', '~', '`', '!', '@', '=', '+',
];

/// Options controlling name cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingOptions {
    /// Replacement for whitespace runs.
    pub word_separator: String,
    /// Transliterate to ASCII first.
    pub ascii_only: bool,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            word_separator: "-".to_string(),
            ascii_only: false,
        }
    }
}

impl From<&StorageConfig> for NamingOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            word_separator: config.filename_word_separator.clone(),
            ascii_only: config.convert_filenames_to_ascii,
        }
    }
}

impl NamingOptions {
    fn separator(&self) -> &str {
        if self.word_separator.is_empty() {
            "-"
        } else {
            &self.word_separator
        }
    }
}

/// Clean a filename (`is_filename = true`) or a folder name.
///
/// Filenames are split at the last `.`; the extension is cleaned without
/// word separation and dropped if nothing survives.
pub fn clean_asset_name(name: &str, is_filename: bool, options: &NamingOptions) -> String {
    // Dropping an empty extension can expose a new last `.`, so settle on a fixed point.
    let mut current = clean_once(name, is_filename, options);
    for _ in 0..MAX_CLEAN_PASSES {
        let next = clean_once(&current, is_filename, options);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

const MAX_CLEAN_PASSES: usize = 8;

fn clean_once(name: &str, is_filename: bool, options: &NamingOptions) -> String {
    let (base, extension) = match (is_filename, name.rfind('.')) {
        (true, Some(dot)) => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    };

    let mut cleaned = clean_segment(base, options, true);
    if cleaned.is_empty() {
        cleaned = options.separator().to_string();
    }

    match extension.map(|ext| clean_segment(ext, options, false)) {
        Some(ext) if !ext.is_empty() => format!("{cleaned}.{ext}"),
        _ => cleaned,
    }
}

/// Candidate names tried when `filename` is taken: `base_1.ext`, `base_2.ext`, ...
pub fn numbered_filename(filename: &str, n: u32) -> String {
    match extension(filename) {
        Some(ext) => format!("{}_{n}.{ext}", stem(filename)),
        None => format!("{filename}_{n}"),
    }
}

/// The extension after the last `.`, if any.
pub fn extension(filename: &str) -> Option<&str> {
    filename
        .rfind('.')
        .map(|dot| &filename[dot + 1..])
        .filter(|ext| !ext.is_empty())
}

/// The filename without its extension.
pub fn stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot + 1 < filename.len() => &filename[..dot],
        _ => filename,
    }
}

fn clean_segment(raw: &str, options: &NamingOptions, separate_words: bool) -> String {
    let separator = options.separator();
    let source: String = if options.ascii_only {
        raw.nfkd().filter(char::is_ascii).collect()
    } else {
        raw.to_string()
    };

    let mut out = String::with_capacity(source.len());
    let mut pending_space = false;

    for c in source.chars() {
        if c.is_whitespace() {
            pending_space = separate_words;
            continue;
        }
        if c.is_control() || DISALLOWED_CHARS.contains(&c) {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push_str(separator);
        }
        pending_space = false;
        out.push(c);
    }

    out.trim_matches(|c: char| c.is_whitespace() || c == '.' || separator.contains(c))
        .to_string()
}
