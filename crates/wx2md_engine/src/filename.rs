use rand::distributions::Alphanumeric;
use rand::Rng;

const DEFAULT_EXTENSION: &str = "jpg";
const RANDOM_SUFFIX_LEN: usize = 6;
const MAX_TITLE_LEN: usize = 80;

/// Generates image filenames for one pipeline run.
///
/// Names look like `image_{run_millis}_{index:03}_{random}.{ext}`. The worklist
/// index keeps names pairwise distinct within a run; the timestamp and random
/// suffix keep runs apart when several articles share an `images/` directory.
#[derive(Debug, Clone)]
pub struct ImageNamer {
    run_millis: i64,
}

impl ImageNamer {
    pub fn new() -> Self {
        Self::with_timestamp(chrono::Utc::now().timestamp_millis())
    }

    pub fn with_timestamp(run_millis: i64) -> Self {
        Self { run_millis }
    }

    pub fn name(&self, index: usize, extension: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!(
            "image_{}_{index:03}_{suffix}.{extension}",
            self.run_millis
        )
    }
}

impl Default for ImageNamer {
    fn default() -> Self {
        Self::new()
    }
}

/// File extension derived from a MIME type's subtype (`image/svg+xml` -> `svg`).
pub fn extension_for_mime(mime_type: &str) -> String {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    let subtype = essence
        .split_once('/')
        .map(|(_, sub)| sub.split('+').next().unwrap_or_default())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        DEFAULT_EXTENSION.to_string()
    } else {
        subtype
    }
}

/// Windows-safe base name for an article title, `fallback` when nothing usable remains.
pub fn sanitize_title(input: &str, fallback: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let truncated: String = compacted.chars().take(MAX_TITLE_LEN).collect();
    let mut final_name = truncated.trim_end_matches(&['_', ' ', '.'][..]).to_string();
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
