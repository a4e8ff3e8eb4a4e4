// Best-effort recovery of story fields from a model reply that failed
// strict JSON parsing.

/// Fields salvaged line-by-line from unparsable model output. A field stays
/// `None` when no line carried it; the caller supplies placeholders.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartialStory {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Scan the raw reply for lines that look like `"title": ...` or
/// `content: ...` and extract the text after the first colon, trimmed of
/// whitespace and surrounding quotes/commas. Later matches overwrite
/// earlier ones.
pub fn recover_story(raw: &str) -> PartialStory {
    let mut partial = PartialStory::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if has_marker(line, "title") {
            if let Some(value) = value_after_colon(line) {
                partial.title = Some(value);
            }
        } else if has_marker(line, "content") {
            if let Some(value) = value_after_colon(line) {
                partial.content = Some(value);
            }
        }
    }

    partial
}

/// A line carries a field when it starts with the bare key or the key in
/// double quotes.
fn has_marker(line: &str, key: &str) -> bool {
    line.starts_with(key) || (line.starts_with('"') && line[1..].starts_with(key))
}

fn value_after_colon(line: &str) -> Option<String> {
    let (_, rest) = line.split_once(':')?;
    let value = rest.trim().trim_matches(['"', ',']).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
