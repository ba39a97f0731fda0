/// Aligning annotation fragments to lyrics lines
///
/// Annotations arrive from the provider referencing a fragment of text, not
/// a position. This maps each annotation to a 1-based line number in the
/// cleaned lyrics with a three-tier strategy, first-match-wins in lyric
/// order: ties break to the earliest occurrence, not the best match.
use log::debug;

use crate::data::{Annotation, LineMatch, UNALIGNED_LINE};

/// Minimum text length for the substring tiers; very short fragments match
/// too many lines to be meaningful
const MIN_SUBSTRING_LEN: usize = 5;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Find the 0-based index of the lyrics line an annotation text belongs to.
///
/// Tiers, applied in order until one succeeds:
/// 1. Exact line equality (input is already lower-cased)
/// 2. Annotation text is a substring of a line (text longer than 5 chars)
/// 3. A line is a substring of the annotation text (line longer than 5 chars)
fn find_line(lines: &[String], text: &str) -> Option<usize> {
    if let Some(index) = lines.iter().position(|line| line == text) {
        return Some(index);
    }

    if char_len(text) > MIN_SUBSTRING_LEN {
        if let Some(index) = lines.iter().position(|line| line.contains(text)) {
            return Some(index);
        }
    }

    lines
        .iter()
        .position(|line| char_len(line) > MIN_SUBSTRING_LEN && text.contains(line.as_str()))
}

/// Align annotations to lyrics lines, filling in `line_number` and
/// `line_match` on every entry.
pub fn align_annotations(lyrics: &str, mut annotations: Vec<Annotation>) -> Vec<Annotation> {
    let lines: Vec<String> = lyrics
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect();

    for annotation in &mut annotations {
        // Prefer the structured range content over the fragment
        let text = annotation
            .range_content
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| annotation.fragment.as_deref().filter(|s| !s.trim().is_empty()));

        let text = match text {
            Some(text) => text.trim().to_lowercase(),
            None => {
                annotation.line_number = UNALIGNED_LINE;
                annotation.line_match = Some(LineMatch::NoText);
                continue;
            }
        };

        match find_line(&lines, &text) {
            Some(index) => {
                annotation.line_number = (index + 1) as i32;
                annotation.line_match = Some(LineMatch::Matched);
            }
            None => {
                debug!("No lyrics line found for annotation {}", annotation.id);
                annotation.line_number = UNALIGNED_LINE;
                annotation.line_match = Some(LineMatch::Failed);
            }
        }
    }

    annotations
}
