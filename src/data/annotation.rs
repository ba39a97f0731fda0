/// Annotation records and line-alignment outcomes
use serde::{Serialize, Deserialize};

/// How an annotation was (or wasn't) aligned to a lyrics line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMatch {
    /// One of the alignment tiers found a line
    Matched,
    /// No tier found a line
    Failed,
    /// The annotation carried no usable text to match on
    NoText,
}

/// Line number sentinel for annotations that have not been aligned
/// or could not be aligned.
pub const UNALIGNED_LINE: i32 = -1;

/// A crowd-sourced annotation attached to a fragment of a song's lyrics.
///
/// `line_number` and `line_match` are populated only by the annotation
/// aligner; before alignment `line_number` is the `-1` sentinel and
/// `line_match` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    /// Provider-assigned annotation id
    pub id: u64,

    /// Annotation body as HTML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,

    /// The literal lyrics span this annotation refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,

    /// Structured range content, preferred over the fragment when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub verified: bool,

    pub votes_total: i64,

    /// 1-based lyrics line this annotation belongs to, -1 if unaligned
    pub line_number: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_match: Option<LineMatch>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            id: 0,
            body_html: None,
            fragment: None,
            range_content: None,
            url: None,
            verified: false,
            votes_total: 0,
            line_number: UNALIGNED_LINE,
            line_match: None,
        }
    }
}
