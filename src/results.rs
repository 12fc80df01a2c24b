use serde::{Deserialize, Serialize};

/// A single match located within one physical line of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMatch {
    /// An owned copy of the line's text, without the trailing newline.
    /// Never aliases the archive's backing memory: the archive may be
    /// closed before the caller serializes results.
    pub preview: String,

    /// 1-based line number of the line containing the match's start byte.
    pub line_number: u32,

    /// `(offset, length)` pairs within the line, measured in Unicode code
    /// points from the start of the line.
    pub offset_and_lengths: Vec<[u32; 2]>,

    /// True if match locations were dropped for this file.
    pub limit_hit: bool,
}

/// All matches found in a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatch {
    /// The file's path within the archive.
    pub path: String,

    /// Line matches, possibly empty for a path-only match.
    pub line_matches: Vec<LineMatch>,

    /// True if some line matches were dropped.
    pub limit_hit: bool,
}

/// The complete result of one archive search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    /// Matching files, in no particular order.
    pub file_matches: Vec<FileMatch>,

    /// True if the file-match limit stopped the search early.
    pub limit_hit: bool,

    /// True if the search deadline expired before the archive was fully
    /// scanned. The matches gathered up to that point are still returned.
    pub deadline_hit: bool,

    /// Number of files whose contents were scanned.
    pub files_searched: u32,

    /// Number of files rejected by the path filters without being scanned.
    pub files_skipped: u32,
}
