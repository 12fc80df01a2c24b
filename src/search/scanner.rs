use memchr::{memchr, memchr_iter, memmem, memrchr};

use super::matcher::PatternMatcher;
use crate::errors::SearchResult;
use crate::results::{FileMatch, LineMatch};
use crate::store::{Archive, SrcFile};

/// Maximum length of a line in bytes. Lines larger than this are not
/// scanned for results (e.g. minified javascript files that are all on
/// one line).
pub const MAX_LINE_SIZE: usize = 500;

/// Limit on the number of matching files returned.
pub const MAX_FILE_MATCHES: usize = 1000;

/// Limit on the number of matches returned within one file.
pub const MAX_LINE_MATCHES: usize = 100;

/// Limit on the number of matches returned on one line.
pub const MAX_OFFSETS: usize = 10;

impl PatternMatcher {
    /// Scans one file and returns a [`LineMatch`] per matched line, plus a
    /// flag reporting whether matches were dropped to the line-match
    /// limit.
    ///
    /// Most files do not match, so the scan is staged to reject them as
    /// cheaply as possible: a substring probe for the literal prefilter,
    /// then a single whole-buffer regex probe, and only then match
    /// enumeration and line slicing. Reuses the case-folding scratch
    /// buffer between calls, growing it once to the archive's maximum
    /// file length.
    pub fn find(
        &mut self,
        archive: &Archive,
        file: &SrcFile,
    ) -> SearchResult<(Vec<LineMatch>, bool)> {
        let file_buf = archive.data_for(file);

        // file_buf keeps the original bytes for previews; match_buf is
        // what the regex runs over. Case-insensitive matching lowercases
        // into the scratch buffer rather than relying on the engine's
        // (?i), which is slow. compile already lowercased the pattern.
        // The lowercasing is ASCII-only on purpose: it trades correctness
        // in some non-ASCII locales for throughput.
        if self.ignore_case {
            if self.transform_buf.len() < archive.max_file_len() {
                self.transform_buf.resize(archive.max_file_len(), 0);
            }
            let dst = &mut self.transform_buf[..file_buf.len()];
            dst.copy_from_slice(file_buf);
            dst.make_ascii_lowercase();
        }
        let match_buf: &[u8] = if self.ignore_case {
            &self.transform_buf[..file_buf.len()]
        } else {
            file_buf
        };

        let Some(re) = self.re.as_ref() else {
            return Ok((Vec::new(), false));
        };

        // A missing literal implies no match, and the substring probe is
        // far cheaper than the regex engine.
        if !self.literal_substring.is_empty()
            && memmem::find(match_buf, &self.literal_substring).is_none()
        {
            return Ok((Vec::new(), false));
        }
        if !re.is_match(match_buf) {
            return Ok((Vec::new(), false));
        }

        let locs: Vec<(usize, usize)> = re
            .find_iter(match_buf)
            .take(MAX_FILE_MATCHES)
            .map(|m| (m.start(), m.end()))
            .collect();
        let line_limit_hit = locs.len() == MAX_OFFSETS;

        let mut matches = Vec::new();
        let mut last_line_number: u32 = 1;
        let mut last_match_index: usize = 0;

        for (start, end) in locs {
            let line_start = memrchr(b'\n', &match_buf[..start]).map_or(0, |i| i + 1);
            let line_end = match memchr(b'\n', &match_buf[end..]) {
                Some(i) => end + i,
                None => match_buf.len(),
            };

            // Line numbers are hydrated incrementally from the previous
            // match so the whole scan stays linear.
            let line_number = last_line_number
                + memchr_iter(b'\n', &match_buf[last_match_index..start]).count() as u32;
            last_line_number = line_number;
            last_match_index = line_start;

            let span = &match_buf[line_start..line_end];
            if memchr(b'\n', span).is_some() {
                // The match crosses lines: emit one LineMatch per physical
                // line it touches, capped at MAX_LINE_MATCHES.
                let pieces: Vec<&[u8]> = span.splitn(MAX_LINE_MATCHES, |&b| b == b'\n').collect();
                let mut piece_start = line_start;
                for (i, piece) in pieces.iter().enumerate() {
                    let piece_end = piece_start + piece.len();
                    let (offset, length) = if i == 0 {
                        // From the match start to the end of its line.
                        (
                            rune_count(&match_buf[line_start..start]),
                            rune_count(&match_buf[start..piece_end]),
                        )
                    } else if i == pieces.len() - 1 {
                        // From the start of the final line to the match end.
                        let start_of_line = memrchr(b'\n', &match_buf[..end]).map_or(0, |j| j + 1);
                        (0, rune_count(&match_buf[start_of_line..end]))
                    } else {
                        (0, rune_count(piece))
                    };
                    matches.push(LineMatch {
                        // An owned copy of the original-case bytes: the
                        // archive may be closed before results are
                        // serialized, so previews must not borrow from it.
                        preview: String::from_utf8_lossy(&file_buf[piece_start..piece_end])
                            .into_owned(),
                        line_number: line_number + i as u32,
                        offset_and_lengths: vec![[offset as u32, length as u32]],
                        limit_hit: line_limit_hit,
                    });
                    piece_start = piece_end + 1;
                }
            } else {
                let offset = rune_count(&match_buf[line_start..start]);
                let length = rune_count(&match_buf[start..end]);
                matches.push(LineMatch {
                    preview: String::from_utf8_lossy(&file_buf[line_start..line_end]).into_owned(),
                    line_number,
                    offset_and_lengths: vec![[offset as u32, length as u32]],
                    limit_hit: line_limit_hit,
                });
            }
        }

        let limit_hit = matches.len() == MAX_LINE_MATCHES;
        Ok((matches, limit_hit))
    }

    /// Runs [`PatternMatcher::find`] and wraps the result in a
    /// [`FileMatch`] for the file.
    pub fn find_file(&mut self, archive: &Archive, file: &SrcFile) -> SearchResult<FileMatch> {
        let (line_matches, limit_hit) = self.find(archive, file)?;
        Ok(FileMatch {
            path: file.name.clone(),
            line_matches,
            limit_hit,
        })
    }
}

/// Number of Unicode code points in `buf`: continuation bytes are not
/// counted, and each byte of an invalid sequence counts as one.
fn rune_count(buf: &[u8]) -> usize {
    buf.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}
