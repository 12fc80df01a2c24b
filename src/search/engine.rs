use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, debug_span};

use super::context::SearchContext;
use super::matcher::PatternMatcher;
use super::scanner::MAX_FILE_MATCHES;
use crate::errors::{SearchError, SearchResult};
use crate::protocol::PatternInfo;
use crate::results::{FileMatch, SearchOutput};
use crate::store::Archive;

/// Number of concurrent scanner workers per search.
pub const NUM_WORKERS: usize = 8;

/// Compiles the matching program for `p` and searches `archive` with it.
pub fn search(
    ctx: &SearchContext,
    archive: &Archive,
    p: &PatternInfo,
) -> SearchResult<SearchOutput> {
    let matcher = PatternMatcher::compile(p)?;
    concurrent_search(ctx, &matcher, archive, p)
}

/// Matches appended by workers, with the limit flag they guard together.
struct SharedMatches {
    matches: Vec<FileMatch>,
    limit_hit: bool,
}

/// Searches every file in `archive` with `matcher`, distributing files
/// across a fixed worker pool. Stops early when the file-match limit is
/// reached, the context is cancelled, or the deadline approaches; partial
/// results gathered before a deadline are returned with
/// [`SearchOutput::deadline_hit`] set.
///
/// Result order is scheduling-dependent; callers must not rely on it.
pub fn concurrent_search(
    ctx: &SearchContext,
    matcher: &PatternMatcher,
    archive: &Archive,
    p: &PatternInfo,
) -> SearchResult<SearchOutput> {
    let span = debug_span!(
        "concurrent_search",
        pattern = %p.pattern,
        path_patterns = %matcher.match_path(),
    );
    let _enter = span.enter();

    let mut pattern_matches_content = p.pattern_matches_content;
    let pattern_matches_paths = p.pattern_matches_paths;
    if !pattern_matches_content && !pattern_matches_paths {
        pattern_matches_content = true;
    }

    let mut file_match_limit = p.file_match_limit;
    if file_match_limit == 0 || file_match_limit > MAX_FILE_MATCHES {
        file_match_limit = MAX_FILE_MATCHES;
    }

    // Fast path for matching only on file paths. An absent pattern matches
    // every file's content, so it is effectively path-only as well.
    if pattern_matches_paths && (!pattern_matches_content || !matcher.has_pattern()) {
        let mut output = SearchOutput::default();
        for file in archive.files() {
            if !matcher.match_path().match_path(&file.name) || !matcher.match_string(&file.name) {
                continue;
            }
            if output.file_matches.len() < file_match_limit {
                output.file_matches.push(FileMatch {
                    path: file.name.clone(),
                    line_matches: Vec::new(),
                    limit_hit: false,
                });
            } else {
                output.limit_hit = true;
                break;
            }
        }
        return Ok(output);
    }

    // The local context stops the workers when the file-match limit is
    // reached. With a caller deadline, aim to finish slightly early so the
    // partial results still make it out before the caller gives up.
    let local = match ctx.deadline() {
        Some(deadline) => {
            let timeout = deadline.saturating_duration_since(Instant::now()).mul_f64(0.9);
            debug!(timeout_ms = timeout.as_millis() as u64, "concurrent search timeout");
            SearchContext::with_timeout(timeout)
        }
        None => SearchContext::new(),
    };

    let queue = Mutex::new(archive.files().iter());
    let shared = Mutex::new(SharedMatches {
        matches: Vec::new(),
        limit_hit: false,
    });
    let first_err: Mutex<Option<SearchError>> = Mutex::new(None);
    let files_skipped = AtomicU32::new(0);
    let files_searched = AtomicU32::new(0);

    // Workers pop from the queue and append to the shared matches until
    // the queue drains or a context is done.
    rayon::scope(|s| {
        for _ in 0..NUM_WORKERS {
            s.spawn(|_| {
                let mut rg = matcher.clone();
                loop {
                    if ctx.is_done() || local.is_done() {
                        return;
                    }

                    let Some(file) = queue.lock().next() else {
                        return;
                    };

                    if !rg.match_path().match_path(&file.name) {
                        files_skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    files_searched.fetch_add(1, Ordering::Relaxed);

                    let fm = match rg.find_file(archive, file) {
                        Ok(fm) => fm,
                        Err(err) => {
                            // First error wins; the rest would be noise
                            // under cancellation.
                            let mut slot = first_err.lock();
                            if slot.is_none() {
                                *slot = Some(err);
                                local.cancel();
                            }
                            return;
                        }
                    };

                    let mut matched = !fm.line_matches.is_empty();
                    if !matched && pattern_matches_paths {
                        matched = rg.match_string(&file.name);
                    }
                    if matched {
                        let mut shared = shared.lock();
                        if shared.matches.len() < file_match_limit {
                            shared.matches.push(fm);
                        } else {
                            shared.limit_hit = true;
                            local.cancel();
                        }
                    }
                }
            });
        }
    });

    if let Some(err) = first_err.into_inner() {
        return Err(err);
    }

    let SharedMatches { matches, limit_hit } = shared.into_inner();
    let files_skipped = files_skipped.into_inner();
    let files_searched = files_searched.into_inner();
    debug!(files_skipped, files_searched, "concurrent search finished");

    Ok(SearchOutput {
        file_matches: matches,
        limit_hit,
        // Only report the deadline when it, and not the limit, stopped the
        // scan.
        deadline_hit: !local.cancelled() && local.deadline_exceeded(),
        files_searched,
        files_skipped,
    })
}
