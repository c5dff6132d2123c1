// This file is part of cfgscan, a libconfig-family lexical scanner.
// Copyright 2022 Jeffrey Sharp
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
// cfgscan is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// cfgscan is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with cfgscan.  If not, see <http://www.gnu.org/licenses/>.

//! The include stack: a single owned stack of suspended scan frames, plus
//! the path set used for include-cycle detection.

mod dir;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dir::DirIterator;

use crate::error::IncludeError;

/// A byte source over one file's fully-buffered content.
///
/// The non-goal of streaming over non-seekable transports means the whole
/// file is read up front; there is no benefit to a `BufReader` here since
/// the scanner re-reads single bytes at a time and needs to look ahead
/// within a lexeme without a separate pushback buffer.
#[derive(Debug)]
pub(crate) struct ByteSource {
    bytes: Vec<u8>,
    pos: usize,
}

impl ByteSource {
    fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Advances past a known-present multi-byte literal, e.g. a directive
    /// keyword already confirmed present by `peek_at`.
    pub fn advance_by(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.bytes.len());
    }

    #[cfg(test)]
    pub(crate) fn for_test(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// A suspended-or-active scanning state over one file.
#[derive(Debug)]
pub(crate) struct Frame {
    pub source: ByteSource,
    pub line: u32,
    pub path: Rc<Path>,
    /// Present on a frame that was pushed as one file of an `@include_dir`
    /// expansion; carries the iterator forward so that when *this* frame
    /// is popped, the scanner can push the next file in the directory.
    pub dir_iter: Option<DirIterator>,
}

/// What the scanner should do immediately after an end-of-buffer pop.
pub(crate) enum PopOutcome {
    /// A parent frame (or a sibling pushed from the same directory
    /// inclusion) is now active; keep scanning.
    Continue,
    /// As `Continue`, but one or more entries from an in-progress
    /// `@include_dir` expansion could not be opened and were skipped; the
    /// first such failure is reported so the scanner can surface it.
    ContinueWithError(IncludeError),
    /// Every frame has been exhausted; the token stream ends.
    EndOfStream,
}

/// What happened while pushing the first entries of a freshly-opened
/// `@include_dir` expansion. Mirrors `PopOutcome`'s "skip bad entries,
/// report the first failure" policy for the entries tried before the
/// directive itself returns control to the scanner.
pub(crate) struct DirPushOutcome {
    /// Whether an entry was successfully opened and pushed as the active
    /// frame. `false` means every entry in the directory failed to open
    /// (or the directory was empty), so the scanner remains in the
    /// including file.
    pub pushed: bool,
    /// The first per-entry open failure encountered, if any, whether or
    /// not a later entry went on to succeed.
    pub error: Option<IncludeError>,
}

/// The include stack proper: an ordered sequence of frames (top = active)
/// plus the canonical-path set used for cycle detection.
#[derive(Debug)]
pub(crate) struct IncludeStack {
    frames: Vec<Frame>,
    active_paths: HashSet<PathBuf>,
}

impl IncludeStack {
    pub fn new(path: Rc<Path>, bytes: Vec<u8>) -> Self {
        let mut active_paths = HashSet::new();
        if let Ok(canonical) = path.canonicalize() {
            active_paths.insert(canonical);
        }
        Self {
            frames: vec![Frame {
                source: ByteSource::new(bytes),
                line: 1,
                path,
                dir_iter: None,
            }],
            active_paths,
        }
    }

    pub fn top(&self) -> &Frame {
        self.frames.last().expect("include stack is never empty while scanning")
    }

    pub fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("include stack is never empty while scanning")
    }

    /// Directory against which a relative `@include`/`@include_dir` path
    /// on the *current* top frame resolves.
    pub fn base_dir(&self) -> PathBuf {
        self.top()
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolves and pushes a single included file. On success the new
    /// frame becomes active and the caller's previous top frame is
    /// suspended in place, exactly where it left off.
    pub fn push_file(&mut self, path: &Path) -> Result<(), IncludeError> {
        self.push(path, None)
    }

    /// Resolves `base_dir` as a directory, begins iterating it, and (if
    /// non-empty) pushes the first entry that can actually be opened,
    /// attaching the iterator to that frame so it rides forward as each
    /// file in turn is scanned.
    ///
    /// A directory-open failure (the directory itself can't be listed) is a
    /// directive-level failure and abandons the whole `@include_dir`. A
    /// failure opening one *entry* within the directory does not: that
    /// entry is skipped and the next sorted entry is tried, exactly as
    /// `pop()` does for every entry after the first. The first such
    /// per-entry failure encountered, if any, is returned alongside whether
    /// a frame ended up pushed, so the caller can surface it without
    /// abandoning the directive.
    pub fn push_dir(&mut self, base_dir: &Path) -> Result<DirPushOutcome, IncludeError> {
        let resolved = self.resolve(base_dir);
        let mut iter = DirIterator::open(&resolved).map_err(|source| IncludeError::Dir {
            path: resolved.clone(),
            source,
        })?;

        match iter.next() {
            Some(first) => {
                let (pushed, error) = self.push_from_dir_iter(first, iter);
                Ok(DirPushOutcome { pushed, error })
            }
            None => Ok(DirPushOutcome { pushed: false, error: None }),
        }
    }

    /// Tries `candidate`, then each subsequent entry `iter` yields, in
    /// order, until one opens successfully or the iterator is exhausted.
    /// On success, the iterator is reattached to the newly pushed frame so
    /// it keeps riding forward. Returns whether a frame was pushed and the
    /// first failure encountered along the way, if any — a failure can
    /// accompany a `true` (some earlier entry was skipped before one
    /// succeeded) or a `false` (every remaining entry failed to open).
    fn push_from_dir_iter(
        &mut self,
        mut candidate: PathBuf,
        mut iter: DirIterator,
    ) -> (bool, Option<IncludeError>) {
        let mut first_error = None;
        loop {
            match self.push(&candidate, None) {
                Ok(()) => {
                    // Re-attach the iterator to the frame we just pushed so
                    // it keeps riding forward.
                    self.top_mut().dir_iter = Some(iter);
                    return (true, first_error);
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                    match iter.next() {
                        Some(next) => candidate = next,
                        None => return (false, first_error),
                    }
                }
            }
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    fn push(&mut self, path: &Path, dir_iter: Option<DirIterator>) -> Result<(), IncludeError> {
        let resolved = self.resolve(path);

        let canonical = resolved.canonicalize().map_err(|source| IncludeError::Open {
            path: resolved.clone(),
            source,
        })?;

        if self.active_paths.contains(&canonical) {
            return Err(IncludeError::Cycle(resolved));
        }

        let bytes = fs::read(&resolved).map_err(|source| IncludeError::Open {
            path: resolved.clone(),
            source,
        })?;

        self.active_paths.insert(canonical);
        self.frames.push(Frame {
            source: ByteSource::new(bytes),
            line: 1,
            path: Rc::from(resolved.as_path()),
            dir_iter,
        });

        Ok(())
    }

    /// Handles end-of-buffer on the active frame: pops it, restores the
    /// parent, and continues a directory expansion in progress if any.
    pub fn pop(&mut self) -> PopOutcome {
        if self.frames.len() <= 1 {
            return PopOutcome::EndOfStream;
        }

        let popped = self.frames.pop().expect("checked len > 1 above");

        if let Ok(canonical) = popped.path.canonicalize() {
            self.active_paths.remove(&canonical);
        }

        if let Some(mut dir_iter) = popped.dir_iter {
            if let Some(next_path) = dir_iter.next() {
                let (_pushed, first_error) = self.push_from_dir_iter(next_path, dir_iter);
                if let Some(err) = first_error {
                    return PopOutcome::ContinueWithError(err);
                }
            }
        }

        PopOutcome::Continue
    }

    pub fn active_line(&self) -> u32 {
        self.top().line
    }

    pub fn active_path(&self) -> Rc<Path> {
        Rc::clone(&self.top().path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn stack_over(path: &Path) -> IncludeStack {
        let bytes = fs::read(path).unwrap();
        IncludeStack::new(Rc::from(path), bytes)
    }

    #[test]
    fn push_and_pop_restores_parent_line() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        let child = dir.path().join("child.cfg");
        fs::write(&root, b"a\nb\n").unwrap();
        fs::write(&child, b"x\n").unwrap();

        let mut stack = stack_over(&root);
        stack.top_mut().line = 2;

        stack.push_file(&child).unwrap();
        assert_eq!(stack.top().line, 1);
        assert_eq!(stack.active_path().as_ref(), child.as_path());

        assert!(matches!(stack.pop(), PopOutcome::Continue));
        assert_eq!(stack.top().line, 2);
        assert_eq!(stack.active_path().as_ref(), root.as_path());
    }

    #[test]
    fn cycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        fs::write(&root, b"").unwrap();

        let mut stack = stack_over(&root);
        let err = stack.push_file(&root).unwrap_err();
        assert!(matches!(err, IncludeError::Cycle(_)));
    }

    #[test]
    fn missing_include_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        fs::write(&root, b"").unwrap();

        let mut stack = stack_over(&root);
        let err = stack.push_file(&dir.path().join("nope.cfg")).unwrap_err();
        assert!(matches!(err, IncludeError::Open { .. }));
    }

    #[test]
    fn popping_the_root_frame_ends_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        fs::write(&root, b"").unwrap();

        let mut stack = stack_over(&root);
        assert!(matches!(stack.pop(), PopOutcome::EndOfStream));
    }

    #[test]
    fn directory_inclusion_chains_through_pops() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        let inc_dir = dir.path().join("conf.d");
        fs::create_dir(&inc_dir).unwrap();
        fs::write(&root, b"").unwrap();
        fs::write(inc_dir.join("a.cfg"), b"").unwrap();
        fs::write(inc_dir.join("b.cfg"), b"").unwrap();

        let mut stack = stack_over(&root);
        stack.push_dir(&inc_dir).unwrap();
        assert_eq!(stack.active_path().as_ref(), inc_dir.join("a.cfg").as_path());

        assert!(matches!(stack.pop(), PopOutcome::Continue));
        assert_eq!(stack.active_path().as_ref(), inc_dir.join("b.cfg").as_path());

        assert!(matches!(stack.pop(), PopOutcome::Continue));
        assert_eq!(stack.active_path().as_ref(), root.as_path());
    }

    #[test]
    #[cfg(unix)]
    fn push_dir_skips_a_broken_first_entry_and_reports_it() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        let inc_dir = dir.path().join("conf.d");
        fs::create_dir(&inc_dir).unwrap();
        fs::write(&root, b"").unwrap();
        // Sorts before "b.cfg" but points nowhere, so opening it fails.
        std::os::unix::fs::symlink(inc_dir.join("missing"), inc_dir.join("a.broken")).unwrap();
        fs::write(inc_dir.join("b.cfg"), b"").unwrap();

        let mut stack = stack_over(&root);
        let outcome = stack.push_dir(&inc_dir).unwrap();

        assert!(outcome.pushed);
        assert!(matches!(outcome.error, Some(IncludeError::Open { .. })));
        assert_eq!(stack.active_path().as_ref(), inc_dir.join("b.cfg").as_path());
    }

    #[test]
    #[cfg(unix)]
    fn push_dir_with_every_entry_broken_pushes_nothing_but_reports_the_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root.cfg");
        let inc_dir = dir.path().join("conf.d");
        fs::create_dir(&inc_dir).unwrap();
        fs::write(&root, b"").unwrap();
        std::os::unix::fs::symlink(inc_dir.join("missing"), inc_dir.join("a.broken")).unwrap();

        let mut stack = stack_over(&root);
        let outcome = stack.push_dir(&inc_dir).unwrap();

        assert!(!outcome.pushed);
        assert!(matches!(outcome.error, Some(IncludeError::Open { .. })));
        // No frame was pushed, so the root is still the active frame.
        assert_eq!(stack.active_path().as_ref(), root.as_path());
    }
}
