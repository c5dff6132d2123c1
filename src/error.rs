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

//! The scanner's error channel.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Severity of a diagnostic surfaced through the error channel.
///
/// The scanner itself only ever originates these two levels; a `Normal`
/// informational level and a process-terminating `Fatal` level belong to
/// the higher-level grammar/assembler layer this crate does not implement.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    /// Scanning continues; the caller may ignore or surface the problem.
    Warning,
    /// The affected lexeme could not be tokenized meaningfully.
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A diagnostic record attached to a `TokenKind::Error` token.
///
/// Field names mirror the `{ error_text, error_file, error_line }` triple
/// promised by the external interface: `text` is `error_text`, `path` is
/// `error_file` (when known), `line` is `error_line`.
#[derive(Clone, Debug)]
pub struct ScanError {
    pub text: String,
    pub path: Option<PathBuf>,
    pub line: u32,
    pub severity: Severity,
}

impl ScanError {
    pub(crate) fn new(text: impl Into<String>, path: Option<&Path>, line: u32) -> Self {
        Self {
            text: text.into(),
            path: path.map(Path::to_path_buf),
            line,
            severity: Severity::Error,
        }
    }
}

impl Display for ScanError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}: {}: {}", path.display(), self.line, self.severity, self.text),
            None => write!(f, "{}: {}", self.severity, self.text),
        }
    }
}

/// Failures arising while the include stack resolves an `@include` or
/// `@include_dir` directive, before they are flattened into a [`ScanError`]
/// for the token stream.
#[derive(thiserror::Error, Debug)]
pub(crate) enum IncludeError {
    #[error("include cycle detected: {0}")]
    Cycle(PathBuf),

    #[error("cannot open include file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot scan include directory '{path}': {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IncludeError {
    /// The path this failure is reported against, for stamping the
    /// resulting [`ScanError`].
    pub(crate) fn path(&self) -> &Path {
        match self {
            IncludeError::Cycle(path) => path,
            IncludeError::Open { path, .. } => path,
            IncludeError::Dir { path, .. } => path,
        }
    }
}
