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

//! Source locations used to stamp tokens and error records.

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::rc::Rc;

/// A location within a configuration file: its path and a 1-based line
/// number. Columns are not tracked; the scanner's grammar has no construct
/// whose diagnostics depend on one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Location {
    /// Path of the file, as originally given to the scanner or include
    /// directive. Shared via `Rc` so every token on a line can cheaply
    /// carry its own copy without re-allocating the path string.
    pub path: Rc<Path>,

    /// The 1-based line number.
    pub line: u32,
}

impl Location {
    pub(crate) fn new(path: Rc<Path>, line: u32) -> Self {
        Self { path, line }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}
