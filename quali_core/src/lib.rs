/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Core of a type-qualifier inference system: slots stand for the unknown
//! qualifiers of a program, constraints relate them, and normalization
//! turns the accumulated constraint set into solver-ready form.

use core::fmt;
use std::fmt::{Display, Formatter};
use std::io::IsTerminal;

pub mod hierarchy;
pub mod infer;
pub mod model;
pub mod source;

use infer::Error;
use source::FileDatabase;

pub use hierarchy::{ExplicitLattice, Qualifier, QualifierHierarchy};
pub use infer::InferenceContext;

#[derive(Debug)]
pub struct ErrorSummary {
    msg: String,
    more: Option<(FileDatabase, Vec<Error>)>,
}

fn c(code: &str) -> &str {
    let use_color = std::io::stdout().is_terminal();

    if use_color { code } else { "" }
}

impl ErrorSummary {
    pub(crate) fn new(msg: String, files: FileDatabase, errors: Vec<Error>) -> Self {
        Self {
            msg,
            more: Some((files, errors)),
        }
    }

    pub fn emit(&self) {
        if !self.msg.is_empty() {
            let red = c("\x1B[1;31m");
            let bold = c("\x1b[1m");
            let reset = c("\x1b[0m");
            eprintln!("{red}{bold}error:{reset} {}", self.msg);
        }
        if let Some((file_db, errors)) = &self.more {
            for error in errors {
                error.emit(file_db);
            }
        }
    }

    pub fn to_string_ansi(&self) -> String {
        let mut s = String::new();
        s.push_str(&self.msg);
        if let Some((file_db, errors)) = &self.more {
            for error in errors {
                s.push_str(&error.to_string(file_db, true));
            }
        }
        s
    }

    pub fn errors(&self) -> &[Error] {
        match &self.more {
            Some((_, errors)) => errors,
            None => &[],
        }
    }
}

impl Display for ErrorSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.msg)?;
        if let Some((file_db, errors)) = &self.more {
            for error in errors {
                writeln!(f, "{}", error.to_string(file_db, false))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ErrorSummary {}
