/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::hierarchy::Qualifier;
use crate::model::SlotId;
use crate::source::{AnnotationLocation, FileDatabase};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream};

use crate::source::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContradictionKind {
    Subtype,
    Equality,
    Inequality,
    Comparable,
}

#[derive(Debug, Clone)]
pub enum Error {
    /// Two constants were asserted to satisfy a relationship the hierarchy
    /// says they cannot. A user-facing diagnostic, reported at constraint
    /// creation so the host tool can point at the offending code.
    Contradiction {
        kind: ContradictionKind,
        first: Qualifier,
        second: Qualifier,
        location: AnnotationLocation,
    },
    /// A slot encoding this manager never issued was handed back to it.
    UnrecognizedSlotEncoding { id: u32 },
    /// A constraint references a slot id that does not resolve; an upstream
    /// bug surfaced during normalization.
    DanglingSlot { constraint: String, slot: SlotId },
    /// An existential slot was requested over a non-variable operand.
    ExistentialOperandNotVariable { operand: SlotId },
    /// A preference constraint needs a variable slot and a constant goal.
    MalformedPreference { variable: SlotId, goal: SlotId },
    /// An existential slot survived into the normalized output set. Always a
    /// bug in the core itself, fatal regardless of mode.
    ExistentialSurvivedNormalization { constraint: String, slot: SlotId },
}

impl Error {
    fn make_diagnostic(&self) -> Diagnostic<FileId> {
        let mut diagnostic = Diagnostic::error();
        let mut labels = Vec::new();
        let mut notes = Vec::new();

        match self {
            Error::Contradiction {
                kind,
                first,
                second,
                location,
            } => {
                let relation = match kind {
                    ContradictionKind::Subtype => "a subtype of",
                    ContradictionKind::Equality => "equal to",
                    ContradictionKind::Inequality => "unequal to",
                    ContradictionKind::Comparable => "comparable with",
                };
                diagnostic = diagnostic.with_message(format!(
                    "`{first}` can never be {relation} `{second}`"
                ));
                if let AnnotationLocation::Source(loc) = location {
                    labels.push(Label::secondary(loc.file_id, loc.range()).with_message("here"));
                }
            }
            Error::UnrecognizedSlotEncoding { id } => {
                diagnostic = diagnostic
                    .with_message(format!("`{id}` is not a slot encoding this run produced"));
            }
            Error::DanglingSlot { constraint, slot } => {
                diagnostic = diagnostic.with_message(format!(
                    "constraint `{constraint}` references unknown slot {slot}"
                ));
                notes.push("slots must be created through the slot manager".to_string());
            }
            Error::ExistentialOperandNotVariable { operand } => {
                diagnostic = diagnostic.with_message(format!(
                    "existential slot operand {operand} is not a variable slot"
                ));
            }
            Error::MalformedPreference { variable, goal } => {
                diagnostic = diagnostic.with_message(format!(
                    "preference needs a variable slot and a constant goal, got {variable} and {goal}"
                ));
            }
            Error::ExistentialSurvivedNormalization { constraint, slot } => {
                diagnostic = diagnostic.with_message(format!(
                    "existential slot {slot} survived normalization in `{constraint}`"
                ));
                notes.push("this is a bug in the inference core".to_string());
            }
        };

        diagnostic = diagnostic.with_labels(labels);
        diagnostic = diagnostic.with_notes(notes);

        diagnostic
    }

    pub fn emit(&self, files: &FileDatabase) {
        let diagnostic = self.make_diagnostic();
        let writer = StandardStream::stderr(ColorChoice::Always);
        let config = term::Config::default();

        term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic).unwrap();
    }

    pub fn to_string(&self, files: &FileDatabase, ansi: bool) -> String {
        let diagnostic = self.make_diagnostic();
        let mut buffer = if ansi {
            Buffer::ansi()
        } else {
            Buffer::no_color()
        };
        let config = term::Config::default();

        term::emit_to_write_style(&mut buffer, &config, files, &diagnostic).unwrap();
        String::from_utf8(buffer.into_inner()).unwrap()
    }
}
