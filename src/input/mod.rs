//! Editor commands and their key bindings
//!
//! [`EditorCommand`] is the vocabulary the [`Editor`](crate::editor::Editor)
//! executes. Bindings live in a [`Keymap`]; the Bevy plugin turns it into a
//! leafwing `InputMap` for action-based input.

mod keybindings;

pub use keybindings::{default_input_map, default_keymap, KeyChord, Keymap, Modifiers};

// Re-export leafwing types for user customization
pub use leafwing_input_manager::prelude::{ActionState, Actionlike, ButtonlikeChord, InputMap};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Editor command that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Actionlike, Serialize, Deserialize)]
pub enum EditorCommand {
    // Caret movement
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    MoveWordLeft,
    MoveWordRight,
    MoveParagraphUp,
    MoveParagraphDown,
    /// First non-whitespace character, then column 0
    MoveLineStart,
    MoveLineEnd,
    MoveDocumentStart,
    MoveDocumentEnd,

    // Selection (movement that keeps the tail)
    SelectLeft,
    SelectRight,
    SelectUp,
    SelectDown,
    SelectWordLeft,
    SelectWordRight,
    SelectParagraphUp,
    SelectParagraphDown,
    SelectLineStart,
    SelectLineEnd,
    SelectDocumentStart,
    SelectDocumentEnd,

    // Expansion
    SelectAll,
    /// Grow each selection to the token around it
    ExpandToToken,
    ExpandToLine,

    // Multi-caret
    AddCaretAbove,
    AddCaretBelow,
    /// Select the next occurrence of the last selection's text
    AddNextOccurrence,
    /// Like `AddNextOccurrence`, limited to single-row matches
    AddNextMatch,
    /// Collapse ranges, then drop secondary carets
    Escape,

    // Deletion
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,

    // Insertion
    /// Line break carrying the current indentation
    InsertNewline,
    /// Terminate the statement with ';' and start a new line
    InsertStatementEnd,
    Indent,
    Outdent,

    // Clipboard (in-editor register)
    Copy,
    Cut,
    Paste,

    // History
    Undo,
    Redo,
}

impl EditorCommand {
    pub const ALL: [EditorCommand; 44] = [
        EditorCommand::MoveLeft,
        EditorCommand::MoveRight,
        EditorCommand::MoveUp,
        EditorCommand::MoveDown,
        EditorCommand::MoveWordLeft,
        EditorCommand::MoveWordRight,
        EditorCommand::MoveParagraphUp,
        EditorCommand::MoveParagraphDown,
        EditorCommand::MoveLineStart,
        EditorCommand::MoveLineEnd,
        EditorCommand::MoveDocumentStart,
        EditorCommand::MoveDocumentEnd,
        EditorCommand::SelectLeft,
        EditorCommand::SelectRight,
        EditorCommand::SelectUp,
        EditorCommand::SelectDown,
        EditorCommand::SelectWordLeft,
        EditorCommand::SelectWordRight,
        EditorCommand::SelectParagraphUp,
        EditorCommand::SelectParagraphDown,
        EditorCommand::SelectLineStart,
        EditorCommand::SelectLineEnd,
        EditorCommand::SelectDocumentStart,
        EditorCommand::SelectDocumentEnd,
        EditorCommand::SelectAll,
        EditorCommand::ExpandToToken,
        EditorCommand::ExpandToLine,
        EditorCommand::AddCaretAbove,
        EditorCommand::AddCaretBelow,
        EditorCommand::AddNextOccurrence,
        EditorCommand::AddNextMatch,
        EditorCommand::Escape,
        EditorCommand::DeleteBackward,
        EditorCommand::DeleteForward,
        EditorCommand::DeleteWordBackward,
        EditorCommand::InsertNewline,
        EditorCommand::InsertStatementEnd,
        EditorCommand::Indent,
        EditorCommand::Outdent,
        EditorCommand::Copy,
        EditorCommand::Cut,
        EditorCommand::Paste,
        EditorCommand::Undo,
        EditorCommand::Redo,
    ];

    /// Returns true if this command should repeat when the key is held down
    pub fn is_repeatable(&self) -> bool {
        matches!(
            self,
            EditorCommand::MoveLeft
                | EditorCommand::MoveRight
                | EditorCommand::MoveUp
                | EditorCommand::MoveDown
                | EditorCommand::MoveWordLeft
                | EditorCommand::MoveWordRight
                | EditorCommand::SelectLeft
                | EditorCommand::SelectRight
                | EditorCommand::SelectUp
                | EditorCommand::SelectDown
                | EditorCommand::SelectWordLeft
                | EditorCommand::SelectWordRight
                | EditorCommand::DeleteBackward
                | EditorCommand::DeleteForward
                | EditorCommand::DeleteWordBackward
                | EditorCommand::Undo
                | EditorCommand::Redo
        )
    }
}
