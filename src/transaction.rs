//! Replacement transactions
//!
//! A [`Transaction`] says "replace the text under this selection with this
//! content". Fulfilling one against a document yields its reciprocal, which
//! restores the previous text when fulfilled in turn.

use serde::{Deserialize, Serialize};
use crate::types::Selection;

/// Content of a transaction that deletes the character before a caret
pub const BACKSPACE: char = '\u{8}';

/// Content of a transaction that deletes the character after a caret
pub const DELETE: char = '\u{7f}';

/// Whether a transaction is a user edit or the undo of one
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionDirection {
    #[default]
    Forward,
    Reverse,
}

impl TransactionDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

/// Replace the text under `selection` with `content`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub selection: Selection,
    pub content: String,
    pub direction: TransactionDirection,
}

impl Transaction {
    pub fn new(selection: Selection, content: impl Into<String>) -> Self {
        Self {
            selection,
            content: content.into(),
            direction: TransactionDirection::Forward,
        }
    }

    /// Delete the character before a caret, or the selected text
    pub fn backspace(selection: Selection) -> Self {
        Self::new(selection, BACKSPACE)
    }

    /// Delete the character after a caret, or the selected text
    pub fn delete(selection: Selection) -> Self {
        Self::new(selection, DELETE)
    }

    /// Nothing to remove and nothing to insert
    pub fn is_noop(&self) -> bool {
        self.selection.is_singular() && self.content.is_empty()
    }
}
