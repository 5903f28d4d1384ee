//! # Bevy Code Document
//!
//! Text buffer and layout engine for code editor widgets.
//!
//! The core ([`document::TextDocument`]) owns the rope buffer, a per-line glyph
//! layout cache and a set of selections. Rendering and hit-testing collaborators
//! pull geometry from it; they never hold document state of their own.
//!
//! ```rust,no_run
//! use bevy_code_document::prelude::*;
//!
//! let mut editor = Editor::new(TextDocument::new("fn main() {}\n", DocumentSettings::default()));
//! editor.insert("// hello\n");
//! editor.execute(EditorCommand::Undo);
//! ```
//!
//! ## Bevy
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_code_document::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(CodeDocumentPlugin::default().with_text("fn main() {}\n"))
//!         .run();
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod types;
pub mod buffer;
pub mod layout;
pub mod settings;
pub mod events;
pub mod transaction;
pub mod history;
pub mod document;
pub mod syntax;
pub mod autocomplete;
pub mod input;
pub mod editor;
pub mod plugin;

pub mod prelude {
    //! Convenient re-exports for common usage
    pub use crate::error::EditorError;
    pub use crate::geometry::*;
    pub use crate::types::*;
    pub use crate::buffer::{TextBuffer, BufferChange};
    pub use crate::layout::{GlyphLineCache, LineEntry, OutOfBoundsMode, SubPosition};
    pub use crate::settings::*;
    pub use crate::events::*;
    pub use crate::transaction::{Transaction, TransactionDirection};
    pub use crate::history::EditHistory;
    pub use crate::document::{
        TextDocument, Target, Direction, Metric, RowData, PositionedGlyph, FoldRegion,
    };
    pub use crate::syntax::{Tokenizer, SimpleTokenizer, TokenZone, tags};
    #[cfg(feature = "tree-sitter")]
    pub use crate::syntax::TreeSitterTokenizer;
    pub use crate::autocomplete::{
        Token, TokenCollection, TokenProvider, DocumentTokenProvider, KeywordProvider,
    };
    pub use crate::input::*;
    pub use crate::editor::Editor;
    pub use crate::plugin::{
        CodeDocumentPlugin, EditorInputManager, DocumentChanged, SelectionsChanged, FoldsChanged,
    };
}
