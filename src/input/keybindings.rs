//! Keymap: key chords to editor commands

use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use std::collections::HashMap;
use std::ops::BitOr;
use super::EditorCommand;

/// Modifier keys held with a chord
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1);
    pub const CTRL: Self = Self(1 << 1);
    pub const ALT: Self = Self(1 << 2);
    pub const SUPER: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of modifier keys held
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Left-hand key codes, in the order they go into a chord
    pub fn key_codes(self) -> Vec<KeyCode> {
        [
            (Self::CTRL, KeyCode::ControlLeft),
            (Self::ALT, KeyCode::AltLeft),
            (Self::SHIFT, KeyCode::ShiftLeft),
            (Self::SUPER, KeyCode::SuperLeft),
        ]
        .into_iter()
        .filter(|(modifier, _)| self.contains(*modifier))
        .map(|(_, key)| key)
        .collect()
    }

    /// Modifiers currently held, either side
    pub fn from_keys(keys: &ButtonInput<KeyCode>) -> Self {
        let mut modifiers = Self::NONE;
        if keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
            modifiers = modifiers | Self::SHIFT;
        }
        if keys.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]) {
            modifiers = modifiers | Self::CTRL;
        }
        if keys.any_pressed([KeyCode::AltLeft, KeyCode::AltRight]) {
            modifiers = modifiers | Self::ALT;
        }
        if keys.any_pressed([KeyCode::SuperLeft, KeyCode::SuperRight]) {
            modifiers = modifiers | Self::SUPER;
        }
        modifiers
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A key plus the modifiers held with it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(key: KeyCode, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// The key alone
    pub fn key(key: KeyCode) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

impl From<KeyCode> for KeyChord {
    fn from(key: KeyCode) -> Self {
        Self::key(key)
    }
}

/// Bindings from chords to commands
///
/// One command may have several chords; a chord maps to one command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Keymap(HashMap<KeyChord, EditorCommand>);

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `chord`, replacing whatever it was bound to
    pub fn bind(&mut self, chord: impl Into<KeyChord>, command: EditorCommand) -> Option<EditorCommand> {
        self.0.insert(chord.into(), command)
    }

    /// Builder-style [`bind`](Self::bind)
    pub fn with(mut self, chord: impl Into<KeyChord>, command: EditorCommand) -> Self {
        self.bind(chord, command);
        self
    }

    pub fn unbind(&mut self, chord: KeyChord) -> Option<EditorCommand> {
        self.0.remove(&chord)
    }

    pub fn get(&self, chord: KeyChord) -> Option<EditorCommand> {
        self.0.get(&chord).copied()
    }

    /// Chords bound to `command`
    pub fn chords_for(&self, command: EditorCommand) -> Vec<KeyChord> {
        self.0
            .iter()
            .filter(|(_, bound)| **bound == command)
            .map(|(chord, _)| *chord)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Of the commands leafwing reports as pressed, the one whose chord holds
    /// the most modifiers
    ///
    /// Chords fire for any superset of their keys, so Ctrl+Shift+Left also
    /// triggers Shift+Left and Ctrl+Left; only the widest one was meant.
    pub fn most_specific(&self, pressed: &[EditorCommand]) -> Option<EditorCommand> {
        pressed.iter().copied().max_by_key(|command| {
            self.chords_for(*command)
                .iter()
                .map(|chord| chord.modifiers.count())
                .max()
                .unwrap_or(0)
        })
    }

    /// Equivalent leafwing input map (modifiers bound to their left-hand keys)
    pub fn to_input_map(&self) -> InputMap<EditorCommand> {
        let mut input_map = InputMap::default();
        for (chord, command) in &self.0 {
            if chord.modifiers == Modifiers::NONE {
                input_map.insert(*command, chord.key);
            } else {
                let mut keys = chord.modifiers.key_codes();
                keys.push(chord.key);
                input_map.insert(*command, ButtonlikeChord::new(keys));
            }
        }
        input_map
    }
}

/// Create the default keymap
pub fn default_keymap() -> Keymap {
    use EditorCommand as C;
    use KeyCode as K;

    let ctrl = Modifiers::CTRL;
    let shift = Modifiers::SHIFT;
    let ctrl_shift = Modifiers::CTRL | Modifiers::SHIFT;
    let ctrl_alt = Modifiers::CTRL | Modifiers::ALT;

    Keymap::new()
        // Caret movement
        .with(K::ArrowLeft, C::MoveLeft)
        .with(K::ArrowRight, C::MoveRight)
        .with(K::ArrowUp, C::MoveUp)
        .with(K::ArrowDown, C::MoveDown)
        .with(KeyChord::new(K::ArrowLeft, ctrl), C::MoveWordLeft)
        .with(KeyChord::new(K::ArrowRight, ctrl), C::MoveWordRight)
        .with(KeyChord::new(K::ArrowUp, ctrl), C::MoveParagraphUp)
        .with(KeyChord::new(K::ArrowDown, ctrl), C::MoveParagraphDown)
        .with(K::Home, C::MoveLineStart)
        .with(K::End, C::MoveLineEnd)
        .with(KeyChord::new(K::Home, ctrl), C::MoveDocumentStart)
        .with(KeyChord::new(K::End, ctrl), C::MoveDocumentEnd)
        // Selection
        .with(KeyChord::new(K::ArrowLeft, shift), C::SelectLeft)
        .with(KeyChord::new(K::ArrowRight, shift), C::SelectRight)
        .with(KeyChord::new(K::ArrowUp, shift), C::SelectUp)
        .with(KeyChord::new(K::ArrowDown, shift), C::SelectDown)
        .with(KeyChord::new(K::ArrowLeft, ctrl_shift), C::SelectWordLeft)
        .with(KeyChord::new(K::ArrowRight, ctrl_shift), C::SelectWordRight)
        .with(KeyChord::new(K::ArrowUp, ctrl_shift), C::SelectParagraphUp)
        .with(KeyChord::new(K::ArrowDown, ctrl_shift), C::SelectParagraphDown)
        .with(KeyChord::new(K::Home, shift), C::SelectLineStart)
        .with(KeyChord::new(K::End, shift), C::SelectLineEnd)
        .with(KeyChord::new(K::Home, ctrl_shift), C::SelectDocumentStart)
        .with(KeyChord::new(K::End, ctrl_shift), C::SelectDocumentEnd)
        // Expansion
        .with(KeyChord::new(K::KeyA, ctrl), C::SelectAll)
        .with(KeyChord::new(K::KeyE, ctrl), C::ExpandToToken)
        .with(KeyChord::new(K::KeyL, ctrl), C::ExpandToLine)
        // Multi-caret
        .with(KeyChord::new(K::ArrowUp, ctrl_alt), C::AddCaretAbove)
        .with(KeyChord::new(K::ArrowDown, ctrl_alt), C::AddCaretBelow)
        .with(KeyChord::new(K::KeyD, ctrl), C::AddNextOccurrence)
        .with(KeyChord::new(K::KeyF, ctrl), C::AddNextMatch)
        .with(K::Escape, C::Escape)
        // Deletion
        .with(K::Backspace, C::DeleteBackward)
        .with(K::Delete, C::DeleteForward)
        .with(KeyChord::new(K::Backspace, ctrl), C::DeleteWordBackward)
        // Insertion
        .with(K::Enter, C::InsertNewline)
        .with(KeyChord::new(K::Enter, shift), C::InsertStatementEnd)
        .with(K::Tab, C::Indent)
        .with(KeyChord::new(K::Tab, shift), C::Outdent)
        // Clipboard
        .with(KeyChord::new(K::KeyC, ctrl), C::Copy)
        .with(KeyChord::new(K::KeyX, ctrl), C::Cut)
        .with(KeyChord::new(K::KeyV, ctrl), C::Paste)
        // Undo/Redo
        .with(KeyChord::new(K::KeyZ, ctrl), C::Undo)
        .with(KeyChord::new(K::KeyR, ctrl), C::Redo)
        .with(KeyChord::new(K::KeyY, ctrl), C::Redo)
        .with(KeyChord::new(K::KeyZ, ctrl_shift), C::Redo)
}

/// Create the default input map with all keybindings
pub fn default_input_map() -> InputMap<EditorCommand> {
    default_keymap().to_input_map()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keymap_lookups() {
        let keymap = default_keymap();
        assert_eq!(keymap.get(KeyChord::key(KeyCode::Enter)), Some(EditorCommand::InsertNewline));
        assert_eq!(
            keymap.get(KeyChord::new(KeyCode::ArrowDown, Modifiers::CTRL | Modifiers::ALT)),
            Some(EditorCommand::AddCaretBelow)
        );
        assert_eq!(keymap.get(KeyChord::new(KeyCode::KeyQ, Modifiers::CTRL)), None);
        assert_eq!(keymap.chords_for(EditorCommand::Redo).len(), 3);
    }

    #[test]
    fn test_rebinding_replaces() {
        let mut keymap = default_keymap();
        let chord = KeyChord::new(KeyCode::KeyD, Modifiers::CTRL);
        assert_eq!(keymap.bind(chord, EditorCommand::AddNextMatch), Some(EditorCommand::AddNextOccurrence));
        assert_eq!(keymap.get(chord), Some(EditorCommand::AddNextMatch));
        assert!(keymap.chords_for(EditorCommand::AddNextOccurrence).is_empty());
    }

    #[test]
    fn test_most_specific_prefers_more_modifiers() {
        let keymap = default_keymap();
        let pressed = [
            EditorCommand::SelectLeft,
            EditorCommand::SelectWordLeft,
            EditorCommand::MoveWordLeft,
        ];
        assert_eq!(keymap.most_specific(&pressed), Some(EditorCommand::SelectWordLeft));
        assert_eq!(keymap.most_specific(&[]), None);
    }

    #[test]
    fn test_modifier_keys_order() {
        let modifiers = Modifiers::SHIFT | Modifiers::CTRL;
        assert!(modifiers.contains(Modifiers::CTRL));
        assert!(!modifiers.contains(Modifiers::ALT));
        assert_eq!(modifiers.count(), 2);
        assert_eq!(modifiers.key_codes(), vec![KeyCode::ControlLeft, KeyCode::ShiftLeft]);
    }

    #[test]
    fn test_input_map_covers_every_binding() {
        let keymap = default_keymap();
        let input_map = keymap.to_input_map();
        for command in EditorCommand::ALL {
            let bound = !keymap.chords_for(command).is_empty();
            assert_eq!(input_map.get_buttonlike(&command).is_some(), bound, "{command:?}");
        }
    }
}
