//! Bevy plugin wiring the editor into an app
//!
//! The document is single-threaded (listeners are plain closures), so the
//! [`Editor`] lives in the world as a non-send resource. Document events are
//! queued by a listener and re-emitted as Bevy messages once per frame.

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::prelude::*;
use leafwing_input_manager::prelude::{ActionState, InputManagerPlugin, InputMap};
use std::cell::RefCell;
use std::rc::Rc;
use crate::autocomplete::TokenCollection;
use crate::document::TextDocument;
use crate::editor::Editor;
use crate::events::DocumentEvent;
use crate::input::{default_keymap, EditorCommand, Keymap, Modifiers};
use crate::settings::DocumentSettings;

/// Hold time before a repeatable command starts repeating, in seconds
const REPEAT_DELAY: f64 = 0.45;
/// Interval between repeats, in seconds
const REPEAT_INTERVAL: f64 = 0.035;

/// Code document plugin: editor state, key bindings and change messages
pub struct CodeDocumentPlugin {
    settings: DocumentSettings,
    text: String,
    keymap: Keymap,
    autocomplete: bool,
}

impl Default for CodeDocumentPlugin {
    fn default() -> Self {
        Self {
            settings: DocumentSettings::default(),
            text: String::new(),
            keymap: default_keymap(),
            autocomplete: true,
        }
    }
}

impl CodeDocumentPlugin {
    /// Set custom document settings
    pub fn with_settings(mut self, settings: DocumentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Initial text of the document
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Replace the default key bindings
    pub fn with_keymap(mut self, keymap: Keymap) -> Self {
        self.keymap = keymap;
        self
    }

    /// Whether to run the background token index (on by default)
    pub fn with_autocomplete(mut self, enable: bool) -> Self {
        self.autocomplete = enable;
        self
    }
}

/// Fired after the buffer changed
#[derive(Message, Clone, Debug)]
pub struct DocumentChanged {
    pub start_char: usize,
    pub old_end_char: usize,
    pub new_end_char: usize,
    /// Buffer version after the edit
    pub version: u64,
}

/// Fired after the selection set changed
#[derive(Message, Clone, Debug)]
pub struct SelectionsChanged {
    pub version: u64,
}

/// Fired after a fold was added or removed
#[derive(Message, Clone, Debug)]
pub struct FoldsChanged {
    pub hidden_rows: usize,
}

/// Marker component for the editor's input manager entity
#[derive(Component)]
pub struct EditorInputManager;

/// Bindings used to resolve overlapping chords
#[derive(Resource, Clone, Debug)]
pub struct EditorKeymap(pub Keymap);

/// Resource to hold the configured input map until it's spawned
#[derive(Resource)]
struct PendingInputMap(InputMap<EditorCommand>);

/// Document events waiting to become messages
#[derive(Default)]
struct PendingDocumentEvents(Rc<RefCell<Vec<DocumentEvent>>>);

/// Held repeatable command and when it fires next
#[derive(Resource, Default)]
struct KeyRepeat {
    command: Option<EditorCommand>,
    next_fire: f64,
}

impl Plugin for CodeDocumentPlugin {
    fn build(&self, app: &mut App) {
        let mut document = TextDocument::new(&self.text, self.settings.clone());

        let pending = PendingDocumentEvents::default();
        let queue = pending.0.clone();
        document.add_listener(Box::new(move |event| queue.borrow_mut().push(event.clone())));

        if self.autocomplete {
            match TokenCollection::with_document_tokens() {
                Ok(collection) => {
                    collection.attach(&mut document);
                    app.insert_non_send_resource(collection);
                }
                Err(err) => warn!("autocomplete disabled: {}", err),
            }
        }

        app.insert_resource(self.settings.clone());
        app.insert_resource(EditorKeymap(self.keymap.clone()));
        app.insert_resource(PendingInputMap(self.keymap.to_input_map()));
        app.insert_resource(KeyRepeat::default());
        app.insert_non_send_resource(Editor::new(document));
        app.insert_non_send_resource(pending);

        app.add_message::<DocumentChanged>();
        app.add_message::<SelectionsChanged>();
        app.add_message::<FoldsChanged>();

        // Register leafwing-input-manager plugin for action-based input
        app.add_plugins(InputManagerPlugin::<EditorCommand>::default());
        app.add_systems(Startup, spawn_input_manager);

        app.add_systems(
            Update,
            (
                dispatch_commands,
                insert_typed_text,
                forward_document_events,
                poll_tokens,
            )
                .chain(),
        );
    }
}

/// Spawn the input manager entity with configured keybindings
fn spawn_input_manager(mut commands: Commands, pending: Res<PendingInputMap>) {
    commands.spawn((
        EditorInputManager,
        pending.0.clone(),
        ActionState::<EditorCommand>::default(),
        Name::new("EditorInputManager"),
    ));
}

/// Run the pressed command, repeating held ones
fn dispatch_commands(
    action_query: Query<&ActionState<EditorCommand>, With<EditorInputManager>>,
    keymap: Res<EditorKeymap>,
    mut repeat: ResMut<KeyRepeat>,
    time: Res<Time>,
    mut editor: NonSendMut<Editor>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };
    let now = time.elapsed_secs_f64();

    let pressed = action_state.get_just_pressed();
    if let Some(command) = keymap.0.most_specific(&pressed) {
        editor.execute(command);
        repeat.command = command.is_repeatable().then_some(command);
        repeat.next_fire = now + REPEAT_DELAY;
        return;
    }

    let Some(held) = repeat.command else {
        return;
    };
    if !action_state.pressed(&held) {
        repeat.command = None;
    } else if now >= repeat.next_fire {
        editor.execute(held);
        repeat.next_fire = now + REPEAT_INTERVAL;
    }
}

/// Feed printable key presses to the editor
fn insert_typed_text(
    mut char_events: MessageReader<KeyboardInput>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut editor: NonSendMut<Editor>,
) {
    let modifiers = Modifiers::from_keys(&keyboard);
    let shortcut = modifiers.contains(Modifiers::CTRL) || modifiers.contains(Modifiers::SUPER);

    for event in char_events.read() {
        if shortcut || !event.state.is_pressed() {
            continue;
        }
        match &event.logical_key {
            Key::Character(text) => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    editor.type_character(c);
                }
            }
            Key::Space => {
                editor.type_character(' ');
            }
            _ => {}
        }
    }
}

/// Re-emit queued document events as messages
fn forward_document_events(
    pending: NonSend<PendingDocumentEvents>,
    mut changed: MessageWriter<DocumentChanged>,
    mut selections: MessageWriter<SelectionsChanged>,
    mut folds: MessageWriter<FoldsChanged>,
) {
    let events = std::mem::take(&mut *pending.0.borrow_mut());
    for event in events {
        match event {
            DocumentEvent::BufferChanged(e) => {
                changed.write(DocumentChanged {
                    start_char: e.change.start_char,
                    old_end_char: e.change.old_end_char,
                    new_end_char: e.change.new_end_char,
                    version: e.change.version,
                });
            }
            DocumentEvent::SelectionsChanged { version } => {
                selections.write(SelectionsChanged { version });
            }
            DocumentEvent::FoldStateChanged { hidden_rows } => {
                folds.write(FoldsChanged { hidden_rows });
            }
        }
    }
}

fn poll_tokens(collection: Option<NonSendMut<TokenCollection>>) {
    if let Some(mut collection) = collection {
        collection.poll();
    }
}
