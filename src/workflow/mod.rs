pub mod actions;
pub mod editor;
pub mod notices;

pub use actions::{action_for, ActionKind, ActionOutcome, ActionTarget};
pub use editor::{
    question_label, ErrorPanel, FormEditor, LoaderAction, NavEntry, SubmitButton, SubmitGuard,
};
pub use notices::{Notice, NoticeBoard, NoticeLevel};
