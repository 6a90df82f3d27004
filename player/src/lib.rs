pub mod error;
pub mod game;
pub mod input;
pub mod result;

pub use error::PlayerError;
pub use game::{Judgement, JudgeWindow, NoteState, PlayRuntime, Tightness};
pub use input::{InputEvent, InputHandler, InputKind, KeyBindings};
pub use result::{PlayResult, Rank};
