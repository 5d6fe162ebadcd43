pub mod cues;
pub mod error;
pub mod pacing;
pub mod types;

pub use cues::*;
pub use error::LessonError;
pub use pacing::*;
pub use types::*;
