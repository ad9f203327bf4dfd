//! Session lifecycle: ending an unrecoverable session and remembering where
//! the admin was so the next login can return there.

mod resume;
mod terminator;

pub use resume::{RESUME_KEY, ResumeSlot};
pub use terminator::SessionTerminator;
