//! Application state module

mod answer;
mod editor;
mod forms;
mod load;
mod localized;

pub use answer::*;
pub use editor::*;
pub use forms::*;
pub use load::*;
pub use localized::*;
