mod common;
mod note;

pub use common::*;
pub use note::*;
