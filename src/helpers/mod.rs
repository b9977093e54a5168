//! Helper functions shared by the rich-text renderer and the templates

mod date;
mod html;

pub use date::*;
pub use html::*;
