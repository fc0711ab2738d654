//! XML navigation for KML documents.

mod locator;
mod utils;

pub use locator::{ElementLocator, MarkupDocument};
pub use utils::{collect_text, element_children, get_tag_name, get_text, has_tag};
