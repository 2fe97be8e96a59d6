//! Update/announcement messages published as a sectioned text document.
//!
//! ```text
//! [1.0.0]
//! UPDATE=1
//! MESSAGE=New version available
//! URL=http://example.com/notice
//! ```
//!
//! Each `[version]` header opens a section of `KEY=value` lines. Sections
//! that lack a required key, or carry an unparseable value, are dropped
//! without affecting the others.

mod message;
mod parser;

pub use message::UpdateMessage;
pub use parser::{find_version, parse, parse_sections, SectionError};
