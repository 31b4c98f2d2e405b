//! Textile to HTML (or plain text) conversion.
//!
//! ```
//! use textile_engine::{RenderOptions, Textile};
//!
//! let textile = Textile::new().unwrap();
//! let html = textile.render("h1. Hello *world*", &RenderOptions::unrestricted());
//! assert_eq!(html, "\t<h1>Hello <strong>world</strong></h1>");
//! ```

pub mod attributes;
pub mod context;
pub mod error;
pub mod events;
pub mod generator;
pub mod options;
pub mod parsing;
pub mod patterns;
pub mod rewrite;
pub mod shelf;
pub mod textile;
pub mod textplugs;

pub use error::TextileError;
pub use events::{ParseEvent, WILDCARD};
pub use generator::{GlyphReplacements, HtmlGenerator, OutputGenerator, OutputKind, TextGenerator};
pub use options::RenderOptions;
pub use parsing::Parser;
pub use parsing::blocks::{BlockMatch, BlockParts};
pub use textile::{Textile, TextileBuilder};
