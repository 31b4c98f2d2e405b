use thiserror::Error;

/// Setup-time failures. Rendering itself never fails; these only surface when an
/// embedder or textplug registers something malformed.
#[derive(Debug, Error)]
pub enum TextileError {
    #[error("span definitions need a name and non-empty open/close markers")]
    InvalidSpan,

    #[error("a span using markers {open:?} / {close:?} is already defined")]
    DuplicateSpan { open: String, close: String },

    #[error("no span named {0:?} is defined")]
    UnknownSpan(String),

    #[error("glyph rules need a name, a pattern and a replacement")]
    InvalidGlyph,

    #[error("glyph rule {0:?} is already defined")]
    DuplicateGlyph(String),

    #[error("parse listeners need a non-empty event name")]
    InvalidEvent,

    #[error("pattern for {name} failed to compile: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

impl TextileError {
    pub(crate) fn pattern(name: impl Into<String>, source: regex::Error) -> Self {
        TextileError::Pattern {
            name: name.into(),
            source,
        }
    }
}
