use serde::{Deserialize, Serialize};

/// Per-call switches for [`crate::Textile::render`].
///
/// `Default` is the restricted posture: input is treated as untrusted, raw HTML
/// is escaped up front, attribute output is limited to `lang` and URL schemes
/// are checked against an allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Escape the input and lock down attributes and URL schemes.
    pub restricted: bool,
    /// Only `bq` and `p` blocks; no lists, tables, extended blocks or raw spans.
    pub lite: bool,
    /// Skip the pipeline entirely and only escape bare ampersands.
    pub encode_only: bool,
    /// Leave `!image!` markup as literal text.
    pub suppress_images: bool,
    /// Keep whitespace-only lines and runs of blank lines as written.
    pub strict_whitespace: bool,
    /// Value for a `rel` attribute added to every generated link.
    pub link_rel: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            restricted: true,
            lite: false,
            encode_only: false,
            suppress_images: false,
            strict_whitespace: false,
            link_rel: None,
        }
    }
}

impl RenderOptions {
    /// Trusted authors: full block set, raw HTML passes through.
    pub fn unrestricted() -> Self {
        Self {
            restricted: false,
            ..Self::default()
        }
    }

    /// Untrusted comment-style input: lite blocks, no images, `rel="nofollow"`.
    pub fn restricted() -> Self {
        Self {
            restricted: true,
            lite: true,
            suppress_images: true,
            link_rel: Some("nofollow".to_string()),
            ..Self::default()
        }
    }

    pub fn with_lite(mut self, lite: bool) -> Self {
        self.lite = lite;
        self
    }

    pub fn with_suppress_images(mut self, suppress: bool) -> Self {
        self.suppress_images = suppress;
        self
    }

    pub fn with_strict_whitespace(mut self, strict: bool) -> Self {
        self.strict_whitespace = strict;
        self
    }

    pub fn with_encode_only(mut self, encode_only: bool) -> Self {
        self.encode_only = encode_only;
        self
    }

    pub fn with_link_rel(mut self, rel: impl Into<String>) -> Self {
        let rel = rel.into();
        self.link_rel = if rel.is_empty() { None } else { Some(rel) };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_is_restricted_but_full_featured() {
        let options = RenderOptions::default();
        assert!(options.restricted);
        assert!(!options.lite);
        assert!(!options.suppress_images);
        assert_eq!(options.link_rel, None);
    }

    #[test]
    fn restricted_preset_locks_everything_down() {
        let options = RenderOptions::restricted();
        assert!(options.restricted && options.lite && options.suppress_images);
        assert_eq!(options.link_rel.as_deref(), Some("nofollow"));
    }

    #[test]
    fn empty_rel_means_no_rel() {
        let options = RenderOptions::unrestricted().with_link_rel("");
        assert_eq!(options.link_rel, None);
    }
}
