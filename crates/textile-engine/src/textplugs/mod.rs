//! Optional block handlers that can be switched on by name, e.g. from a
//! config file.

pub mod hr;

use crate::textile::Textile;

/// Names accepted by [`register`].
pub const AVAILABLE: &[&str] = &["hr"];

/// Registers the textplug called `name`. Returns false for an unknown name
/// or when a handler for that block is already installed.
pub fn register(textile: &mut Textile, name: &str) -> bool {
    match name {
        "hr" => hr::register(textile),
        _ => {
            log::warn!("unknown textplug {name:?}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_textplugs_are_refused() {
        let mut textile = Textile::new().unwrap();
        assert!(!register(&mut textile, "toc"));
        assert!(register(&mut textile, "hr"));
        assert!(!register(&mut textile, "hr"));
    }
}
