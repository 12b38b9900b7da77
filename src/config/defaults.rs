//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "Finn the Human".into()
    }

    pub fn author() -> String {
        "Finn the Human".into()
    }

    pub fn author_image() -> String {
        "https://octodex.github.com/images/adventure-cat.png".into()
    }

    pub fn description() -> String {
        "Mathematical!".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn theme() -> String {
        "default".into()
    }

    pub fn themes() -> PathBuf {
        "themes".into()
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn debounce_ms() -> u64 {
        500
    }
}
