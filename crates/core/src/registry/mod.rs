//! Format registry: static lookup tables for MIME types, extensions,
//! multi-frame capability and transcode arguments.
//!
//! The tables are immutable. Absence is reported as `None` or an empty
//! argument list, never as an error.

mod commands;
mod types;

pub use commands::command_args;
pub use types::Format;

/// Reverse lookup from extension to canonical MIME type.
pub fn extension_to_mime(ext: &str) -> Option<&'static str> {
    Format::from_extension(ext).map(|f| f.mime())
}

/// Forward lookup from canonical MIME type to canonical extension.
pub fn mime_to_extension(mime: &str) -> Option<&'static str> {
    Format::from_mime(mime).map(|f| f.extension())
}

/// True iff `mime` has a registered extension.
pub fn is_supported(mime: &str) -> bool {
    mime_to_extension(mime).is_some()
}

/// All canonical MIME types, in registry order.
pub fn list_supported_mimes() -> Vec<&'static str> {
    Format::ALL.iter().map(|f| f.mime()).collect()
}

/// Unregistered types are never multi-frame.
pub fn is_multi_frame(mime: &str) -> bool {
    Format::from_mime(mime).is_some_and(|f| f.is_multi_frame())
}

/// Arguments for the exact (input, output) pair, empty when none are
/// registered or either side is unknown.
pub fn command_for(input_mime: &str, output_mime: &str) -> Vec<String> {
    match (Format::from_mime(input_mime), Format::from_mime(output_mime)) {
        (Some(input), Some(output)) => command_args(input, output)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANDIDATE_MIMES: &[&str] = &[
        "image/jpg",
        "video/x-msvideo",
        "video/ogg",
        "IMAGE/PNG",
        " image/png ",
        "Video/WebM",
        "image/tif",
        "application/pdf",
        "text/plain",
        "",
    ];

    #[test]
    fn test_mime_extension_round_trip() {
        let candidates = list_supported_mimes()
            .into_iter()
            .chain(CANDIDATE_MIMES.iter().copied());
        for mime in candidates.filter(|m| is_supported(m)) {
            let ext = mime_to_extension(mime).unwrap();
            assert_eq!(extension_to_mime(ext), Some(mime), "round trip of {:?}", mime);
        }
    }

    #[test]
    fn test_aliases_are_not_supported_mimes() {
        for mime in CANDIDATE_MIMES {
            assert!(!is_supported(mime), "{:?} should not be supported", mime);
            assert!(!is_multi_frame(mime));
        }
    }

    #[test]
    fn test_is_supported_matches_forward_lookup() {
        for mime in ["image/png", "image/jpg", "application/pdf", "", "text/plain"] {
            assert_eq!(is_supported(mime), mime_to_extension(mime).is_some());
        }
        assert!(is_supported("image/gif"));
        assert!(!is_supported("application/pdf"));
    }

    #[test]
    fn test_list_is_deterministic() {
        assert_eq!(list_supported_mimes(), list_supported_mimes());
        assert_eq!(list_supported_mimes().len(), 17);
    }

    #[test]
    fn test_unknown_lookups() {
        assert_eq!(extension_to_mime("pdf"), None);
        assert_eq!(mime_to_extension("application/pdf"), None);
        assert!(!is_multi_frame("application/pdf"));
    }

    #[test]
    fn test_command_for() {
        assert!(command_for("image/gif", "image/png").is_empty());
        assert!(command_for("application/pdf", "video/webm").is_empty());
        assert!(command_for("foo", "bar").is_empty());

        let args = command_for("image/gif", "video/webm");
        assert_eq!(args.first().map(String::as_str), Some("-c:v"));
        assert!(args.contains(&"libvpx".to_string()));
    }
}
