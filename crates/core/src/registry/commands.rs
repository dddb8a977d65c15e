//! Transcode argument table keyed by (input, output) format.

use super::types::Format;

/// VP8 video with Vorbis audio at a fixed quality level.
const WEBM_ARGS: &[&str] = &[
    "-c:v", "libvpx", "-crf", "10", "-b:v", "1M", "-c:a", "libvorbis", "-q:a", "4",
];

/// Returns the pair-specific arguments placed between the input and output
/// paths. An empty slice is a valid answer: the engine picks its defaults.
pub fn command_args(input: Format, output: Format) -> &'static [&'static str] {
    match (input, output) {
        (_, Format::Webm) => WEBM_ARGS,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_webm() {
        for input in Format::ALL {
            let args = command_args(input, Format::Webm);
            assert_eq!(args[..2], ["-c:v", "libvpx"]);
            assert!(args.contains(&"libvorbis"));
        }
    }

    #[test]
    fn test_unregistered_pair_is_empty() {
        assert!(command_args(Format::Gif, Format::Png).is_empty());
        assert!(command_args(Format::Webm, Format::Mp4).is_empty());
    }
}
