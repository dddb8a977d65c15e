//! Types for the converter module.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::{command_args, Format};

/// Subdirectory of the scratch directory the input is staged into.
pub const INPUT_DIR: &str = "input";

/// A file handed to the converter.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Declared file name (e.g. "clip.gif").
    pub name: String,
    /// Declared MIME type.
    pub mime: String,
    /// File contents.
    pub data: Bytes,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }
}

/// A file produced by a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    /// Name of the entry the engine wrote.
    pub name: String,
    /// The requested output MIME type.
    pub mime: String,
    /// File contents.
    #[serde(skip)]
    pub data: Bytes,
}

impl OutputFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Virtual paths and naming for one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Per-call scratch directory, unique across calls.
    pub scratch_dir: String,
    /// Input file name as staged (no path separators).
    pub file_name: String,
    pub input_format: Format,
    pub output_format: Format,
    /// Whether one output file is produced per frame.
    pub split: bool,
}

impl ConversionJob {
    /// Plans a job with a freshly allocated scratch directory.
    pub fn new(file_name: &str, input_format: Format, output_format: Format) -> Self {
        Self {
            scratch_dir: format!("tempDir-{}", Uuid::new_v4()),
            file_name: sanitize_file_name(file_name),
            input_format,
            output_format,
            split: input_format.is_multi_frame() && !output_format.is_multi_frame(),
        }
    }

    /// Directory the input is staged into.
    pub fn input_dir(&self) -> String {
        format!("{}/{}", self.scratch_dir, INPUT_DIR)
    }

    /// Path of the staged input file.
    pub fn input_path(&self) -> String {
        format!("{}/{}", self.input_dir(), self.file_name)
    }

    /// Output path, with a `%05d` frame placeholder when splitting.
    ///
    /// A split output is an image sequence pattern, so a literal `%` in the
    /// file name is written as `%%`.
    pub fn output_path(&self) -> String {
        let ext = self.output_format.extension();
        if self.split {
            format!(
                "{}/{}_%05d.{}",
                self.scratch_dir,
                self.file_name.replace('%', "%%"),
                ext
            )
        } else {
            format!("{}/{}.{}", self.scratch_dir, self.file_name, ext)
        }
    }

    /// Full engine command: input, pair-specific arguments, output.
    pub fn command(&self, input_path: &str) -> Vec<String> {
        let pair_args = command_args(self.input_format, self.output_format);
        let mut args = Vec::with_capacity(pair_args.len() + 3);
        args.push("-i".to_string());
        args.push(input_path.to_string());
        args.extend(pair_args.iter().map(|s| s.to_string()));
        args.push(self.output_path());
        args
    }
}

/// Keeps only the last path component of a declared file name.
fn sanitize_file_name(name: &str) -> String {
    match name.rsplit(['/', '\\']).next() {
        Some(base) if !base.is_empty() && base != "." && base != ".." => base.to_string(),
        _ => "input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_job_paths() {
        let job = ConversionJob::new("clip.gif", Format::Gif, Format::Png);
        assert!(job.split);
        assert!(job.scratch_dir.starts_with("tempDir-"));
        assert_eq!(job.input_path(), format!("{}/input/clip.gif", job.scratch_dir));
        assert_eq!(job.output_path(), format!("{}/clip.gif_%05d.png", job.scratch_dir));
    }

    #[test]
    fn test_single_job_paths() {
        let job = ConversionJob::new("photo.png", Format::Png, Format::Png);
        assert!(!job.split);
        assert_eq!(job.output_path(), format!("{}/photo.png.png", job.scratch_dir));

        // Multi-frame to multi-frame keeps a single output
        let job = ConversionJob::new("clip.gif", Format::Gif, Format::Webm);
        assert!(!job.split);
    }

    #[test]
    fn test_percent_in_name_is_escaped_for_sequences() {
        let job = ConversionJob::new("100%.gif", Format::Gif, Format::Png);
        assert_eq!(
            job.output_path(),
            format!("{}/100%%.gif_%05d.png", job.scratch_dir)
        );
        assert_eq!(job.input_path(), format!("{}/input/100%.gif", job.scratch_dir));

        // Single outputs are not patterns
        let job = ConversionJob::new("100%.png", Format::Png, Format::Jpeg);
        assert_eq!(job.output_path(), format!("{}/100%.png.jpg", job.scratch_dir));
    }

    #[test]
    fn test_scratch_dirs_are_unique() {
        let a = ConversionJob::new("a.png", Format::Png, Format::Jpeg);
        let b = ConversionJob::new("a.png", Format::Png, Format::Jpeg);
        assert_ne!(a.scratch_dir, b.scratch_dir);
    }

    #[test]
    fn test_command_layout() {
        let job = ConversionJob::new("clip.gif", Format::Gif, Format::Png);
        let input = job.input_path();
        let command = job.command(&input);
        assert_eq!(command, vec!["-i".to_string(), input, job.output_path()]);

        let job = ConversionJob::new("clip.gif", Format::Gif, Format::Webm);
        let command = job.command("in.gif");
        assert_eq!(command[..2], ["-i", "in.gif"]);
        assert_eq!(command[2], "-c:v");
        assert_eq!(command.last(), Some(&job.output_path()));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("clip.gif"), "clip.gif");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\images\\a.png"), "a.png");
        assert_eq!(sanitize_file_name(""), "input");
        assert_eq!(sanitize_file_name("dir/"), "input");
        assert_eq!(sanitize_file_name(".."), "input");
    }

    #[test]
    fn test_output_file_size() {
        let file = OutputFile {
            name: "a.png".to_string(),
            mime: "image/png".to_string(),
            data: Bytes::from_static(b"1234"),
        };
        assert_eq!(file.size(), 4);
    }
}
