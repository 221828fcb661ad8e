use std::io::{self, Read};

use crate::error::DemuxError;

/// Replaces the extension of `path` with `suffix`. The extension starts at
/// the last `.` in the final path component; a path without one gets the
/// suffix appended.
pub fn replace_ext(path: &str, suffix: &str) -> String {
    let base = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let stem_end = path[base..].rfind('.').map_or(path.len(), |i| base + i);
    let mut out = String::with_capacity(stem_end + suffix.len());
    out.push_str(&path[..stem_end]);
    out.push_str(suffix);
    out
}

pub fn read_exact<R: Read>(
    input: &mut R,
    path: &str,
    offset: u64,
    buf: &mut [u8],
) -> Result<(), DemuxError> {
    input.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DemuxError::UnexpectedEof {
                path: path.to_string(),
                offset,
            }
        } else {
            DemuxError::Read {
                path: path.to_string(),
                offset,
                source: e,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::replace_ext;

    #[test]
    fn replaces_the_last_extension() {
        assert_eq!(replace_ext("movie.pss", ".m2v"), "movie.m2v");
        assert_eq!(replace_ext("a.b.pss", ".genh"), "a.b.genh");
        assert_eq!(replace_ext("movie.", ".bin"), "movie.bin");
    }

    #[test]
    fn appends_when_there_is_no_extension() {
        assert_eq!(replace_ext("movie", "_subs_en.bin"), "movie_subs_en.bin");
        assert_eq!(replace_ext("", ".genh"), ".genh");
    }

    #[test]
    fn ignores_dots_in_directory_names() {
        assert_eq!(replace_ext("dir.v1/movie", ".bin"), "dir.v1/movie.bin");
        assert_eq!(replace_ext("dir.v1/movie.pss", ".bin"), "dir.v1/movie.bin");
        assert_eq!(replace_ext(r"dir.v1\movie.pss", ".bin"), r"dir.v1\movie.bin");
    }

    #[test]
    fn a_leading_dot_counts_as_an_extension() {
        assert_eq!(replace_ext(".pss", ".genh"), ".genh");
    }
}
