use std::path::PathBuf;

/// Picks where the next dumped video goes.
pub trait OutputPathResolver: Send {
    /// Returns a path for `{prefix}_{counter}.{extension}` that does not
    /// overwrite an earlier output. Parent directories exist on success.
    fn resolve(&self, filename_prefix: &str, extension: &str) -> std::io::Result<PathBuf>;
}
