use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::video::domain::output_path_resolver::OutputPathResolver;

/// Resolves output paths inside a fixed output folder, numbering files
/// `{prefix}_{counter}.{ext}` one past the highest counter already on disk.
///
/// A prefix may name a sub-folder (`clips/run`); it is created under the
/// output folder. Prefixes that would escape the output folder are
/// rejected.
pub struct CounterPathResolver {
    output_dir: PathBuf,
}

impl CounterPathResolver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl OutputPathResolver for CounterPathResolver {
    fn resolve(&self, filename_prefix: &str, extension: &str) -> io::Result<PathBuf> {
        let prefix = Path::new(filename_prefix);
        if prefix
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("filename prefix '{filename_prefix}' must stay inside the output folder"),
            ));
        }

        let name = prefix
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "filename prefix is empty")
            })?;
        let folder = match prefix.parent() {
            Some(sub) => self.output_dir.join(sub),
            None => self.output_dir.clone(),
        };

        fs::create_dir_all(&folder)?;
        let counter = next_index(&folder, name, extension)?;
        Ok(folder.join(format!("{name}_{counter}.{extension}")))
    }
}

/// One past the highest `N` among files named `{name}_{N}.{extension}`
/// in `folder`, or 0 when there are none.
pub fn next_index(folder: &Path, name: &str, extension: &str) -> io::Result<u64> {
    let mut next = 0;
    for entry in fs::read_dir(folder)? {
        let file_name = entry?.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(n) = parse_counter(file_name, name, extension) {
            next = next.max(n + 1);
        }
    }
    Ok(next)
}

fn parse_counter(file_name: &str, name: &str, extension: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(name)?
        .strip_prefix('_')?
        .strip_suffix(extension)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
