use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Text file holding the best score as a single integer.
#[derive(Clone, Debug)]
pub(crate) struct BestScoreFile {
    path: PathBuf,
}

impl BestScoreFile {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored score. A missing file counts as zero.
    pub(crate) fn load(&self) -> Result<u64> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(0),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        contents
            .trim()
            .parse()
            .with_context(|| format!("{} does not hold a score", self.path.display()))
    }

    pub(crate) fn store(&self, score: u64) -> Result<()> {
        fs::write(&self.path, format!("{score}\n"))
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> BestScoreFile {
        let path = std::env::temp_dir().join(format!(
            "tint-tap-best-{}-{name}.txt",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        BestScoreFile::new(path)
    }

    #[test]
    fn missing_file_reads_as_zero() {
        let file = scratch("missing");
        assert_eq!(file.load().expect("missing file is fine"), 0);
    }

    #[test]
    fn stored_score_is_read_back() {
        let file = scratch("stored");
        file.store(4_210).expect("write score");

        assert_eq!(file.load().expect("read score"), 4_210);
        let _ = fs::remove_file(file.path());
    }

    #[test]
    fn garbage_is_reported() {
        let file = scratch("garbage");
        fs::write(file.path(), "lots\n").expect("write garbage");

        assert!(file.load().is_err());
        let _ = fs::remove_file(file.path());
    }
}
