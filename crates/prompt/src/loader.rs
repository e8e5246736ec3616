//! Reads the two mandatory identity files and concatenates them into one
//! base system prompt.
//!
//! Deliberately uncached: every call re-reads both files from disk, so a
//! live edit to `SOUL.md`/`AGENT.md` between sessions takes effect on the
//! very next LLM call without restarting the process.

use std::path::{Path, PathBuf};

use crate::error::PromptError;

/// Loads and concatenates the two identity files the engine treats as
/// opaque personality text.
#[derive(Debug, Clone)]
pub struct PromptLoader {
    soul_path: PathBuf,
    agent_path: PathBuf,
}

impl PromptLoader {
    pub fn new(soul_path: impl Into<PathBuf>, agent_path: impl Into<PathBuf>) -> Self {
        Self { soul_path: soul_path.into(), agent_path: agent_path.into() }
    }

    /// Read both files and concatenate their contents with a blank line
    /// separator.
    pub fn load(&self) -> Result<String, PromptError> {
        let soul = read_mandatory(&self.soul_path)?;
        let agent = read_mandatory(&self.agent_path)?;
        Ok(format!("{soul}\n\n{agent}"))
    }
}

fn read_mandatory(path: &Path) -> Result<String, PromptError> {
    std::fs::read_to_string(path).map_err(|_| PromptError::Missing(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_both_files_with_blank_line_separator() {
        let dir = tempfile::tempdir().unwrap();
        let soul = dir.path().join("SOUL.md");
        let agent = dir.path().join("AGENT.md");
        std::fs::write(&soul, "I am helpful.").unwrap();
        std::fs::write(&agent, "I write Rust.").unwrap();

        let loader = PromptLoader::new(&soul, &agent);
        assert_eq!(loader.load().unwrap(), "I am helpful.\n\nI write Rust.");
    }

    #[test]
    fn missing_soul_file_is_identity_missing() {
        let dir = tempfile::tempdir().unwrap();
        let agent = dir.path().join("AGENT.md");
        std::fs::write(&agent, "I write Rust.").unwrap();

        let loader = PromptLoader::new(dir.path().join("SOUL.md"), &agent);
        let err = loader.load().unwrap_err();
        assert_eq!(err.kind(), agentic_types::ErrorKind::IdentityMissing);
    }

    #[test]
    fn missing_agent_file_is_identity_missing() {
        let dir = tempfile::tempdir().unwrap();
        let soul = dir.path().join("SOUL.md");
        std::fs::write(&soul, "I am helpful.").unwrap();

        let loader = PromptLoader::new(&soul, dir.path().join("AGENT.md"));
        assert!(loader.load().is_err());
    }

    #[test]
    fn is_a_pure_function_of_current_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let soul = dir.path().join("SOUL.md");
        let agent = dir.path().join("AGENT.md");
        std::fs::write(&soul, "v1").unwrap();
        std::fs::write(&agent, "v1").unwrap();

        let loader = PromptLoader::new(&soul, &agent);
        assert_eq!(loader.load().unwrap(), "v1\n\nv1");

        std::fs::write(&soul, "v2").unwrap();
        assert_eq!(loader.load().unwrap(), "v2\n\nv1", "no caching — the next load sees the edit");
    }
}
