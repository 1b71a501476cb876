//! Include resolver: nested configuration files, wildcard expansion,
//! canonical-path dedup.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::reader::ConfigElement;
use crate::wildcard::{has_wildcard, wildcard_match};

use super::ConfigCompiler;

impl ConfigCompiler {
    /// `include` element. The reference is variable-expanded first and
    /// resolved relative to the including file's directory. A reference
    /// that is neither an existing file nor a wildcard is fatal, unless the
    /// element opts out with `ignore_errors = true`.
    pub(crate) fn parse_include(
        &mut self,
        node: &ConfigElement,
        base_dir: Option<&Path>,
    ) -> ConfigResult<()> {
        let raw = node.required_attribute("file")?;
        let reference = self.variables.expand(raw);
        let ignore_errors = node.bool_attribute("ignore_errors")?.unwrap_or(false);

        match self.resolve_include(&reference, base_dir) {
            Ok(()) => Ok(()),
            Err(error) if ignore_errors => {
                tracing::warn!(file = %reference, %error, "include failed, ignored by request");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn resolve_include(&mut self, reference: &str, base_dir: Option<&Path>) -> ConfigResult<()> {
        let mut path = PathBuf::from(reference);
        if path.is_relative() {
            if let Some(base) = base_dir {
                path = base.join(path);
            }
        }

        if path.is_file() {
            return self.include_file(&path);
        }

        let mask = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        if has_wildcard(&mask) {
            return self.include_matching(&path, &mask);
        }

        Err(ConfigError::Include {
            path: path.display().to_string(),
            reason: "file not found".to_string(),
        })
    }

    /// Wildcard form: include every matching file in the directory. A
    /// missing directory or zero matches is not an error.
    fn include_matching(&mut self, path: &Path, mask: &str) -> ConfigResult<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let dir = dir.unwrap_or_else(|| Path::new("."));
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                tracing::debug!(dir = %dir.display(), "include directory missing, nothing to include");
                return Ok(());
            }
        };

        let mask = mask.to_lowercase();
        let mut matches: Vec<PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let candidate = entry.path();
            if !candidate.is_file() {
                continue;
            }
            let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if wildcard_match(&mask, &name.to_lowercase()) {
                matches.push(candidate);
            }
        }
        matches.sort();

        tracing::debug!(dir = %dir.display(), mask = %mask, count = matches.len(), "wildcard include");
        for file in matches {
            self.include_file(&file)?;
        }
        Ok(())
    }

    /// Read, dedup and dispatch one configuration file. Re-including the
    /// same canonical path (directly or transitively) is a silent no-op,
    /// which is also what breaks include cycles.
    pub(crate) fn include_file(&mut self, path: &Path) -> ConfigResult<()> {
        let canonical = fs::canonicalize(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !self.sources.register(canonical.clone()) {
            tracing::debug!(path = %canonical.display(), "already included, skipping");
            return Ok(());
        }

        tracing::info!(path = %canonical.display(), "reading configuration");
        let text = fs::read_to_string(&canonical).map_err(|source| ConfigError::Io {
            path: canonical.clone(),
            source,
        })?;
        self.parse_text(&text, Some(&canonical))
            .map_err(|e| ConfigError::with_source(canonical.display().to_string(), e))
    }
}
