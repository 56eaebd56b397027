//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod convert;
pub mod inspect;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ordex_core::{Converter, DocumentSession, OrdexConfig};
use tracing::{debug, warn};

/// Load the configuration given with `--config`, else the user config file
/// if one exists, else the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<OrdexConfig> {
    if let Some(path) = config_path {
        return Ok(OrdexConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(OrdexConfig::from_file(&default_path)?)
    } else {
        Ok(OrdexConfig::default())
    }
}

/// Kind of input document, by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Text,
}

impl InputKind {
    pub fn of(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "txt" | "text" => Some(InputKind::Text),
            _ => None,
        }
    }
}

/// Convert one input file.
pub fn convert_file(converter: &Converter, path: &Path) -> anyhow::Result<DocumentSession> {
    match InputKind::of(path) {
        Some(InputKind::Pdf) => {
            let data = fs::read(path)?;
            Ok(converter.convert_pdf(&data)?)
        }
        Some(InputKind::Text) => {
            let text = fs::read_to_string(path)?;
            Ok(converter.convert_text(&text)?)
        }
        None => anyhow::bail!("Unsupported file format: {}", path.display()),
    }
}

/// Hands out output paths in one directory, never the same name twice.
///
/// Inputs normally map to `<stem>.<ext>`. When that name is taken, by
/// `x.pdf` and `x.txt` or by `a/x.pdf` and `b/x.pdf`, the input's full file
/// name is kept (`x.txt.<ext>`), then a counter is appended.
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, dir: &Path, input: &Path, extension: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("order");
        let file_name = input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(stem);

        let preferred = format!("{}.{}", stem, extension);
        let name = [preferred.clone(), format!("{}.{}", file_name, extension)]
            .into_iter()
            .chain((2..).map(|n| format!("{}-{}.{}", file_name, n, extension)))
            .find(|name| !self.used.contains(name))
            .unwrap_or(preferred.clone());

        if name != preferred {
            warn!(
                "{} is already used, writing {} as {}",
                preferred,
                input.display(),
                name
            );
        }

        self.used.insert(name.clone());
        dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_are_unique() {
        let dir = Path::new("out");
        let mut names = OutputNames::new();

        assert_eq!(names.claim(dir, Path::new("a/x.pdf"), "xlsx"), dir.join("x.xlsx"));
        assert_eq!(names.claim(dir, Path::new("a/x.txt"), "xlsx"), dir.join("x.txt.xlsx"));
        assert_eq!(names.claim(dir, Path::new("b/x.txt"), "xlsx"), dir.join("x.txt-2.xlsx"));
        assert_eq!(names.claim(dir, Path::new("b/y.pdf"), "xlsx"), dir.join("y.xlsx"));
    }
}
