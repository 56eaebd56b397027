//! Line normalization: noise removal, token repair and continuation merging.

use regex::Regex;
use tracing::{debug, trace};

use super::rules::is_record_start;
use super::rules::patterns::{
    DASHED_PAGE_NUMBER, FOOTER, GLUED_LEADING_NUMBER, PAGE_FRACTION, PAGE_MARKER,
};
use crate::error::ConversionError;
use crate::models::config::NormalizeConfig;

/// Cleans a raw line sequence before layout detection.
///
/// Lines are never reordered: they are trimmed, repaired, dropped as noise,
/// or (in merge mode) appended to the preceding record line.
#[derive(Debug, Clone)]
pub struct LineNormalizer {
    repair_tokens: bool,
    extra_noise: Vec<Regex>,
}

impl LineNormalizer {
    /// Create a normalizer with the built-in noise patterns only.
    pub fn new() -> Self {
        Self {
            repair_tokens: true,
            extra_noise: Vec::new(),
        }
    }

    /// Build a normalizer from configuration.
    pub fn from_config(config: &NormalizeConfig) -> Result<Self, ConversionError> {
        let mut normalizer = Self::new().with_token_repair(config.repair_tokens);
        for pattern in &config.extra_noise_patterns {
            normalizer = normalizer.with_noise_pattern(pattern)?;
        }
        Ok(normalizer)
    }

    /// Set leading-number token repair.
    pub fn with_token_repair(mut self, repair: bool) -> Self {
        self.repair_tokens = repair;
        self
    }

    /// Add a noise pattern; matching lines are dropped.
    pub fn with_noise_pattern(mut self, pattern: &str) -> Result<Self, ConversionError> {
        let regex = Regex::new(pattern).map_err(|e| ConversionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.extra_noise.push(regex);
        Ok(self)
    }

    /// Strip, filter noise and repair tokens. Never merges.
    pub fn normalize<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        let mut lines = Vec::with_capacity(raw.len());

        for line in raw {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }

            if self.is_noise(line) {
                trace!("Dropping noise line {:?}", line);
                continue;
            }

            lines.push(self.repair(line));
        }

        debug!("Normalized {} raw lines into {} lines", raw.len(), lines.len());
        lines
    }

    /// Normalize and merge continuation lines until the result is stable.
    ///
    /// A merged line can itself read as noise or stop being a record start
    /// ("1" + "200 szt." is a bare quantity), so normalizing and merging are
    /// repeated until a pass changes nothing. Every pass that changes the
    /// lines also shortens them, which bounds the loop.
    pub fn normalize_merged<S: AsRef<str>>(&self, raw: &[S]) -> Vec<String> {
        let mut lines = self.merge_continuations(&self.normalize(raw));

        loop {
            let next = self.merge_continuations(&self.normalize(&lines));
            if next == lines {
                return lines;
            }
            debug!("Merged lines changed on another pass ({} -> {})", lines.len(), next.len());
            lines = next;
        }
    }

    /// Append every line that does not open a record to the line before it.
    ///
    /// A single pass; a continuation with no preceding line is kept on its
    /// own. Use [`LineNormalizer::normalize_merged`] for a stable result.
    pub fn merge_continuations<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let mut merged: Vec<String> = Vec::with_capacity(lines.len());

        for line in lines {
            let line = line.as_ref();
            if is_record_start(line) {
                merged.push(line.to_string());
                continue;
            }

            match merged.last_mut() {
                Some(previous) => {
                    trace!("Merging continuation {:?}", line);
                    previous.push(' ');
                    previous.push_str(line);
                }
                None => merged.push(line.to_string()),
            }
        }

        debug!("Merged {} lines into {} records", lines.len(), merged.len());
        merged
    }

    /// Whether a trimmed line is pagination or footer noise.
    pub fn is_noise(&self, line: &str) -> bool {
        PAGE_MARKER.is_match(line)
            || DASHED_PAGE_NUMBER.is_match(line)
            || PAGE_FRACTION.is_match(line)
            || FOOTER.is_match(line)
            || self.extra_noise.iter().any(|re| re.is_match(line))
    }

    fn repair(&self, line: &str) -> String {
        if self.repair_tokens {
            GLUED_LEADING_NUMBER.replace(line, "$1 $2").into_owned()
        } else {
            line.to_string()
        }
    }
}

impl Default for LineNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
