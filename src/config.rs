//! Run configuration from command-line flags, environment and defaults.

use std::path::PathBuf;

use crate::features::Compat;

pub const DEFAULT_INPUT_DIR: &str = "data/raw_data";
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed_data";

/// Settings of one preprocessing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub gzip: bool,
    pub compat: Compat,
}

impl RunConfig {
    /// Flags win over `SURVEY_INPUT_DIR` / `SURVEY_OUTPUT_DIR`, which win over
    /// the defaults.
    pub fn from_env(
        input_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        gzip: bool,
        fix_known_defects: bool,
    ) -> Self {
        Self::resolve_with(
            |key| std::env::var(key).ok(),
            input_dir,
            output_dir,
            gzip,
            fix_known_defects,
        )
    }

    /// Same as [`RunConfig::from_env`] with an explicit variable lookup.
    pub fn resolve_with(
        lookup: impl Fn(&str) -> Option<String>,
        input_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        gzip: bool,
        fix_known_defects: bool,
    ) -> Self {
        let pick = |flag: Option<PathBuf>, var: &str, default: &str| {
            flag.or_else(|| lookup(var).filter(|v| !v.is_empty()).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            input_dir: pick(input_dir, "SURVEY_INPUT_DIR", DEFAULT_INPUT_DIR),
            output_dir: pick(output_dir, "SURVEY_OUTPUT_DIR", DEFAULT_OUTPUT_DIR),
            gzip,
            compat: if fix_known_defects {
                Compat::Corrected
            } else {
                Compat::Legacy
            },
        }
    }
}
