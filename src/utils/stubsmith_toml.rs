//! Load `.stubsmith.toml` (CLI only). The library takes its settings through [`Opts`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StubsmithToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    output_dir: Option<String>,
    read: Option<usize>,
    transform: Option<usize>,
    write: Option<usize>,
    retries: Option<u32>,
    strict: Option<bool>,
    verbose: Option<bool>,
    extension: Option<String>,
}

fn parse(path: &Path, text: &str) -> Result<StubsmithToml> {
    toml::from_str(text).with_context(|| format!("parse {}", path.display()))
}

/// Result of looking for a config file.
#[derive(Debug)]
pub(crate) enum LoadedConfig {
    Absent,
    File(StubsmithToml),
    /// The implicit file exists but does not parse. The caller reports it once logging is up.
    Unparsable(anyhow::Error),
}

/// Load the config file.
///
/// With `explicit`, the file must exist and parse. Otherwise `.stubsmith.toml` is looked up
/// in `dir`; a missing file is [`LoadedConfig::Absent`] and an unparsable one is returned as
/// [`LoadedConfig::Unparsable`] so the run can go on with defaults.
pub(crate) fn load_stubsmith_toml(explicit: Option<&Path>, dir: &Path) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        return parse(path, &text).map(LoadedConfig::File);
    }
    let path = dir.join(PackagePaths::get().config_filename());
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Ok(LoadedConfig::Absent);
    };
    Ok(match parse(&path, &text) {
        Ok(file) => LoadedConfig::File(file),
        Err(e) => LoadedConfig::Unparsable(e),
    })
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $target:expr, $field:ident => $target_field:ident) => {
        if let Some(v) = $section.$field {
            $target.$target_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub(crate) fn apply_file_to_opts(file: &StubsmithToml, opts: &mut Opts) {
    let s = &file.settings;
    if let Some(ref p) = s.output_dir {
        opts.output_dir = PathBuf::from(p);
    }
    apply_file_opt!(s, opts.budget, read => read);
    apply_file_opt!(s, opts.budget, transform => transform);
    apply_file_opt!(s, opts.budget, write => write);
    apply_file_opt!(s, opts.retry, retries => max_retries);
    apply_file_opt!(s, opts, strict => strict);
    apply_file_opt!(s, opts, verbose => verbose);
    if let Some(ref ext) = s.extension {
        opts.extension = ext.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let file: StubsmithToml = toml::from_str(
            "[settings]\noutput_dir = \"out\"\nread = 3\nwrite = 1\nretries = 2\nstrict = true\n",
        )
        .unwrap();
        let mut opts = Opts::default();
        let transform_before = opts.budget.transform;
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.output_dir, PathBuf::from("out"));
        assert_eq!(opts.budget.read, 3);
        assert_eq!(opts.budget.write, 1);
        assert_eq!(opts.budget.transform, transform_before);
        assert_eq!(opts.retry.max_retries, 2);
        assert!(opts.strict);
        assert_eq!(opts.extension, "cs");
    }

    #[test]
    fn missing_default_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_stubsmith_toml(None, dir.path()).unwrap(),
            LoadedConfig::Absent
        ));
        assert!(load_stubsmith_toml(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn broken_default_file_is_returned_not_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".stubsmith.toml"), "[settings\nread = ").unwrap();
        match load_stubsmith_toml(None, dir.path()).unwrap() {
            LoadedConfig::Unparsable(e) => assert!(format!("{e:#}").contains(".stubsmith.toml")),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn default_file_is_found_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".stubsmith.toml"),
            "[settings]\nextension = \"csx\"\n",
        )
        .unwrap();
        let LoadedConfig::File(file) = load_stubsmith_toml(None, dir.path()).unwrap() else {
            panic!("config file not loaded");
        };
        let mut opts = Opts::default();
        apply_file_to_opts(&file, &mut opts);
        assert_eq!(opts.extension, "csx");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<StubsmithToml>("[settings]\nthreads = 4\n").is_err());
    }
}
