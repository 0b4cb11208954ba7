//! `ebs-snapshot init`: write a commented starter `snapshot.toml`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use crate::config::{
    default_aws_bin, default_max_age_days, default_min_interval_hours, default_region,
};

/// Render the starter config.  Every value is the built-in default, so the
/// file documents the behaviour without changing it.
pub fn template() -> String {
    format!(
        r#"# ebs-snapshot configuration
#
# Values here override ~/.config/ebs-snapshot/config.toml.

[provider]
region  = "{region}"
aws_bin = "{aws_bin}"
# profile      = "backups"
# endpoint_url = "http://localhost:4566"

[policy]
# Skip a volume if it has an AutoPrune snapshot younger than this.
min_interval_hours = {min_interval}
# Delete AutoPrune snapshots older than this.
max_age_days       = {max_age}
"#,
        region = default_region(),
        aws_bin = default_aws_bin(),
        min_interval = default_min_interval_hours(),
        max_age = default_max_age_days(),
    )
}

/// Write [`template`] to `path`, refusing to overwrite an existing file.
pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        bail!(
            "{} already exists, refusing to overwrite it",
            path.display()
        );
    }

    std::fs::write(path, template()).with_context(|| format!("writing {}", path.display()))?;

    println!(
        "  {}  wrote {}",
        style("✓").green().bold(),
        style(path.display()).bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses_to_defaults() {
        let cfg: Config = toml::from_str(&template()).expect("template must be valid TOML");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn run_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.toml");
        run(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), template());
    }

    #[test]
    fn run_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.toml");
        std::fs::write(&path, "# existing").unwrap();

        let err = run(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# existing");
    }
}
