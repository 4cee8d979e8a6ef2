use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default pdes data directory: ~/.pdes
pub fn get_pdes_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".pdes"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.pdes/config.toml (highest)
    let pdes_dir = get_pdes_data_dir()?;
    let user_config = pdes_dir.join("config.toml");

    // Priority 2: ./pdes.toml (current directory)
    let local_config = Path::new("pdes.toml");

    let cfg: AppConfig = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    finalize(cfg, &pdes_dir)
}

/// Load an explicit config file, or fall back to [`load_default`].
/// Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let cfg = load_from_path(path)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
            finalize(cfg, &get_pdes_data_dir()?)
        }
        None => load_default(),
    }
}

fn finalize(mut cfg: AppConfig, pdes_dir: &Path) -> anyhow::Result<AppConfig> {
    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        cfg.logging.directory = Some(pdes_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;

    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
pub(crate) fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("PDES_RUNS") {
        cfg.monte_carlo.runs = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("PDES_RUNS={v}: {e}"))?;
    }
    if let Some(v) = get("PDES_SEED") {
        let seed: u64 = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("PDES_SEED={v}: {e}"))?;
        cfg.simulation.seed = seed;
        cfg.monte_carlo.base_seed = seed;
    }
    if let Some(v) = get("PDES_ALLOCATION_POLICY") {
        cfg.simulation.allocation_policy = v.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(v) = get("PDES_OUTPUT_DIR") {
        cfg.monte_carlo.output_dir = Some(v);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::AllocationPolicy;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [simulation]
            allocation_policy = "single-resource"

            [monte_carlo]
            runs = 50
            "#,
        )
        .unwrap();

        assert_eq!(cfg.simulation.allocation_policy, AllocationPolicy::SingleResource);
        assert_eq!(cfg.simulation.max_ticks, Some(100_000));
        assert!(cfg.simulation.strict_probability_order);
        assert_eq!(cfg.monte_carlo.runs, 50);
        assert!(cfg.report.utf8_bom);
        assert_eq!(cfg.concurrency.strategy, "fixed");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PDES_RUNS", "12"),
            ("PDES_SEED", "99"),
            ("PDES_ALLOCATION_POLICY", "multi-task"),
            ("PDES_OUTPUT_DIR", " "),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.monte_carlo.runs, 12);
        assert_eq!(cfg.simulation.seed, 99);
        assert_eq!(cfg.monte_carlo.base_seed, 99);
        assert_eq!(cfg.simulation.allocation_policy, AllocationPolicy::MultiTask);
        assert_eq!(cfg.monte_carlo.output_dir, None);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, |k| {
            (k == "PDES_RUNS").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("PDES_RUNS"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdes.toml");
        std::fs::write(&path, "[report]\ntime_scale = 8.0\nutf8_bom = false\n").unwrap();

        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.report.time_scale, 8.0);
        assert!(!cfg.report.utf8_bom);
        assert_eq!(cfg.report.output_format, "text");
    }
}
