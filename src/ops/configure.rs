//! Workspace configuration operations.

use std::path::Path;

use anyhow::{anyhow, bail, Result};

use crate::core::parameter::{ParamValue, ParameterRegistry};
use crate::core::Workspace;
use crate::resolver::ConfiguredTree;
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;
use crate::util::GlobalContext;

/// Options for a configuration pass.
#[derive(Debug, Clone, Default)]
pub struct ConfigureOptions {
    /// `-P name=value` overrides, in command-line order
    pub overrides: Vec<(String, String)>,

    /// Restrict the pass to these modules (empty = all)
    pub modules: Vec<String>,
}

/// Parse a `name=value` override.
pub fn parse_override(s: &str) -> Result<(String, String)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid parameter override `{}`, expected NAME=VALUE", s))?;

    let name = name.trim();
    if name.is_empty() {
        bail!("invalid parameter override `{}`: empty parameter name", s);
    }

    Ok((name.to_string(), value.to_string()))
}

/// Load a workspace and apply every override source.
pub fn load_workspace(
    ctx: &GlobalContext,
    manifest_path: &Path,
    overrides: &[(String, String)],
) -> Result<Workspace> {
    let mut ws = Workspace::new(manifest_path)?;
    let config = ctx.load_config(ws.root())?;

    apply_overrides(
        ws.params_mut(),
        &config,
        |key| std::env::var(key).ok(),
        overrides,
    )?;

    tracing::debug!(
        "loaded workspace `{}` with {} module(s)",
        ws.name(),
        ws.modules().len()
    );
    Ok(ws)
}

/// Apply parameter overrides, lowest precedence first.
///
/// Config file values come first, then `KEEL_PARAM_*` environment variables,
/// then command-line overrides. Config files may name parameters the
/// workspace does not declare; those entries are skipped. Unknown names on
/// the command line are errors.
pub fn apply_overrides<F>(
    params: &mut ParameterRegistry,
    config: &Config,
    env: F,
    cli: &[(String, String)],
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for (name, value) in &config.parameters {
        if params.get(name).is_none() {
            tracing::debug!("ignoring config value for undeclared parameter `{}`", name);
            continue;
        }

        let value = ParamValue::from_toml(value).ok_or_else(|| {
            anyhow!(
                "config value for parameter `{}` must be a string, integer or boolean",
                name
            )
        })?;
        params.set_override(name, value)?;
    }

    params.apply_env(env)?;

    for (name, raw) in cli {
        tracing::debug!("parameter `{}` set on the command line", name);
        params.set_override_str(name, raw)?;
    }

    Ok(())
}

/// Configure the workspace, or the selected modules of it.
pub fn configure_workspace(ws: &Workspace, opts: &ConfigureOptions) -> Result<ConfiguredTree> {
    let tree = if opts.modules.is_empty() {
        ws.configure()?
    } else {
        for name in &opts.modules {
            if ws.module(name).is_none() {
                bail!(
                    "no module named `{}` in workspace `{}`\n{}",
                    name,
                    ws.name(),
                    suggestions::MODULE_NOT_FOUND
                );
            }
        }
        let names: Vec<&str> = opts.modules.iter().map(String::as_str).collect();
        ws.configure_only(&names)?
    };

    tracing::info!("configured {} module(s)", tree.len());
    Ok(tree)
}

/// Run structural validation over every module.
///
/// Returns the number of modules checked.
pub fn check_workspace(ws: &Workspace) -> Result<usize> {
    ws.check()?;
    tracing::info!("checked {} module(s)", ws.modules().len());
    Ok(ws.modules().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameter::{ParamType, Parameter};
    use crate::resolver::ConfigureError;
    use tempfile::TempDir;

    fn registry() -> ParameterRegistry {
        let mut reg = ParameterRegistry::new();
        reg.declare(Parameter::new("javaToolchainVersion", ParamType::Integer))
            .unwrap();
        reg.declare(Parameter::new("heap", ParamType::String).with_default("2G"))
            .unwrap();
        reg
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("javaToolchainVersion=21").unwrap(),
            ("javaToolchainVersion".to_string(), "21".to_string())
        );
        assert_eq!(
            parse_override("args=-Xmx=2G").unwrap(),
            ("args".to_string(), "-Xmx=2G".to_string())
        );
        assert!(parse_override("javaToolchainVersion").is_err());
        assert!(parse_override("=21").is_err());
    }

    #[test]
    fn test_override_precedence() {
        let mut reg = registry();
        let mut config = Config::default();
        config
            .parameters
            .insert("javaToolchainVersion".into(), toml::Value::Integer(11));
        config.parameters.insert("heap".into(), "1G".into());

        let env = |key: &str| (key == "KEEL_PARAM_JAVA_TOOLCHAIN_VERSION").then(|| "17".to_string());
        let cli = vec![("javaToolchainVersion".to_string(), "21".to_string())];

        apply_overrides(&mut reg, &config, env, &cli).unwrap();

        assert_eq!(reg.resolve_as::<i64>("javaToolchainVersion").unwrap(), 21);
        assert_eq!(reg.resolve_as::<String>("heap").unwrap(), "1G");
    }

    #[test]
    fn test_env_beats_config() {
        let mut reg = registry();
        let mut config = Config::default();
        config
            .parameters
            .insert("javaToolchainVersion".into(), toml::Value::Integer(11));

        let env = |key: &str| (key == "KEEL_PARAM_JAVA_TOOLCHAIN_VERSION").then(|| "17".to_string());
        apply_overrides(&mut reg, &config, env, &[]).unwrap();

        assert_eq!(reg.resolve_as::<i64>("javaToolchainVersion").unwrap(), 17);
    }

    #[test]
    fn test_undeclared_config_entries_skipped() {
        let mut reg = registry();
        let mut config = Config::default();
        config.parameters.insert("otherProject".into(), true.into());

        apply_overrides(&mut reg, &config, |_| None, &[]).unwrap();
        assert!(!reg.is_overridden("otherProject"));
    }

    #[test]
    fn test_unknown_cli_override_fails() {
        let mut reg = registry();
        let cli = vec![("nope".to_string(), "1".to_string())];

        let err = apply_overrides(&mut reg, &Config::default(), |_| None, &cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigureError>(),
            Some(ConfigureError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_configure_selected_module() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("Keel.toml"),
            "[workspace]\nmembers = [\"core\", \"data\"]\n",
        )
        .unwrap();
        for name in ["core", "data"] {
            std::fs::create_dir_all(tmp.path().join(name)).unwrap();
            std::fs::write(
                tmp.path().join(name).join(format!("{}.build.toml", name)),
                "conventions = [\"java-library-conventions\"]\n",
            )
            .unwrap();
        }

        let ws = Workspace::new(&tmp.path().join("Keel.toml")).unwrap();
        let opts = ConfigureOptions {
            modules: vec!["data".to_string()],
            ..Default::default()
        };
        let tree = configure_workspace(&ws, &opts).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get("data").is_some());

        let opts = ConfigureOptions {
            modules: vec!["missing".to_string()],
            ..Default::default()
        };
        let err = configure_workspace(&ws, &opts).unwrap_err();
        assert!(err.to_string().contains("no module named `missing`"));

        assert_eq!(check_workspace(&ws).unwrap(), 2);
    }
}
