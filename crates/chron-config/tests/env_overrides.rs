//! Environment variables layered over files and defaults.

use chron_config::{ChronConfig, FieldList};
use chron_core::enums::RequiredField;
use figment::Jail;
use pretty_assertions::assert_eq;

#[test]
fn env_var_overrides_default() {
    Jail::expect_with(|jail| {
        jail.set_env("CHRONICLE_DATABASE__PATH", "/tmp/from-env.db");

        let config = ChronConfig::load().expect("config loads");
        assert_eq!(config.database.path, "/tmp/from-env.db");
        Ok(())
    });
}

#[test]
fn env_var_overrides_project_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".chronicle")?;
        jail.create_file(
            ".chronicle/config.toml",
            r#"
[audit]
omit = "password"

[database]
path = "from-toml.db"
"#,
        )?;
        jail.set_env("CHRONICLE_AUDIT__OMIT", "secret");

        let config = ChronConfig::load().expect("config loads");
        // Env wins for the key it sets...
        assert_eq!(config.audit.omit, FieldList::One("secret".into()));
        // ...and the TOML value for everything else survives.
        assert_eq!(config.database.path, "from-toml.db");
        Ok(())
    });
}

#[test]
fn env_var_can_set_required_fields() {
    Jail::expect_with(|jail| {
        jail.set_env("CHRONICLE_AUDIT__REQUIRED", "[actor, reason]");

        let config = ChronConfig::load().expect("config loads");
        assert_eq!(
            config.audit.required,
            vec![RequiredField::Actor, RequiredField::Reason]
        );
        Ok(())
    });
}

/// Typo'd keys are silently ignored by figment; the default stays in place.
#[test]
fn typo_env_var_silently_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("CHRONICLE_DATABASE__PAHT", "/tmp/typo.db");

        let config = ChronConfig::load().expect("config loads");
        assert_eq!(config.database.path, ".chronicle/audit.db");
        Ok(())
    });
}
