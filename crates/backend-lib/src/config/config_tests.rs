// ============================
// crates/backend-lib/src/config/config_tests.rs
// ============================
use super::*;
use figment::providers::Toml;
use tempfile::tempdir;

const MINIMAL: &str = r#"
    [jwt]
    secret = "test-secret"
    access_ttl_secs = 900
    refresh_ttl_secs = 86400
"#;

fn from_toml(toml: &str) -> Result<Settings, SettingsError> {
    Settings::from_figment(Figment::new().merge(Toml::string(toml)))
}

#[test]
fn test_defaults_fill_optional_sections() {
    let settings = from_toml(MINIMAL).unwrap();

    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.storage.path, PathBuf::from("data"));
    assert_eq!(settings.redis.connect_timeout_secs, 5);
    assert_eq!(settings.log.level, "info");
    assert!(!settings.log.json);
    assert!(settings.bootstrap_admin.is_none());
    assert_eq!(settings.jwt.access_ttl(), Duration::from_secs(900));
    assert_eq!(settings.jwt.refresh_ttl(), Duration::from_secs(86400));
}

#[test]
fn test_missing_jwt_section_is_an_error() {
    let err = from_toml("[server]\nport = 9000\n").unwrap_err();
    assert!(matches!(err, SettingsError::Load(_)));
}

#[test]
fn test_missing_lifetime_is_an_error() {
    let err = from_toml(
        r#"
        [jwt]
        secret = "s"
        access_ttl_secs = 900
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, SettingsError::Load(_)));
}

#[test]
fn test_unparseable_lifetime_is_an_error() {
    let err = from_toml(
        r#"
        [jwt]
        secret = "s"
        access_ttl_secs = "fifteen minutes"
        refresh_ttl_secs = 86400
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, SettingsError::Load(_)));
}

#[test]
fn test_zero_lifetime_is_rejected() {
    let err = from_toml(
        r#"
        [jwt]
        secret = "s"
        access_ttl_secs = 0
        refresh_ttl_secs = 86400
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(_)));
}

#[test]
fn test_empty_secret_is_rejected() {
    let err = from_toml(
        r#"
        [jwt]
        secret = "   "
        access_ttl_secs = 900
        refresh_ttl_secs = 86400
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(_)));
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let toml = format!("{MINIMAL}\n[log]\nlevel = \"loud\"\n");
    assert!(matches!(from_toml(&toml), Err(SettingsError::Invalid(_))));
}

#[test]
fn test_bind_addr() {
    let toml = format!("{MINIMAL}\n[server]\nhost = \"0.0.0.0\"\nport = 3000\n");
    let settings = from_toml(&toml).unwrap();
    assert_eq!(settings.bind_addr().unwrap().to_string(), "0.0.0.0:3000");
}

#[test]
fn test_secret_is_not_printed() {
    let settings = from_toml(MINIMAL).unwrap();
    assert!(!format!("{settings:?}").contains("test-secret"));
}

#[test]
fn test_load_from_file() {
    // Jail serializes against the tests that set MEDIKA_* variables
    figment::Jail::expect_with(|_jail| {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
            [server]
            host = "192.168.1.1"
            port = 8888

            [storage]
            path = "test_data"

            [jwt]
            secret = "file-secret"
            access_ttl_secs = 60
            refresh_ttl_secs = 120

            [bootstrap_admin]
            name = "Root"
            email = "root@example.com"
            password = "RootPass1!"
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.server.host, "192.168.1.1");
        assert_eq!(settings.server.port, 8888);
        assert_eq!(settings.storage.path, PathBuf::from("test_data"));
        assert_eq!(settings.jwt.access_ttl_secs, 60);
        let admin = settings.bootstrap_admin.unwrap();
        assert_eq!(admin.email, "root@example.com");
        Ok(())
    });
}

const FILE: &str = r#"
    [jwt]
    secret = "file-secret"
    access_ttl_secs = 900
    refresh_ttl_secs = 86400
"#;

#[test]
fn test_env_overrides_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", FILE)?;
        jail.set_env("MEDIKA_JWT__ACCESS_TTL_SECS", "120");
        jail.set_env("MEDIKA_SERVER__PORT", "9090");

        let settings = Settings::load_from("config.toml").expect("settings load");
        assert_eq!(settings.jwt.access_ttl(), Duration::from_secs(120));
        assert_eq!(settings.jwt.refresh_ttl(), Duration::from_secs(86400));
        assert_eq!(settings.jwt.secret, "file-secret");
        assert_eq!(settings.server.port, 9090);
        Ok(())
    });
}

#[test]
fn test_env_supplies_missing_secret() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [jwt]
            access_ttl_secs = 900
            refresh_ttl_secs = 86400
            "#,
        )?;
        jail.set_env("MEDIKA_JWT__SECRET", "env-secret");

        let settings = Settings::load_from("config.toml").expect("settings load");
        assert_eq!(settings.jwt.secret, "env-secret");
        Ok(())
    });
}

#[test]
fn test_unparseable_env_lifetime_is_an_error() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", FILE)?;
        jail.set_env("MEDIKA_JWT__REFRESH_TTL_SECS", "abc");

        let err = Settings::load_from("config.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)), "{err}");
        Ok(())
    });
}

#[test]
fn test_unprefixed_env_is_ignored() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", FILE)?;
        jail.set_env("JWT__ACCESS_TTL_SECS", "1");

        let settings = Settings::load_from("config.toml").expect("settings load");
        assert_eq!(settings.jwt.access_ttl_secs, 900);
        Ok(())
    });
}
