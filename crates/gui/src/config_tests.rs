use super::*;

const FULL: &str = r#"
[engine]
path = "/opt/engines/stockfish"
args = ["--quiet"]
move_time_ms = 250
depth = 10
handshake_timeout_ms = 1000

[engine.options]
Threads = "2"
Hash = "64"

[game]
human_color = "black"
engine_delay_ms = 300
"#;

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("chess_gui_config_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_full_file() {
    let settings = Config::parse(FULL).unwrap().into_settings().unwrap();

    assert_eq!(settings.engine.path, PathBuf::from("/opt/engines/stockfish"));
    assert_eq!(settings.engine.args, vec!["--quiet".to_string()]);
    assert_eq!(settings.engine.handshake_timeout, Duration::from_secs(1));
    assert_eq!(
        settings.engine.options,
        vec![
            ("Hash".to_string(), "64".to_string()),
            ("Threads".to_string(), "2".to_string()),
        ]
    );
    assert_eq!(
        settings.limits,
        SearchLimits::depth_and_time(10, Duration::from_millis(250))
    );
    assert_eq!(settings.human, Color::Black);
    assert_eq!(settings.engine_delay, Duration::from_millis(300));
}

#[test]
fn test_defaults_match_classic_timings() {
    let settings = Config::parse("[engine]\npath = \"sf\"\n")
        .unwrap()
        .into_settings()
        .unwrap();

    assert_eq!(settings.limits, SearchLimits::time(Duration::from_millis(100)));
    assert_eq!(settings.engine_delay, Duration::from_millis(500));
    assert_eq!(settings.human, Color::White);
    assert!(settings.engine.options.is_empty());
}

#[test]
fn test_engine_path_has_no_default() {
    let err = Config::parse("").unwrap().into_settings().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnginePath));
}

#[test]
fn test_unknown_keys_are_rejected() {
    assert!(Config::parse("[engine]\npaht = \"typo\"\n").is_err());
    assert!(Config::parse("[game]\nhuman_color = \"green\"\n").is_err());
}

#[test]
fn test_explicit_file_is_read() {
    let path = scratch_file("explicit.toml", FULL);
    let settings = resolve(Some(path), Path::new("/nonexistent/fallback.toml"), None).unwrap();
    assert_eq!(settings.engine.path, PathBuf::from("/opt/engines/stockfish"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let err = resolve(
        Some(PathBuf::from("/nonexistent/chess_gui.toml")),
        Path::new("/nonexistent/fallback.toml"),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_fallback_file_then_env_override() {
    let fallback = scratch_file("fallback.toml", "[engine]\npath = \"from-file\"\n");

    let settings = resolve(None, &fallback, None).unwrap();
    assert_eq!(settings.engine.path, PathBuf::from("from-file"));

    let settings = resolve(None, &fallback, Some(PathBuf::from("from-env"))).unwrap();
    assert_eq!(settings.engine.path, PathBuf::from("from-env"));
}

#[test]
fn test_env_override_alone_is_enough() {
    let settings = resolve(
        None,
        Path::new("/nonexistent/fallback.toml"),
        Some(PathBuf::from("/usr/games/stockfish")),
    )
    .unwrap();
    assert_eq!(settings.engine.path, PathBuf::from("/usr/games/stockfish"));
    assert_eq!(settings.human, Color::White);
}

#[test]
fn test_bad_file_reports_path() {
    let path = scratch_file("broken.toml", "[engine\npath = ");
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}
