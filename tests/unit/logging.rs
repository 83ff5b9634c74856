use super::*;
use std::fs;

#[test]
fn init_logs_to_file_and_bounds_forwarded_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let config = FrameworkConfig {
        log_dir: Some(log_dir.clone()),
        ..FrameworkConfig::default()
    };

    let mut guard = init(&config).unwrap();
    assert_eq!(guard.log_dir(), log_dir.as_path());
    assert!(init(&config).is_none());

    for i in 0..LINE_BUFFER * 4 {
        tracing::info!(i, "filler");
    }

    let lines = guard.take_lines().unwrap();
    assert!(guard.take_lines().is_none());
    let forwarded: Vec<String> = lines.try_iter().collect();
    assert!(forwarded.len() <= LINE_BUFFER);
    assert!(forwarded.iter().any(|line| line.contains("filler")));

    drop(guard);
    let files = fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE))
        .count();
    assert_eq!(files, 1);
}
