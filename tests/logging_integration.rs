use std::fs;
use tempfile::tempdir;

use fs_handles::config::{Config, LogLevel};
use fs_handles::logging::init_tracing;
use fs_handles::prelude::*;

// One subscriber per process: everything lives in a single test.
#[test]
fn file_logging_captures_operations_and_refuses_reinit() {
    let td = tempdir().unwrap();
    let log = td.path().join("logs").join("fs.log");
    let cfg = Config {
        log_level: LogLevel::Debug,
        log_file: Some(log.clone()),
        ..Config::default()
    };

    let guard = init_tracing(&cfg).unwrap();
    assert!(guard.is_some(), "file layer should be active");

    let work = Directory::from_path(td.path()).unwrap();
    let f = work.file("hello.txt").unwrap();
    assert!(f.write_string("hi"));
    // Swallowed failure is logged at warn.
    assert!(!f.write_string("again"));
    f.try_copy_to(work.subdirectory("copies").unwrap().try_create().unwrap(), false)
        .unwrap();

    assert!(init_tracing(&cfg).is_err(), "second init must not panic");

    drop(guard);
    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("copied file"), "log was: {text}");
    assert!(text.contains("already exists"), "log was: {text}");
}
