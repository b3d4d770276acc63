//! Tests for Engine
//!
//! These tests verify:
//! - Command execution through the engine
//! - Which requests reach the AOF
//! - Durability across a restart
//! - Replay idempotence and skipping of stale records
//! - Engine lifecycle (open/close)

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use respkv::aof::AofReader;
use respkv::config::{AofSyncStrategy, Config};
use respkv::engine::Engine;
use respkv::protocol::{encode, Request, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn aof_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("database.aof")
}

fn open_engine(temp_dir: &TempDir) -> Engine {
    let config = Config::builder()
        .aof_path(aof_path(temp_dir))
        .aof_sync_strategy(AofSyncStrategy::EveryWrite) // Sync every write for test reliability
        .build();
    Engine::open(config).unwrap()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_engine(&temp_dir);
    (temp_dir, engine)
}

fn exec(engine: &Engine, parts: &[&'static str]) -> Value {
    engine
        .execute(&Request::new(parts[0], parts[1..].iter().copied()))
        .unwrap()
}

fn logged_records(path: &PathBuf) -> Vec<Value> {
    AofReader::open(path)
        .unwrap()
        .records()
        .collect::<respkv::Result<_>>()
        .unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_aof() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("db.aof");

    let engine = Engine::open_path(&path).unwrap();

    assert!(path.exists());
    assert!(engine.aof_enabled());
    assert!(engine.keyspace().is_empty());
    assert_eq!(engine.config().aof_path, path);
    assert_eq!(engine.config().aof_sync_strategy, AofSyncStrategy::EverySecond);
}

#[test]
fn test_in_memory_engine_has_no_aof() {
    let engine = Engine::in_memory();

    assert_eq!(exec(&engine, &["SET", "k", "v"]), Value::ok());
    assert!(!engine.aof_enabled());
    assert_eq!(engine.aof_records_written(), 0);
}

#[test]
fn test_close_syncs() {
    let (_temp, engine) = setup_temp_engine();
    exec(&engine, &["SET", "k", "v"]);
    engine.close().unwrap();
}

#[test]
fn test_every_second_syncs_while_idle() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .aof_path(aof_path(&temp_dir))
        .aof_sync_strategy(AofSyncStrategy::EverySecond)
        .build();
    let engine = Engine::open(config).unwrap();

    exec(&engine, &["SET", "k", "v"]);
    assert_eq!(engine.aof_unsynced_entries(), 1);

    thread::sleep(Duration::from_millis(1500));
    assert_eq!(engine.aof_unsynced_entries(), 0);
    engine.close().unwrap();
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_engine_set_get() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(exec(&engine, &["SET", "k", "v"]), Value::ok());
    assert_eq!(exec(&engine, &["GET", "k"]), Value::bulk("v"));
    assert_eq!(exec(&engine, &["GET", "unset"]), Value::Null);
}

#[test]
fn test_engine_hash_commands() {
    let (_temp, engine) = setup_temp_engine();

    exec(&engine, &["HSET", "h", "f1", "a"]);
    exec(&engine, &["hset", "h", "f2", "b"]);

    assert_eq!(exec(&engine, &["HLEN", "h"]), Value::simple("2"));
    let Value::Array(items) = exec(&engine, &["HGETALL", "h"]) else {
        panic!("Expected array reply");
    };
    assert_eq!(items.len(), 4);
    assert!(items.contains(&Value::bulk("f1")));
    assert!(items.contains(&Value::bulk("b")));
}

#[test]
fn test_engine_unknown_command() {
    let (_temp, engine) = setup_temp_engine();
    exec(&engine, &["SET", "a", "1"]);

    let reply = exec(&engine, &["FOOBAR"]);

    assert!(reply.is_error());
    assert_eq!(engine.keyspace().string_count(), 1);
    assert_eq!(engine.keyspace().hash_count(), 0);
}

// =============================================================================
// AOF Logging Tests
// =============================================================================

#[test]
fn test_only_writes_are_logged() {
    let (temp, engine) = setup_temp_engine();

    exec(&engine, &["SET", "a", "1"]);
    exec(&engine, &["GET", "a"]);
    exec(&engine, &["HSET", "h", "f", "v"]);
    exec(&engine, &["HGET", "h", "f"]);
    exec(&engine, &["HGETALL", "h"]);
    exec(&engine, &["HLEN", "h"]);
    exec(&engine, &["HEXISTS", "h", "f"]);
    exec(&engine, &["EXISTS", "a"]);
    exec(&engine, &["PING"]);
    exec(&engine, &["HDEL", "h", "f"]);
    exec(&engine, &["DEL", "a"]);

    let names: Vec<Value> = logged_records(&aof_path(&temp))
        .into_iter()
        .map(|record| match record {
            Value::Array(mut items) => items.remove(0),
            other => panic!("Unexpected record {:?}", other),
        })
        .collect();

    assert_eq!(
        names,
        vec![
            Value::bulk("SET"),
            Value::bulk("HSET"),
            Value::bulk("HDEL"),
            Value::bulk("DEL"),
        ]
    );
    assert_eq!(engine.aof_records_written(), 4);
}

#[test]
fn test_rejected_writes_are_not_logged() {
    let (temp, engine) = setup_temp_engine();

    assert!(exec(&engine, &["SET", "only-key"]).is_error());
    assert!(exec(&engine, &["HDEL", "h"]).is_error());
    assert!(exec(&engine, &["DEL"]).is_error());
    assert!(exec(&engine, &["NOTACOMMAND", "x"]).is_error());

    assert_eq!(fs::metadata(aof_path(&temp)).unwrap().len(), 0);
}

#[test]
fn test_logged_record_is_the_request() {
    let (temp, engine) = setup_temp_engine();

    let request = Request::new("set", ["key", "value"]);
    engine.execute(&request).unwrap();

    assert_eq!(
        fs::read(aof_path(&temp)).unwrap(),
        encode(&request.to_value())
    );
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_engine_restart_recovers_state() {
    let temp_dir = TempDir::new().unwrap();

    {
        let engine = open_engine(&temp_dir);
        exec(&engine, &["SET", "a", "1"]);
        exec(&engine, &["HSET", "b", "f", "2"]);
        exec(&engine, &["SET", "gone", "x"]);
        exec(&engine, &["DEL", "gone"]);
        exec(&engine, &["HSET", "c", "f", "3"]);
        exec(&engine, &["HDEL", "c", "f"]);
    }

    let engine = open_engine(&temp_dir);

    assert_eq!(exec(&engine, &["GET", "a"]), Value::bulk("1"));
    assert_eq!(exec(&engine, &["HGET", "b", "f"]), Value::bulk("2"));
    assert_eq!(exec(&engine, &["EXISTS", "gone"]), Value::simple("0"));
    assert_eq!(exec(&engine, &["EXISTS", "c"]), Value::simple("0"));
}

#[test]
fn test_replay_does_not_write_to_log() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_engine(&temp_dir);
        exec(&engine, &["SET", "a", "1"]);
    }
    let size_before = fs::metadata(aof_path(&temp_dir)).unwrap().len();

    let engine = open_engine(&temp_dir);

    assert_eq!(engine.aof_records_written(), 0);
    assert_eq!(fs::metadata(aof_path(&temp_dir)).unwrap().len(), size_before);
}

#[test]
fn test_double_replay_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_engine(&temp_dir);
        exec(&engine, &["SET", "a", "1"]);
        exec(&engine, &["SET", "a", "2"]);
        exec(&engine, &["HSET", "h", "x", "1"]);
        exec(&engine, &["HSET", "h", "y", "2"]);
        exec(&engine, &["HDEL", "h", "x"]);
        exec(&engine, &["SET", "d", "1"]);
        exec(&engine, &["DEL", "d"]);
    }

    let once = Engine::in_memory();
    once.replay(&aof_path(&temp_dir)).unwrap();

    let twice = Engine::in_memory();
    twice.replay(&aof_path(&temp_dir)).unwrap();
    let second = twice.replay(&aof_path(&temp_dir)).unwrap();
    assert_eq!(second.records_skipped, 0);

    for engine in [&once, &twice] {
        assert_eq!(exec(engine, &["GET", "a"]), Value::bulk("2"));
        assert_eq!(exec(engine, &["HGET", "h", "x"]), Value::Null);
        assert_eq!(exec(engine, &["HGET", "h", "y"]), Value::bulk("2"));
        assert_eq!(exec(engine, &["HLEN", "h"]), Value::simple("1"));
        assert_eq!(exec(engine, &["EXISTS", "d"]), Value::simple("0"));
        assert_eq!(engine.keyspace().string_count(), 1);
        assert_eq!(engine.keyspace().hash_count(), 1);
    }
}

#[test]
fn test_replay_skips_stale_and_invalid_records() {
    let temp_dir = TempDir::new().unwrap();
    let path = aof_path(&temp_dir);

    let mut bytes = Vec::new();
    bytes.extend(encode(&Request::new("SET", ["a", "1"]).to_value()));
    bytes.extend(encode(&Request::new("OLDCMD", ["a"]).to_value()));
    bytes.extend(encode(&Value::bulk("not a request")));
    bytes.extend(encode(&Value::Array(vec![])));
    bytes.extend(encode(&Request::new("HSET", ["h", "f"]).to_value()));
    bytes.extend(encode(&Request::new("HSET", ["h", "f", "v"]).to_value()));
    fs::write(&path, &bytes).unwrap();

    let engine = Engine::in_memory();
    let result = engine.replay(&path).unwrap();

    assert_eq!(result.records_applied, 2);
    assert_eq!(result.records_skipped, 4);
    assert_eq!(exec(&engine, &["GET", "a"]), Value::bulk("1"));
    assert_eq!(exec(&engine, &["HGET", "h", "f"]), Value::bulk("v"));
}

#[test]
fn test_open_recovers_from_torn_tail() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_engine(&temp_dir);
        exec(&engine, &["SET", "a", "1"]);
    }
    let path = aof_path(&temp_dir);
    let mut bytes = fs::read(&path).unwrap();
    bytes.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$1\r\nb");
    fs::write(&path, &bytes).unwrap();

    {
        let engine = open_engine(&temp_dir);
        assert_eq!(exec(&engine, &["GET", "a"]), Value::bulk("1"));
        assert_eq!(exec(&engine, &["GET", "b"]), Value::Null);
        exec(&engine, &["SET", "c", "3"]);
    }

    // The append after recovery starts on a record boundary
    let engine = open_engine(&temp_dir);
    assert_eq!(exec(&engine, &["GET", "c"]), Value::bulk("3"));
}

#[test]
fn test_open_refuses_corrupt_aof() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(aof_path(&temp_dir), b"%oops\r\n*1\r\n$4\r\nPING\r\n").unwrap();

    let config = Config::builder().aof_path(aof_path(&temp_dir)).build();

    assert!(matches!(
        Engine::open(config),
        Err(respkv::KvError::AofCorruption(_))
    ));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writes_all_recovered() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Arc::new(open_engine(&temp_dir));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("k{}-{}", t, i);
                        let request = Request::new("SET", [key.clone(), i.to_string()]);
                        assert_eq!(engine.execute(&request).unwrap(), Value::ok());
                        let request = Request::new("HSET", [format!("h{}", t), key, "x".to_string()]);
                        assert_eq!(engine.execute(&request).unwrap(), Value::ok());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    let engine = open_engine(&temp_dir);
    assert_eq!(engine.keyspace().string_count(), 200);
    assert_eq!(engine.keyspace().hash_count(), 4);
    assert_eq!(exec(&engine, &["HLEN", "h2"]), Value::simple("50"));
}
