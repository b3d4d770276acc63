//! Tests for command dispatch
//!
//! These tests verify:
//! - Name lookup (case-insensitive) and unknown names
//! - Arity checks and error text
//! - Reply shapes for every command
//! - Write classification

use bytes::Bytes;
use respkv::command::{dispatch, Arity, Command, ACKNOWLEDGEMENT};
use respkv::keyspace::Keyspace;
use respkv::protocol::{Request, Value};

fn run(ks: &Keyspace, parts: &[&'static str]) -> Value {
    let request = Request::new(parts[0], parts[1..].iter().copied());
    dispatch(ks, &request)
}

fn simple(s: &str) -> Value {
    Value::simple(s)
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_lookup_ignores_case() {
    assert_eq!(Command::lookup(b"get"), Some(Command::Get));
    assert_eq!(Command::lookup(b"HgEtAlL"), Some(Command::HGetAll));
    assert_eq!(Command::lookup(b"FOOBAR"), None);
}

#[test]
fn test_write_classification() {
    let writes: Vec<_> = [
        "COMMAND", "TEST", "PING", "SET", "GET", "HSET", "HGET", "HGETALL", "HLEN", "HDEL",
        "HEXISTS", "DEL", "EXISTS",
    ]
    .iter()
    .filter_map(|name| Command::lookup(name.as_bytes()))
    .filter(|command| command.is_write())
    .map(|command| command.name())
    .collect();

    assert_eq!(writes, vec!["SET", "HSET", "HDEL", "DEL"]);
}

#[test]
fn test_arity_accepts() {
    assert!(Arity::Exact(2).accepts(2));
    assert!(!Arity::Exact(2).accepts(3));
    assert!(Arity::AtLeast(2).accepts(5));
    assert!(!Arity::AtLeast(2).accepts(1));
    assert!(Arity::AtMost(1).accepts(0));
    assert!(!Arity::AtMost(1).accepts(2));
    assert!(Arity::Any.accepts(100));
}

// =============================================================================
// Reply Tests
// =============================================================================

#[test]
fn test_ping() {
    let ks = Keyspace::new();

    assert_eq!(run(&ks, &["PING"]), simple("PONG"));
    assert_eq!(run(&ks, &["ping", "hello"]), simple("hello"));
    assert!(run(&ks, &["PING", "a", "b"]).is_error());
}

#[test]
fn test_ping_unframeable_message_is_bulk() {
    let ks = Keyspace::new();

    let binary = Bytes::from_static(b"\xff\x00");
    assert_eq!(Command::Ping.execute(&ks, &[binary.clone()]), Value::Bulk(binary));
    assert_eq!(run(&ks, &["PING", "two\r\nlines"]), Value::bulk("two\r\nlines"));
}

#[test]
fn test_command_and_test_acknowledge() {
    let ks = Keyspace::new();

    assert_eq!(run(&ks, &["COMMAND"]), simple(ACKNOWLEDGEMENT));
    assert_eq!(run(&ks, &["COMMAND", "DOCS"]), simple(ACKNOWLEDGEMENT));
    assert_eq!(run(&ks, &["test"]), simple(ACKNOWLEDGEMENT));
}

#[test]
fn test_set_get_replies() {
    let ks = Keyspace::new();

    assert_eq!(run(&ks, &["GET", "k"]), Value::Null);
    assert_eq!(run(&ks, &["SET", "k", "v"]), Value::ok());
    assert_eq!(run(&ks, &["GET", "k"]), Value::bulk("v"));
}

#[test]
fn test_hash_replies() {
    let ks = Keyspace::new();

    assert_eq!(run(&ks, &["HSET", "h", "f1", "a"]), Value::ok());
    assert_eq!(run(&ks, &["HSET", "h", "f2", "b"]), Value::ok());
    assert_eq!(run(&ks, &["HGET", "h", "f1"]), Value::bulk("a"));
    assert_eq!(run(&ks, &["HGET", "h", "nope"]), Value::Null);
    assert_eq!(run(&ks, &["HLEN", "h"]), simple("2"));
    assert_eq!(run(&ks, &["HLEN", "missing"]), simple("0"));
    assert_eq!(run(&ks, &["HEXISTS", "h", "f2"]), simple("1"));
    assert_eq!(run(&ks, &["HEXISTS", "h", "f3"]), simple("0"));

    let Value::Array(items) = run(&ks, &["HGETALL", "h"]) else {
        panic!("Expected array reply");
    };
    let mut pairs: Vec<(Value, Value)> = items
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();
    pairs.sort_by_key(|(field, _)| format!("{:?}", field));
    assert_eq!(
        pairs,
        vec![
            (Value::bulk("f1"), Value::bulk("a")),
            (Value::bulk("f2"), Value::bulk("b")),
        ]
    );
}

#[test]
fn test_hdel_emptying_hash() {
    let ks = Keyspace::new();
    run(&ks, &["HSET", "h", "f1", "a"]);
    run(&ks, &["HSET", "h", "f2", "b"]);

    assert_eq!(run(&ks, &["HDEL", "h", "f1", "f2", "f3"]), simple("2"));
    assert_eq!(run(&ks, &["EXISTS", "h"]), simple("0"));
    assert_eq!(run(&ks, &["HGETALL", "h"]), Value::Null);
}

#[test]
fn test_del_dual_count() {
    let ks = Keyspace::new();
    run(&ks, &["SET", "x", "1"]);
    run(&ks, &["HSET", "x", "f", "v"]);

    assert_eq!(run(&ks, &["DEL", "x"]), simple("2"));
    assert_eq!(run(&ks, &["EXISTS", "x"]), simple("0"));
}

#[test]
fn test_binary_safe_values() {
    let ks = Keyspace::new();
    let request = Request::new(
        "SET",
        [Bytes::from_static(b"k\r\n"), Bytes::from_static(b"\x00\xff")],
    );

    assert_eq!(dispatch(&ks, &request), Value::ok());
    assert_eq!(
        dispatch(&ks, &Request::new("GET", [Bytes::from_static(b"k\r\n")])),
        Value::Bulk(Bytes::from_static(b"\x00\xff"))
    );
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_wrong_arity_messages() {
    let ks = Keyspace::new();

    assert_eq!(
        run(&ks, &["SET", "k"]),
        Value::error("ERR wrong number of arguments for 'set' command")
    );
    assert_eq!(
        run(&ks, &["hdel", "h"]),
        Value::error("ERR wrong number of arguments for 'hdel' command")
    );
    assert_eq!(
        run(&ks, &["DEL"]),
        Value::error("ERR wrong number of arguments for 'del' command")
    );
    assert!(run(&ks, &["GET"]).is_error());
    assert!(run(&ks, &["HSET", "h", "f"]).is_error());
    assert!(run(&ks, &["HGET", "h"]).is_error());
    assert!(run(&ks, &["HGETALL"]).is_error());
    assert!(run(&ks, &["HLEN", "a", "b"]).is_error());
    assert!(run(&ks, &["HEXISTS", "h"]).is_error());
    assert!(run(&ks, &["EXISTS", "a", "b"]).is_error());

    assert!(ks.is_empty());
}

#[test]
fn test_unknown_command_leaves_keyspace_unchanged() {
    let ks = Keyspace::new();
    run(&ks, &["SET", "a", "1"]);
    run(&ks, &["HSET", "h", "f", "v"]);

    let reply = run(&ks, &["FOOBAR", "a"]);

    assert_eq!(reply, Value::error("ERR unknown command 'FOOBAR'"));
    assert_eq!(ks.string_count(), 1);
    assert_eq!(ks.hash_count(), 1);
    assert_eq!(ks.get(b"a"), Some(Bytes::from("1")));
}

#[test]
fn test_execute_checks_arity_itself() {
    let ks = Keyspace::new();
    assert!(Command::Set.execute(&ks, &[]).is_error());
    assert!(ks.is_empty());
}
