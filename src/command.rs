//! Command dispatch
//!
//! Maps a command name to an operation on the [`Keyspace`].
//!
//! The same table serves live traffic and AOF replay, so both paths
//! produce identical state for identical input.

use bytes::Bytes;

use crate::keyspace::Keyspace;
use crate::protocol::{Request, Value};

/// Reply to COMMAND and TEST
pub const ACKNOWLEDGEMENT: &str = "Connected";

/// Number of arguments a command accepts (excluding the name)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    AtMost(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
            Arity::AtMost(n) => argc <= n,
            Arity::Any => true,
        }
    }
}

/// Supported commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Command,
    Test,
    Ping,
    Set,
    Get,
    HSet,
    HGet,
    HGetAll,
    HLen,
    HDel,
    HExists,
    Del,
    Exists,
}

impl Command {
    /// Look up a command by name, ignoring ASCII case
    pub fn lookup(name: &[u8]) -> Option<Command> {
        let command = match name.to_ascii_uppercase().as_slice() {
            b"COMMAND" => Command::Command,
            b"TEST" => Command::Test,
            b"PING" => Command::Ping,
            b"SET" => Command::Set,
            b"GET" => Command::Get,
            b"HSET" => Command::HSet,
            b"HGET" => Command::HGet,
            b"HGETALL" => Command::HGetAll,
            b"HLEN" => Command::HLen,
            b"HDEL" => Command::HDel,
            b"HEXISTS" => Command::HExists,
            b"DEL" => Command::Del,
            b"EXISTS" => Command::Exists,
            _ => return None,
        };
        Some(command)
    }

    /// Canonical (uppercase) name
    pub fn name(self) -> &'static str {
        match self {
            Command::Command => "COMMAND",
            Command::Test => "TEST",
            Command::Ping => "PING",
            Command::Set => "SET",
            Command::Get => "GET",
            Command::HSet => "HSET",
            Command::HGet => "HGET",
            Command::HGetAll => "HGETALL",
            Command::HLen => "HLEN",
            Command::HDel => "HDEL",
            Command::HExists => "HEXISTS",
            Command::Del => "DEL",
            Command::Exists => "EXISTS",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Command::Command | Command::Test => Arity::Any,
            Command::Ping => Arity::AtMost(1),
            Command::Set => Arity::Exact(2),
            Command::Get => Arity::Exact(1),
            Command::HSet => Arity::Exact(3),
            Command::HGet => Arity::Exact(2),
            Command::HGetAll => Arity::Exact(1),
            Command::HLen => Arity::Exact(1),
            Command::HDel => Arity::AtLeast(2),
            Command::HExists => Arity::Exact(2),
            Command::Del => Arity::AtLeast(1),
            Command::Exists => Arity::Exact(1),
        }
    }

    /// Whether the command can change the keyspace (and so goes to the AOF)
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Command::Set | Command::HSet | Command::Del | Command::HDel
        )
    }

    /// Run the command against the keyspace.
    ///
    /// Never panics: a wrong argument count yields an error reply.
    pub fn execute(self, keyspace: &Keyspace, args: &[Bytes]) -> Value {
        if !self.arity().accepts(args.len()) {
            return wrong_arity(self);
        }

        match self {
            Command::Command | Command::Test => Value::simple(ACKNOWLEDGEMENT),
            Command::Ping => match args.first() {
                Some(message) => echo(message),
                None => Value::simple("PONG"),
            },
            Command::Set => {
                keyspace.set(args[0].clone(), args[1].clone());
                Value::ok()
            }
            Command::Get => keyspace.get(&args[0]).map_or(Value::Null, Value::Bulk),
            Command::HSet => {
                keyspace.hset(args[0].clone(), args[1].clone(), args[2].clone());
                Value::ok()
            }
            Command::HGet => keyspace
                .hget(&args[0], &args[1])
                .map_or(Value::Null, Value::Bulk),
            Command::HGetAll => match keyspace.hgetall(&args[0]) {
                Some(pairs) => Value::Array(
                    pairs
                        .into_iter()
                        .flat_map(|(field, value)| [Value::Bulk(field), Value::Bulk(value)])
                        .collect(),
                ),
                None => Value::Null,
            },
            Command::HLen => count(keyspace.hlen(&args[0])),
            Command::HDel => count(keyspace.hdel(&args[0], &args[1..])),
            Command::HExists => flag(keyspace.hexists(&args[0], &args[1])),
            Command::Del => count(keyspace.del(args)),
            Command::Exists => flag(keyspace.exists(&args[0])),
        }
    }
}

/// Route a request to its command.
///
/// Unknown names produce an error reply and leave the keyspace untouched.
pub fn dispatch(keyspace: &Keyspace, request: &Request) -> Value {
    match Command::lookup(request.name()) {
        Some(command) => command.execute(keyspace, request.args()),
        None => unknown_command(request.name()),
    }
}

pub fn wrong_arity(command: Command) -> Value {
    Value::error(format!(
        "ERR wrong number of arguments for '{}' command",
        command.name().to_ascii_lowercase()
    ))
}

pub fn unknown_command(name: &[u8]) -> Value {
    Value::error(format!(
        "ERR unknown command '{}'",
        String::from_utf8_lossy(name).escape_debug()
    ))
}

// Simple string when the text fits one; bulk if it is not UTF-8 or
// contains a line break
fn echo(message: &Bytes) -> Value {
    match std::str::from_utf8(message) {
        Ok(text) if !text.contains(['\r', '\n']) => Value::simple(text),
        _ => Value::Bulk(message.clone()),
    }
}

// Counts are replied as simple strings of digits, not integers
fn count(n: usize) -> Value {
    Value::SimpleString(n.to_string())
}

fn flag(set: bool) -> Value {
    Value::simple(if set { "1" } else { "0" })
}
