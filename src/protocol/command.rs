//! Command definitions
//!
//! A command is a name plus ordered, binary-safe arguments.

use bytes::Bytes;

use super::codec::encode_command;

/// A request to send to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Name first, then arguments
    args: Vec<Bytes>,
}

impl Command {
    /// Start a command with the given name
    pub fn new(name: impl AsRef<[u8]>) -> Self {
        Self {
            args: vec![Bytes::copy_from_slice(name.as_ref())],
        }
    }

    /// Build a command that declares a key count before its keys,
    /// `name numkeys key... arg...` (EVAL / EVALSHA shape)
    ///
    /// The declared count is always `keys.len()`.
    pub fn with_keys<K, A>(name: impl AsRef<[u8]>, head: impl AsRef<[u8]>, keys: &[K], args: &[A]) -> Self
    where
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        Self::new(name)
            .arg(head)
            .arg_int(keys.len() as i64)
            .args(keys)
            .args(args)
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    /// Append several arguments in order
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.args
            .extend(args.into_iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// Append an integer argument as ASCII decimal
    pub fn arg_int(self, value: i64) -> Self {
        let mut buf = itoa::Buffer::new();
        let text = buf.format(value).to_owned();
        self.arg(text)
    }

    /// Append a float argument as ASCII decimal
    pub fn arg_f64(self, value: f64) -> Self {
        let text = format_f64(value);
        self.arg(text)
    }

    /// Append a boolean argument as `1` / `0`
    pub fn arg_bool(self, value: bool) -> Self {
        self.arg(if value { "1" } else { "0" })
    }

    /// Command name as sent
    pub fn name(&self) -> &[u8] {
        &self.args[0]
    }

    /// Name plus arguments
    pub fn parts(&self) -> &[Bytes] {
        &self.args
    }

    /// Argument count including the name
    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        encode_command(&self.args)
    }
}

/// Shortest decimal that parses back to the same float; infinities use the
/// `+inf` / `-inf` spelling the server accepts for scores
pub fn format_f64(value: f64) -> String {
    if value.is_infinite() {
        let text = if value > 0.0 { "+inf" } else { "-inf" };
        text.to_string()
    } else {
        value.to_string()
    }
}
