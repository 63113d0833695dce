//! Pipeline Queue
//!
//! Buffers encoded commands and their Responses, then settles the whole
//! batch with one write and N in-order reads.

use crate::client::Client;
use crate::convert::{self, ReplyShape, TypedReply};
use crate::error::{ResplineError, Result};
use crate::network::Connection;
use crate::protocol::{encode_command_into, Command, RawReply};

use super::response::{Resolver, Response};

/// Encoded requests plus one Resolver per counted command
#[derive(Debug, Default)]
pub(crate) struct Batch {
    buf: Vec<u8>,
    resolvers: Vec<Resolver>,
}

impl Batch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a command whose reply settles a new Response
    pub(crate) fn push<T, F>(&mut self, command: &Command, convert: F) -> Response<T>
    where
        T: Send + 'static,
        F: FnOnce(Result<RawReply>) -> Result<T> + Send + 'static,
    {
        let (response, resolver) = Response::pending(convert);
        encode_command_into(&mut self.buf, command.parts());
        self.resolvers.push(resolver);
        response
    }

    /// Queue bytes for a command whose reply nobody waits on (MULTI, EXEC)
    pub(crate) fn push_control(&mut self, command: &Command) {
        encode_command_into(&mut self.buf, command.parts());
    }

    pub(crate) fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.resolvers.is_empty() && self.buf.is_empty()
    }

    /// Drain the batch, leaving it empty for reuse
    pub(crate) fn take(&mut self) -> (Vec<u8>, Vec<Resolver>) {
        (
            std::mem::take(&mut self.buf),
            std::mem::take(&mut self.resolvers),
        )
    }

    /// Settle every queued Response with `err`
    pub(crate) fn fail_all(&mut self, err: &ResplineError) {
        let (_, resolvers) = self.take();
        for resolver in resolvers {
            resolver.fail(err.clone());
        }
    }
}

/// Deferred-mode command queue bound to one client
///
/// Holds the client's connection exclusively from creation until dropped;
/// `enqueue` never performs I/O, `sync` does all of it.
pub struct Pipeline<'a, C: Connection> {
    client: &'a mut Client<C>,
    batch: Batch,
    poisoned: Option<ResplineError>,
}

impl<'a, C: Connection> Pipeline<'a, C> {
    pub(crate) fn new(client: &'a mut Client<C>) -> Self {
        Self {
            client,
            batch: Batch::new(),
            poisoned: None,
        }
    }

    /// Queue a command; its Response yields the raw reply
    pub fn enqueue(&mut self, command: &Command) -> Result<Response<RawReply>> {
        self.enqueue_as(command, convert::to_raw)
    }

    /// Queue a command with the conversion to apply to its reply
    ///
    /// Fails synchronously, writing nothing, if the connection is already
    /// known to be closed or poisoned.
    pub fn enqueue_as<T, F>(&mut self, command: &Command, convert: F) -> Result<Response<T>>
    where
        T: Send + 'static,
        F: FnOnce(Result<RawReply>) -> Result<T> + Send + 'static,
    {
        self.ensure_usable()?;
        Ok(self.batch.push(command, convert))
    }

    /// Queue a command, converting by the shape registered for its name
    pub fn enqueue_typed(&mut self, command: &Command) -> Result<Response<TypedReply>> {
        let shape = ReplyShape::for_command(command);
        self.enqueue_as(command, move |reply| shape.convert(reply))
    }

    /// Number of commands waiting for `sync`
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// True once a fatal failure has hit this pipeline
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Flush every queued command at once, then read and settle the replies
    /// in issue order
    ///
    /// - write failure: nothing is read, every Response gets the error
    /// - read failure: earlier Responses keep their replies, the failed one
    ///   and all later ones get the error
    /// - server error reply: only that Response errors
    ///
    /// Any fatal failure poisons the pipeline and the client's connection.
    pub fn sync(&mut self) -> Result<()> {
        if let Err(err) = self.ensure_usable() {
            self.batch.fail_all(&err);
            return Err(err);
        }
        if self.batch.is_empty() {
            return Ok(());
        }

        let (bytes, resolvers) = self.batch.take();
        let expected = resolvers.len();
        tracing::debug!("Pipeline sync: {} commands, {} bytes", expected, bytes.len());

        if let Err(err) = self.client.write_batch(&bytes) {
            for resolver in resolvers {
                resolver.fail(err.clone());
            }
            self.poisoned = Some(err.clone());
            return Err(err);
        }

        let mut resolvers = resolvers.into_iter();
        let mut consumed = 0;
        while let Some(resolver) = resolvers.next() {
            match self.client.read_one() {
                Ok(reply) => {
                    tracing::trace!("Reply {}/{}: {}", consumed + 1, expected, reply.kind());
                    consumed += 1;
                    resolver.resolve(Ok(reply));
                }
                Err(err) => {
                    tracing::warn!(
                        "Pipeline read failed after {}/{} replies: {}",
                        consumed,
                        expected,
                        err
                    );
                    resolver.fail(err.clone());
                    for rest in resolvers {
                        rest.fail(err.clone());
                    }
                    self.poisoned = Some(err.clone());
                    return Err(err);
                }
            }
        }

        debug_assert_eq!(consumed, expected);
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if let Some(err) = &self.poisoned {
            return Err(ResplineError::Network(format!("pipeline poisoned: {}", err)));
        }
        self.client.ensure_usable()
    }
}
