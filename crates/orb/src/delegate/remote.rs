//! Remote delegate
//!
//! Sends each operation through a [`Transport`]. Encoding, connections and
//! the wire protocol belong to the transport; this module only fixes the
//! contract and maps transport outcomes onto the shared error taxonomy.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use bytes::Bytes;
use crate::servant::InvokeReply;
use crate::types::{operation, Context, Facet, OperationMode, OrbError, Reference, Result};
use super::Delegate;

/// Request payload handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `ice_isA` with the type id to check
    IsA(String),
    /// `ice_ping`
    Ping,
    /// `ice_ids`
    Ids,
    /// `ice_id`
    Id,
    /// `ice_facets`
    Facets,
    /// Dynamic invocation with pre-encoded parameters
    Raw(Bytes),
}

/// Outgoing request
#[derive(Debug, Clone)]
pub struct OutgoingRequest<'a> {
    /// Target
    pub reference: &'a Reference,
    /// Operation name
    pub operation: &'a str,
    /// Declared mode
    pub mode: OperationMode,
    /// Caller context, passed verbatim
    pub context: &'a Context,
    /// Payload
    pub body: RequestBody,
}

/// Reply payload returned by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// Result of `ice_isA`
    Bool(bool),
    /// Result of `ice_ping`
    Unit,
    /// Result of `ice_ids`
    Ids(BTreeSet<String>),
    /// Result of `ice_id`
    Id(String),
    /// Result of `ice_facets`
    Facets(Vec<Facet>),
    /// Result of a dynamic invocation
    Raw(InvokeReply),
}

/// Failed send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The peer replied with one of the taxonomy kinds
    Replied(OrbError),
    /// The request never left this process
    NotSent(OrbError),
    /// The connection failed after the request may have been delivered
    Lost(OrbError),
}

/// Outgoing request transport
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send a request and wait for its reply
    fn send(&self, request: OutgoingRequest<'_>) -> std::result::Result<ReplyBody, TransportFailure>;

    /// Flush batched requests for `reference`
    fn flush(&self, reference: &Reference) -> Result<()>;
}

/// Delegate that dispatches over a transport
#[derive(Clone, Debug)]
pub struct RemoteDelegate {
    reference: Reference,
    transport: Arc<dyn Transport>,
}

impl RemoteDelegate {
    /// Bind a reference to a transport
    pub fn new(reference: Reference, transport: Arc<dyn Transport>) -> Self {
        Self { reference, transport }
    }

    fn send(
        &self,
        operation: &str,
        mode: OperationMode,
        ctx: &Context,
        body: RequestBody,
    ) -> Result<ReplyBody> {
        let request = OutgoingRequest {
            reference: &self.reference,
            operation,
            mode,
            context: ctx,
            body,
        };

        match self.transport.send(request) {
            Ok(reply) => Ok(reply),
            Err(TransportFailure::Replied(e)) | Err(TransportFailure::NotSent(e)) => Err(e),
            Err(TransportFailure::Lost(e)) => {
                tracing::debug!(
                    "connection lost during `{}` on {}: {}",
                    operation,
                    self.reference,
                    e
                );
                Err(OrbError::non_repeatable(e))
            }
        }
    }

    fn unexpected_reply(&self, operation: &str, reply: ReplyBody) -> OrbError {
        OrbError::Transport(format!(
            "unexpected reply to `{}` on {}: {:?}",
            operation, self.reference, reply
        ))
    }
}

impl Delegate for RemoteDelegate {
    fn reference(&self) -> &Reference {
        &self.reference
    }

    fn is_collocated(&self) -> bool {
        false
    }

    fn is_a(&self, type_id: &str, ctx: &Context) -> Result<bool> {
        let body = RequestBody::IsA(type_id.to_string());
        match self.send(operation::IS_A, OperationMode::Nonmutating, ctx, body)? {
            ReplyBody::Bool(b) => Ok(b),
            other => Err(self.unexpected_reply(operation::IS_A, other)),
        }
    }

    fn ping(&self, ctx: &Context) -> Result<()> {
        match self.send(operation::PING, OperationMode::Nonmutating, ctx, RequestBody::Ping)? {
            ReplyBody::Unit => Ok(()),
            other => Err(self.unexpected_reply(operation::PING, other)),
        }
    }

    fn ids(&self, ctx: &Context) -> Result<BTreeSet<String>> {
        match self.send(operation::IDS, OperationMode::Nonmutating, ctx, RequestBody::Ids)? {
            ReplyBody::Ids(ids) => Ok(ids),
            other => Err(self.unexpected_reply(operation::IDS, other)),
        }
    }

    fn id(&self, ctx: &Context) -> Result<String> {
        match self.send(operation::ID, OperationMode::Nonmutating, ctx, RequestBody::Id)? {
            ReplyBody::Id(id) => Ok(id),
            other => Err(self.unexpected_reply(operation::ID, other)),
        }
    }

    fn facets(&self, ctx: &Context) -> Result<Vec<Facet>> {
        match self.send(operation::FACETS, OperationMode::Nonmutating, ctx, RequestBody::Facets)? {
            ReplyBody::Facets(facets) => Ok(facets),
            other => Err(self.unexpected_reply(operation::FACETS, other)),
        }
    }

    fn invoke(
        &self,
        operation: &str,
        mode: OperationMode,
        in_params: Bytes,
        ctx: &Context,
    ) -> Result<InvokeReply> {
        match self.send(operation, mode, ctx, RequestBody::Raw(in_params))? {
            ReplyBody::Raw(reply) => Ok(reply),
            other => Err(self.unexpected_reply(operation, other)),
        }
    }

    fn flush(&self) -> Result<()> {
        self.transport.flush(&self.reference)
    }
}
