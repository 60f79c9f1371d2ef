//! Opcode dispatch table (§4.2), adapted from the teacher's
//! `(component, command) -> Box<dyn Route>` router to a single `u16`
//! opcode key: each role (News/Login/NetworkMenu/Main) builds one of these
//! at connection time and installs the handlers it supports.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::ServerResult;
use crate::protocol::Frame;
use crate::session::context::SessionContext;
use crate::state::AppState;

pub type HandlerFuture = Pin<Box<dyn Future<Output = ServerResult<Frame>> + Send>>;

/// A single opcode handler: given the shared app state, this connection's
/// mutable context, and the inbound frame body, produces the response
/// frame to send back.
pub trait Handler: Send + Sync {
    fn call(&self, state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Arc<AppState>, Arc<SessionContext>, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = ServerResult<Frame>> + Send + 'static,
{
    fn call(&self, state: Arc<AppState>, ctx: Arc<SessionContext>, body: Bytes) -> HandlerFuture {
        Box::pin((self)(state, ctx, body))
    }
}

/// An opcode -> handler table. Roles compose by cloning a parent's table
/// and adding their own entries (additive overlay, §4.2).
#[derive(Default, Clone)]
pub struct Router {
    routes: HashMap<u16, Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, opcode: u16, handler: impl Handler + 'static) -> Self {
        self.routes.insert(opcode, Arc::new(handler));
        self
    }

    /// Merges `other`'s routes on top of `self` (used to let Main overlay
    /// NetworkMenu's handlers, which overlay Login's, etc.).
    pub fn merge(mut self, other: &Router) -> Self {
        for (opcode, handler) in &other.routes {
            self.routes.insert(*opcode, handler.clone());
        }
        self
    }

    pub fn get(&self, opcode: u16) -> Option<Arc<dyn Handler>> {
        self.routes.get(&opcode).cloned()
    }
}
