//! Background service and its page-side client.
//!
//! Requests cross an mpsc channel with a oneshot responder each, so every
//! call resolves exactly once: with the handler's response, or with
//! `ChannelClosed` when the service is gone.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::BridgeError;
use crate::messages::{BridgeRequest, BridgeResponse};
use crate::{MessageHandler, RequestPrimitive};

const QUEUE_CAPACITY: usize = 64;

struct Envelope {
    request: BridgeRequest,
    reply: oneshot::Sender<BridgeResponse>,
}

/// Runs a [`MessageHandler`] on its own task.
pub struct BackgroundService {
    requests: mpsc::Sender<Envelope>,
    task: JoinHandle<()>,
}

impl BackgroundService {
    /// Must be called inside a tokio runtime.
    pub fn spawn(handler: Arc<dyn MessageHandler>) -> Self {
        let (requests, mut inbox) = mpsc::channel::<Envelope>(QUEUE_CAPACITY);

        let task = tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    serve(handler, envelope).await;
                });
            }
            debug!("background service stopped");
        });

        Self { requests, task }
    }

    pub fn client(&self) -> BridgeClient {
        BridgeClient {
            requests: self.requests.clone(),
        }
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for BackgroundService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(handler: Arc<dyn MessageHandler>, envelope: Envelope) {
    let Envelope { request, reply } = envelope;
    let action = request.action.clone();
    let response = handler.handle(request).await;
    if reply.send(response).is_err() {
        warn!(%action, "requester went away before the response");
    }
}

/// Page-side handle; cheap to clone.
#[derive(Clone)]
pub struct BridgeClient {
    requests: mpsc::Sender<Envelope>,
}

#[async_trait]
impl RequestPrimitive for BridgeClient {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Envelope { request, reply })
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;
        response.await.map_err(|_| BridgeError::ChannelClosed)
    }
}
