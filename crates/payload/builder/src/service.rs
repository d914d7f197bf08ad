//! The payload builder service actor.
//!
//! The service owns the payload store and processes build and lookup
//! requests one at a time, in arrival order. Handles are cheap clones of
//! the command sender.

use crate::{
    metrics::PayloadBuilderServiceMetrics, BuiltPayload, PayloadBuilder,
    PayloadBuilderAttributes, PayloadBuilderError,
};
use ember_interfaces::{executor::BlockExecutor, pool::TransactionPool, provider::HeaderProvider};
use ember_rpc_types::PayloadId;
use futures_util::StreamExt;
use schnellru::{ByLength, LruMap};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

/// The number of assembled payloads kept around for `engine_getPayloadV1`.
///
/// Consensus clients retrieve a payload within one slot of requesting it;
/// anything older has been superseded and is evicted LRU-first.
pub const PAYLOAD_CACHE_SIZE: u32 = 10;

/// A communication channel to the [`PayloadBuilderService`].
///
/// This is the API used to create new payloads and to retrieve the results.
#[derive(Debug, Clone)]
pub struct PayloadBuilderHandle {
    /// Sender half of the message channel to the service.
    to_service: mpsc::UnboundedSender<PayloadServiceCommand>,
}

impl PayloadBuilderHandle {
    /// Creates a new payload builder handle for the given channel.
    pub const fn new(to_service: mpsc::UnboundedSender<PayloadServiceCommand>) -> Self {
        Self { to_service }
    }

    /// Starts building a new payload for the given attributes and returns
    /// the receiver for the pending payload id.
    pub fn send_new_payload(
        &self,
        attributes: PayloadBuilderAttributes,
    ) -> oneshot::Receiver<Result<PayloadId, PayloadBuilderError>> {
        let (tx, rx) = oneshot::channel();
        let _ = self.to_service.send(PayloadServiceCommand::BuildNewPayload(attributes, tx));
        rx
    }

    /// Builds a new payload and returns its identifier.
    ///
    /// If a payload for the same identifier was already built, it is kept
    /// and the identifier is returned.
    pub async fn new_payload(
        &self,
        attributes: PayloadBuilderAttributes,
    ) -> Result<PayloadId, PayloadBuilderError> {
        self.send_new_payload(attributes)
            .await
            .map_err(|_| PayloadBuilderError::ServiceUnavailable)?
    }

    /// Returns the payload previously built for the given identifier, if it
    /// is still stored.
    pub async fn get_payload(&self, id: PayloadId) -> Option<BuiltPayload> {
        let (tx, rx) = oneshot::channel();
        self.to_service.send(PayloadServiceCommand::GetPayload(id, tx)).ok()?;
        rx.await.ok()?
    }
}

/// A service that builds payloads and stores the results.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct PayloadBuilderService<Provider, Executor, Pool> {
    /// The type that knows how to build payloads.
    builder: PayloadBuilder<Provider, Executor, Pool>,
    /// Payloads built during this run, by identifier.
    payloads: LruMap<PayloadId, BuiltPayload>,
    /// Copy of the sender half, so new handles can be created on demand.
    service_tx: mpsc::UnboundedSender<PayloadServiceCommand>,
    /// Receiver half of the command channel.
    command_rx: UnboundedReceiverStream<PayloadServiceCommand>,
    /// Metrics of the service.
    metrics: PayloadBuilderServiceMetrics,
}

impl<Provider, Executor, Pool> PayloadBuilderService<Provider, Executor, Pool>
where
    Provider: HeaderProvider,
    Executor: BlockExecutor,
    Pool: TransactionPool,
{
    /// Creates a new service and returns the handle to interact with it.
    pub fn new(
        builder: PayloadBuilder<Provider, Executor, Pool>,
    ) -> (Self, PayloadBuilderHandle) {
        let (service_tx, command_rx) = mpsc::unbounded_channel();
        let service = Self {
            builder,
            payloads: LruMap::new(ByLength::new(PAYLOAD_CACHE_SIZE)),
            service_tx,
            command_rx: UnboundedReceiverStream::new(command_rx),
            metrics: Default::default(),
        };
        let handle = service.handle();
        (service, handle)
    }

    /// Returns a handle to the service.
    pub fn handle(&self) -> PayloadBuilderHandle {
        PayloadBuilderHandle::new(self.service_tx.clone())
    }

    fn on_build_new_payload(
        &mut self,
        attributes: PayloadBuilderAttributes,
    ) -> Result<PayloadId, PayloadBuilderError> {
        let id = attributes.payload_id();
        if self.payloads.peek(&id).is_some() {
            // identical attributes were already requested
            debug!(target: "payload_builder", %id, "payload already built, reusing");
            self.metrics.reused_jobs.increment(1);
            return Ok(id)
        }

        match self.builder.try_build(&attributes) {
            Ok(payload) => {
                self.metrics.initiated_jobs.increment(1);
                self.payloads.insert(id, payload);
                Ok(id)
            }
            Err(err) => {
                self.metrics.failed_jobs.increment(1);
                warn!(target: "payload_builder", %err, %id, "failed to build payload");
                Err(err)
            }
        }
    }
}

impl<Provider, Executor, Pool> Future for PayloadBuilderService<Provider, Executor, Pool>
where
    Provider: HeaderProvider + Unpin,
    Executor: BlockExecutor + Unpin,
    Pool: TransactionPool + Unpin,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match this.command_rx.poll_next_unpin(cx) {
                Poll::Ready(Some(cmd)) => match cmd {
                    PayloadServiceCommand::BuildNewPayload(attributes, tx) => {
                        let _ = tx.send(this.on_build_new_payload(attributes));
                    }
                    PayloadServiceCommand::GetPayload(id, tx) => {
                        let _ = tx.send(this.payloads.get(&id).cloned());
                    }
                },
                // channel closed
                Poll::Ready(None) => return Poll::Ready(()),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Message type of the [`PayloadBuilderService`].
pub enum PayloadServiceCommand {
    /// Build a new payload.
    BuildNewPayload(
        PayloadBuilderAttributes,
        oneshot::Sender<Result<PayloadId, PayloadBuilderError>>,
    ),
    /// Retrieve a previously built payload.
    GetPayload(PayloadId, oneshot::Sender<Option<BuiltPayload>>),
}

impl fmt::Debug for PayloadServiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildNewPayload(attributes, _) => {
                f.debug_tuple("BuildNewPayload").field(attributes).finish()
            }
            Self::GetPayload(id, _) => f.debug_tuple("GetPayload").field(id).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PayloadBuilderConfig;
    use ember_interfaces::test_utils::{random_header, MockExecutor, MockPool, MockProvider};
    use ember_primitives::{Address, ChainSpec, SealedHeader, B256, U64};
    use ember_rpc_types::PayloadAttributes;
    use std::sync::Arc;

    fn spawn_service(parent: &SealedHeader) -> PayloadBuilderHandle {
        let provider = MockProvider::default();
        provider.add_header(parent.hash(), parent.header().clone());
        let builder = PayloadBuilder::new(
            provider,
            MockExecutor::default(),
            MockPool::default(),
            Arc::new(ChainSpec::default()),
            PayloadBuilderConfig::default(),
        );
        let (service, handle) = PayloadBuilderService::new(builder);
        tokio::spawn(service);
        handle
    }

    fn attributes(parent: &SealedHeader, timestamp: u64) -> PayloadBuilderAttributes {
        PayloadBuilderAttributes::new(
            parent.hash(),
            PayloadAttributes {
                timestamp: U64::from(timestamp),
                prev_randao: B256::with_last_byte(1),
                suggested_fee_recipient: Address::with_last_byte(2),
            },
        )
    }

    #[tokio::test]
    async fn builds_and_serves_payloads() {
        let parent = random_header(1, None);
        let handle = spawn_service(&parent);

        let attrs = attributes(&parent, parent.timestamp + 12);
        let id = handle.new_payload(attrs.clone()).await.unwrap();
        assert_eq!(id, attrs.payload_id());

        let payload = handle.get_payload(id).await.expect("payload is stored");
        assert_eq!(payload.id(), id);
        assert_eq!(payload.block().parent_hash, parent.hash());
    }

    #[tokio::test]
    async fn unknown_payload_is_none() {
        let parent = random_header(1, None);
        let handle = spawn_service(&parent);
        assert!(handle.get_payload(PayloadId::new([9; 8])).await.is_none());
    }

    #[tokio::test]
    async fn identical_attributes_reuse_the_job() {
        let parent = random_header(1, None);
        let handle = spawn_service(&parent);

        let attrs = attributes(&parent, parent.timestamp + 12);
        let first = handle.new_payload(attrs.clone()).await.unwrap();
        let payload = handle.get_payload(first).await.unwrap();

        let second = handle.new_payload(attrs).await.unwrap();
        assert_eq!(first, second);
        // the stored payload is untouched
        assert_eq!(handle.get_payload(second).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn old_payloads_are_evicted_lru_first() {
        let parent = random_header(1, None);
        let handle = spawn_service(&parent);

        let first = handle
            .new_payload(attributes(&parent, parent.timestamp + 1))
            .await
            .unwrap();

        for offset in 2..=(PAYLOAD_CACHE_SIZE as u64 + 1) {
            handle
                .new_payload(attributes(&parent, parent.timestamp + offset))
                .await
                .unwrap();
        }

        // the first payload was pushed out by newer entries
        assert!(handle.get_payload(first).await.is_none());
        let newest = attributes(&parent, parent.timestamp + PAYLOAD_CACHE_SIZE as u64 + 1);
        assert!(handle.get_payload(newest.payload_id()).await.is_some());
    }

    #[tokio::test]
    async fn build_failure_is_propagated() {
        let parent = random_header(1, None);
        let builder = PayloadBuilder::new(
            MockProvider::default(),
            MockExecutor::default(),
            MockPool::default(),
            Arc::new(ChainSpec::default()),
            PayloadBuilderConfig::default(),
        );
        let (service, handle) = PayloadBuilderService::new(builder);
        tokio::spawn(service);

        let err = handle.new_payload(attributes(&parent, 50)).await.unwrap_err();
        assert!(matches!(err, PayloadBuilderError::MissingParentBlock(_)));
    }
}
