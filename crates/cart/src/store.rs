//! Cart store: the cart state machine plus persistence and notification.
//!
//! # Ordering
//!
//! Every mutation runs under one lock. Inside it the store applies the
//! change, bumps the revision, captures a [`Snapshot`], queues that snapshot
//! for persistence and publishes it to subscribers. Two back-to-back calls
//! therefore always build on each other, and the write queue sees snapshots
//! in the same order readers did.
//!
//! A single writer task owns the backend. It reads the stored cart first
//! (hydration) and only then starts draining the queue, so a write can never
//! land before the value it would replace has been read. Each write is a full
//! snapshot, which lets the writer skip straight to the newest one when
//! several are waiting.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use marketplace_core::{NewLineItem, ProductId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::cart::Cart;
use crate::codec;
use crate::config::CartConfig;
use crate::error::{CartError, PersistError, Result};
use crate::event::{CartEvent, Snapshot};
use crate::storage::KeyValueStore;

/// Maximum number of queued jobs the writer picks up per batch.
const WRITE_BATCH_LIMIT: usize = 64;

type WriteResult = std::result::Result<(), Arc<PersistError>>;

enum WriteJob {
    Persist(Snapshot),
    Flush(oneshot::Sender<WriteResult>),
}

struct State {
    cart: Cart,
    revision: u64,
    /// `None` once the store has been shut down.
    queue: Option<mpsc::UnboundedSender<WriteJob>>,
}

struct Inner {
    key: String,
    state: Mutex<State>,
    snapshots: watch::Sender<Snapshot>,
    events: broadcast::Sender<CartEvent>,
    hydrated: watch::Sender<bool>,
    writer: Mutex<Option<JoinHandle<WriteResult>>>,
}

/// Shopping cart with durable persistence and change notification.
///
/// The store is cheaply cloneable via `Arc`; clones share the same cart.
/// Create one per session with [`CartStore::open`] and hand it to whatever
/// needs it, or install it with [`CartStore::scope`].
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

impl CartStore {
    /// Create a store and start hydrating it from `backend`.
    ///
    /// Returns immediately with an empty cart. The stored cart, if any,
    /// replaces it once it has been read; subscribers then receive
    /// [`CartEvent::Hydrated`] and [`CartStore::ready`] resolves. A missing
    /// or unreadable stored value leaves the cart empty.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn open<B>(backend: B, config: &CartConfig) -> Self
    where
        B: KeyValueStore + 'static,
    {
        let (queue, jobs) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (snapshots, _) = watch::channel(Snapshot::capture(0, &Cart::new()));
        let (hydrated, _) = watch::channel(false);

        let inner = Arc::new(Inner {
            key: config.storage_key.clone(),
            state: Mutex::new(State {
                cart: Cart::new(),
                revision: 0,
                queue: Some(queue),
            }),
            snapshots,
            events: events.clone(),
            hydrated,
            writer: Mutex::new(None),
        });

        let writer = Writer {
            store: Arc::downgrade(&inner),
            backend: Arc::new(backend),
            key: config.storage_key.clone(),
            events,
        };
        let handle = tokio::spawn(writer.run(jobs));
        *inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        debug!(key = %config.storage_key, "Cart store opened");
        Self { inner }
    }

    /// The current cart.
    #[must_use]
    pub fn products(&self) -> Snapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribe to every hydration, change, and persistence failure.
    ///
    /// Receivers that fall more than the configured event capacity behind
    /// get [`broadcast::error::RecvError::Lagged`] and can resync from
    /// [`CartStore::products`].
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    /// Watch the latest snapshot, skipping intermediate ones.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Whether startup hydration has finished.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        *self.inner.hydrated.borrow()
    }

    /// Wait for startup hydration to finish.
    pub async fn ready(&self) {
        let mut hydrated = self.inner.hydrated.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = hydrated.wait_for(|done| *done).await;
    }

    /// The persistence key this store reads and writes.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    /// Add one unit of a product, appending it if it is new.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Closed`] after shutdown and
    /// [`CartError::QuantityOverflow`] if the quantity cannot grow.
    #[instrument(skip(self, item), fields(product = %item.id))]
    pub fn add_to_cart(&self, item: NewLineItem) -> Result<Snapshot> {
        self.mutate(|cart| cart.add(item).map(|quantity| debug!(%quantity, "Added to cart")))
    }

    /// Add one unit of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart; the
    /// cart is left untouched and nothing is written or published.
    #[instrument(skip(self, id), fields(product = %id))]
    pub fn increment(&self, id: &ProductId) -> Result<Snapshot> {
        self.mutate(|cart| {
            cart.increment(id)
                .map(|quantity| debug!(%quantity, "Incremented"))
        })
    }

    /// Take one unit of a product out of the cart, removing the line when
    /// the last unit goes.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart; the
    /// cart is left untouched and nothing is written or published.
    #[instrument(skip(self, id), fields(product = %id))]
    pub fn decrement(&self, id: &ProductId) -> Result<Snapshot> {
        self.mutate(|cart| {
            cart.decrement(id).map(|remaining| match remaining {
                Some(quantity) => debug!(%quantity, "Decremented"),
                None => debug!("Removed from cart"),
            })
        })
    }

    /// Wait until every write queued before this call has been attempted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the most recent write failed and
    /// [`CartError::Closed`] after shutdown.
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        {
            let state = self.inner.lock();
            let queue = state.queue.as_ref().ok_or(CartError::Closed)?;
            queue
                .send(WriteJob::Flush(ack))
                .map_err(|_| CartError::Closed)?;
        }

        done.await
            .map_err(|_| CartError::Closed)?
            .map_err(CartError::Persist)
    }

    /// Stop accepting mutations, write out anything still queued, and wait
    /// for the writer to finish.
    ///
    /// After shutdown every mutation, [`CartStore::flush`], and further
    /// shutdown returns [`CartError::Closed`]. Reads keep returning the last
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the final write failed.
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn shutdown(&self) -> Result<()> {
        let handle = {
            let mut state = self.inner.lock();
            if state.queue.take().is_none() {
                return Err(CartError::Closed);
            }
            self.inner
                .writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
        };

        let Some(handle) = handle else {
            return Ok(());
        };
        match handle.await {
            Ok(result) => {
                info!("Cart store shut down");
                result.map_err(CartError::Persist)
            }
            Err(e) => {
                error!(error = %e, "Cart writer task failed");
                Err(CartError::Closed)
            }
        }
    }

    /// Whether [`CartStore::shutdown`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().queue.is_none()
    }

    /// Apply `op` to a copy of the cart and commit it only once the new
    /// snapshot is queued for the writer.
    fn mutate<F>(&self, op: F) -> Result<Snapshot>
    where
        F: FnOnce(&mut Cart) -> Result<()>,
    {
        let mut guard = self.inner.lock();
        let state = &mut *guard;

        let queue = match &state.queue {
            Some(queue) if !queue.is_closed() => queue,
            _ => return Err(CartError::Closed),
        };

        let mut cart = state.cart.clone();
        op(&mut cart)?;
        let revision = state.revision + 1;
        let snapshot = Snapshot::capture(revision, &cart);

        queue
            .send(WriteJob::Persist(snapshot.clone()))
            .map_err(|_| CartError::Closed)?;
        state.cart = cart;
        state.revision = revision;
        self.inner.snapshots.send_replace(snapshot.clone());
        // No receivers is fine.
        let _ = self.inner.events.send(CartEvent::Changed(snapshot.clone()));

        Ok(snapshot)
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the stored cart unless a mutation already got there first.
    fn finish_hydration(&self, stored: Option<Cart>) {
        let mut state = self.lock();

        if let Some(cart) = stored {
            if state.revision == 0 {
                state.cart = cart;
                state.revision = 1;
                self.snapshots
                    .send_replace(Snapshot::capture(state.revision, &state.cart));
            } else {
                warn!(
                    revision = state.revision,
                    "Cart changed before hydration finished, keeping local state"
                );
            }
        }

        let snapshot = Snapshot::capture(state.revision, &state.cart);
        info!(items = snapshot.len(), revision = snapshot.revision(), "Cart hydrated");
        let _ = self.events.send(CartEvent::Hydrated(snapshot));
        self.hydrated.send_replace(true);
    }
}

/// Releases [`CartStore::ready`] waiters if the writer stops before
/// hydration finishes, e.g. because the backend panicked.
struct HydrationGuard(Weak<Inner>);

impl Drop for HydrationGuard {
    fn drop(&mut self) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        if !*inner.hydrated.borrow() {
            warn!(key = %inner.key, "Cart writer stopped before hydration finished");
            inner.hydrated.send_replace(true);
        }
    }
}

/// Background task that owns the persistence backend.
struct Writer {
    store: Weak<Inner>,
    backend: Arc<dyn KeyValueStore>,
    key: String,
    events: broadcast::Sender<CartEvent>,
}

impl Writer {
    async fn run(self, jobs: mpsc::UnboundedReceiver<WriteJob>) -> WriteResult {
        let _hydration = HydrationGuard(self.store.clone());
        // Bound after the guard so the queue is closed before waiters wake.
        let mut jobs = jobs;

        let stored = self.load().await;
        match self.store.upgrade() {
            Some(inner) => inner.finish_hydration(stored),
            None => return Ok(()),
        }

        let mut last: WriteResult = Ok(());
        let mut batch = Vec::with_capacity(WRITE_BATCH_LIMIT);
        while jobs.recv_many(&mut batch, WRITE_BATCH_LIMIT).await > 0 {
            let queued = batch
                .iter()
                .filter(|job| matches!(job, WriteJob::Persist(_)))
                .count();
            let latest = batch.iter().rev().find_map(|job| match job {
                WriteJob::Persist(snapshot) => Some(snapshot.clone()),
                WriteJob::Flush(_) => None,
            });

            if let Some(snapshot) = latest {
                if queued > 1 {
                    debug!(skipped = queued - 1, "Coalesced queued snapshots");
                }
                last = self.persist(&snapshot).await;
            }

            for job in batch.drain(..) {
                if let WriteJob::Flush(ack) = job {
                    let _ = ack.send(last.clone());
                }
            }
        }

        last
    }

    /// Read and decode the stored cart. Any failure yields `None`.
    #[instrument(skip(self), fields(key = %self.key))]
    async fn load(&self) -> Option<Cart> {
        match self.backend.get(&self.key).await {
            Ok(Some(value)) => match codec::decode(&value) {
                Ok(cart) => Some(cart),
                Err(e) => {
                    warn!(error = %e, "Stored cart is unreadable, starting empty");
                    None
                }
            },
            Ok(None) => {
                debug!("No stored cart");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart, starting empty");
                None
            }
        }
    }

    #[instrument(skip(self, snapshot), fields(key = %self.key, revision = snapshot.revision()))]
    async fn persist(&self, snapshot: &Snapshot) -> WriteResult {
        let result = match codec::encode(snapshot.items()) {
            Ok(value) => self
                .backend
                .set(&self.key, &value)
                .await
                .map_err(PersistError::from),
            Err(e) => Err(PersistError::from(e)),
        };

        match result {
            Ok(()) => {
                debug!("Persisted cart");
                Ok(())
            }
            Err(e) => {
                let error = Arc::new(e);
                error!(error = %error, "Failed to persist cart");
                let _ = self.events.send(CartEvent::PersistFailed {
                    revision: snapshot.revision(),
                    error: Arc::clone(&error),
                });
                Err(error)
            }
        }
    }
}
