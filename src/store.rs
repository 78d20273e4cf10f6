//! Per-domain snapshot stores with publish/subscribe.
//!
//! A [`Store`] holds the latest fetched value per entity key and notifies subscribers
//! whenever an entry is replaced. The published map is copy-on-write: readers take an
//! `Arc` of the whole map (or of one value) and never observe a half-applied update.
//!
//! ## Issue order
//!
//! Every fetch takes a [`Ticket`] from the store *before* going to the network. When the
//! response arrives it is committed with [`Store::set`], which only applies it if no fetch
//! issued later for the same key has already been applied. A slow response for an old
//! request therefore cannot overwrite a newer one.
//!
//! ## Subscriptions
//!
//! [`Store::subscribe`] returns a [`Subscription`] guard. Dropping it (or calling
//! [`Subscription::unsubscribe`]) detaches the callback; a detached callback is never
//! invoked again. Callbacks run on the writer's task, after the new map is published, and
//! must not write to the same store.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

/// Key of stores that hold exactly one collection-wide entry (lists, status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Collection;

type Listener<K, V> = Arc<dyn Fn(&K, &Arc<V>) + Send + Sync>;

struct Entry<K, V> {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener<K, V>,
}

struct Published<K, V> {
    map: Arc<HashMap<K, Arc<V>>>,
    applied: HashMap<K, u64>,
}

struct Inner<K, V> {
    name: &'static str,
    published: RwLock<Published<K, V>>,
    listeners: RwLock<Vec<Entry<K, V>>>,
    /// Serializes publish + notify so subscribers see commits in order
    commit: Mutex<()>,
    next_ticket: AtomicU64,
    next_listener: AtomicU64,
}

/// Permission to commit one fetch result for one key.
///
/// Tickets are ordered by issue time. Taking a ticket does not touch the published state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    seq: u64,
}

impl<K> Ticket<K> {
    /// Key this ticket was issued for.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Issue sequence number (monotonic per store).
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Result of committing a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Value published and subscribers notified
    Applied,
    /// A later-issued fetch for the same key was already applied; value discarded
    Stale,
}

/// Snapshot store for one data domain.
///
/// Cloning is cheap and yields another handle to the same store.
pub struct Store<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for Store<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create an empty store. `name` is used in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                published: RwLock::new(Published {
                    map: Arc::new(HashMap::new()),
                    applied: HashMap::new(),
                }),
                listeners: RwLock::new(Vec::new()),
                commit: Mutex::new(()),
                next_ticket: AtomicU64::new(1),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Store name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Latest value for `key`, `None` until the first successful fetch.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.read(|p| p.map.get(key).cloned())
    }

    /// The whole published map.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<K, Arc<V>>> {
        self.read(|p| Arc::clone(&p.map))
    }

    /// Keys that currently hold a value.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.read(|p| p.map.keys().cloned().collect())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(|p| p.map.len())
    }

    /// Whether nothing has been fetched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a callback invoked with the full entry on every applied update.
    ///
    /// The callback stays registered until the returned guard is dropped.
    pub fn subscribe(&self, listener: impl Fn(&K, &Arc<V>) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Entry {
                id,
                active: Arc::clone(&active),
                listener: Arc::new(listener),
            });

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            active.store(false, Ordering::SeqCst);
            if let Some(inner) = weak.upgrade() {
                inner
                    .listeners
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|e| e.id != id);
            }
        })
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Weak handle for in-flight fetches.
    #[must_use]
    pub fn downgrade(&self) -> WeakStore<K, V> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Take a ticket for a fetch about to be issued for `key`.
    pub(crate) fn issue(&self, key: K) -> Ticket<K> {
        let seq = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst);
        Ticket { key, seq }
    }

    /// Commit a fetch result.
    ///
    /// Applies the value unless a later-issued ticket for the same key already committed,
    /// then delivers the entry to every attached subscriber.
    pub(crate) fn set(&self, ticket: Ticket<K>, value: V) -> SetOutcome {
        let _commit = self
            .inner
            .commit
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let value = Arc::new(value);
        {
            let mut published = self
                .inner
                .published
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(&applied) = published.applied.get(&ticket.key) {
                if applied > ticket.seq {
                    tracing::trace!(
                        store = self.inner.name,
                        key = ?ticket.key,
                        issued = ticket.seq,
                        applied,
                        "Dropping stale response"
                    );
                    return SetOutcome::Stale;
                }
            }

            let mut map = HashMap::clone(&published.map);
            map.insert(ticket.key.clone(), Arc::clone(&value));
            published.map = Arc::new(map);
            published.applied.insert(ticket.key.clone(), ticket.seq);
        }

        let listeners: Vec<(Arc<AtomicBool>, Listener<K, V>)> = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| (Arc::clone(&e.active), Arc::clone(&e.listener)))
            .collect();

        for (active, listener) in listeners {
            if active.load(Ordering::SeqCst) {
                listener(&ticket.key, &value);
            }
        }

        SetOutcome::Applied
    }

    fn read<R>(&self, f: impl FnOnce(&Published<K, V>) -> R) -> R {
        let published = self
            .inner
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&published)
    }
}

/// Non-owning store handle.
///
/// Held by in-flight fetches so a result arriving after the store was torn down is
/// dropped instead of keeping the store alive.
pub struct WeakStore<K, V> {
    inner: Weak<Inner<K, V>>,
}

impl<K, V> Clone for WeakStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<K, V> WeakStore<K, V> {
    /// Owning handle, if the store still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<Store<K, V>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

/// Attachment of a callback to a store or a state channel.
///
/// Detaches when dropped.
#[must_use = "dropping a Subscription detaches it immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
