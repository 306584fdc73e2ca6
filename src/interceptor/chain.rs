//! Ordered interceptor registry and composition.
//!
//! # Design Decisions
//! - Entries live in an `ArcSwap<Vec<_>>`; registration is rare, reads are per request
//! - Each request takes a snapshot at submission, so concurrent edits never
//!   change a chain that is already running
//! - Removal is by the `InterceptorId` handed out at registration

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// The inward continuation of a chain.
pub type Next<T> = Arc<dyn Fn(T) -> T + Send + Sync>;

/// Wraps a continuation into a new one.
pub type Interceptor<T> = Arc<dyn Fn(Next<T>) -> Next<T> + Send + Sync>;

/// Box a closure as a `Next`.
pub fn link<T, F>(f: F) -> Next<T>
where
    F: Fn(T) -> T + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle returned by registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

type Entries<T> = Vec<(InterceptorId, Interceptor<T>)>;

pub struct InterceptorChain<T> {
    entries: ArcSwap<Entries<T>>,
    next_id: AtomicU64,
}

impl<T: 'static> InterceptorChain<T> {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append an interceptor. It runs after (inside) every earlier registration.
    pub fn add<F>(&self, interceptor: F) -> InterceptorId
    where
        F: Fn(Next<T>) -> Next<T> + Send + Sync + 'static,
    {
        let id = InterceptorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let interceptor: Interceptor<T> = Arc::new(interceptor);
        self.entries.rcu(|current| {
            let mut entries: Entries<T> = current.iter().cloned().collect();
            entries.push((id, interceptor.clone()));
            entries
        });
        id
    }

    /// Remove the interceptor registered under `id`. Unknown ids are a no-op.
    pub fn remove(&self, id: InterceptorId) -> bool {
        let mut removed = false;
        self.entries.rcu(|current| {
            let entries: Entries<T> = current
                .iter()
                .filter(|(entry_id, _)| *entry_id != id)
                .cloned()
                .collect();
            removed = entries.len() != current.len();
            entries
        });
        removed
    }

    /// Remove everything. Defaults are not restored.
    pub fn clear(&self) {
        self.entries.store(Arc::new(Vec::new()));
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> ChainSnapshot<T> {
        ChainSnapshot {
            entries: self.entries.load_full(),
        }
    }
}

impl<T: 'static> Default for InterceptorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InterceptorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.entries.load().len())
            .finish()
    }
}

/// Chain contents frozen at one point in time.
pub struct ChainSnapshot<T> {
    entries: Arc<Entries<T>>,
}

impl<T> Clone for ChainSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: 'static> ChainSnapshot<T> {
    /// Wrap `core` so the first registration is outermost.
    pub fn compose(&self, core: Next<T>) -> Next<T> {
        self.entries
            .iter()
            .rev()
            .fold(core, |next, (_, interceptor)| interceptor(next))
    }

    pub fn apply(&self, core: Next<T>, value: T) -> T {
        self.compose(core)(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
