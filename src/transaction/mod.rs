//! Ambient transactions over in-memory registry state.
//!
//! A [`Transaction`] is a scope guard: [`Transaction::begin`] installs a
//! handle into a thread-local slot, and every mutating registry operation
//! consults that slot. On first touch inside a transaction the registry
//! snapshots its entire mutable state (a deep structural clone); commit
//! drops the snapshot, rollback writes it back field by field so external
//! references to the registry stay valid. Dropping the guard without
//! resolving it counts as a rollback, which keeps unwinding safe.
//!
//! The registry applies a resolved transaction's outcome at its next public
//! call ("settlement"): the guard cannot hold a mutable registry borrow, and
//! deferring the restore is observationally identical: any read issued
//! after the rollback sees the restored state.
//!
//! Scope is single-threaded by construction (the handle is an `Rc`, so
//! guards do not cross threads), matching the registry's single-logical-
//! writer model. There is no separate prepare phase: in-memory state needs
//! no write-ahead, so a transaction is "prepared" by definition, and no
//! external coordinator exists to leave it in doubt.
//!
//! Transactions may nest syntactically (beginning a second transaction
//! while one is live is allowed), but a registry already enlisted in the
//! outer transaction will refuse to be touched under the inner one with
//! [`RegistryError::NestedTransaction`](crate::core::RegistryError::NestedTransaction).

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// How a transaction ended, as observed by enlisted participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Still running; writes are live, snapshot retained.
    Active,
    /// Committed; enlisted snapshots can be discarded.
    Committed,
    /// Rolled back (explicitly, or by dropping the guard); enlisted
    /// snapshots must be restored.
    RolledBack,
}

#[derive(Debug)]
struct TxShared {
    id: u64,
    status: Cell<TransactionStatus>,
}

/// A participant's view of one transaction: its identity and live status.
///
/// Cloning shares the underlying state; the registry keeps one of these next
/// to its snapshot while enlisted.
#[derive(Debug, Clone)]
pub struct TransactionHandle {
    shared: Rc<TxShared>,
}

impl TransactionHandle {
    /// Identity of the transaction this handle observes.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.shared.status.get()
    }

    /// Whether this handle and `other` observe the same transaction.
    #[must_use]
    pub fn same_transaction(&self, other: &TransactionHandle) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

thread_local! {
    static STACK: RefCell<Vec<Rc<TxShared>>> = const { RefCell::new(Vec::new()) };
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The transaction currently ambient on this thread, if any.
#[must_use]
pub fn current() -> Option<TransactionHandle> {
    STACK.with(|stack| {
        stack.borrow().last().map(|shared| TransactionHandle {
            shared: Rc::clone(shared),
        })
    })
}

/// Scope guard for one ambient transaction.
///
/// # Examples
///
/// ```
/// use gmpm::transaction::Transaction;
///
/// let tx = Transaction::begin();
/// // ... mutate enlisted state ...
/// tx.rollback(); // or tx.commit(), or drop the guard to roll back
/// ```
#[derive(Debug)]
pub struct Transaction {
    shared: Rc<TxShared>,
    resolved: bool,
}

impl Transaction {
    /// Start a transaction and make it ambient for the current thread.
    #[must_use]
    pub fn begin() -> Self {
        let shared = Rc::new(TxShared {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            status: Cell::new(TransactionStatus::Active),
        });
        STACK.with(|stack| stack.borrow_mut().push(Rc::clone(&shared)));
        debug!(id = shared.id, "transaction begun");
        Self {
            shared,
            resolved: false,
        }
    }

    /// Identity of this transaction.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// A handle enlisted participants can retain.
    #[must_use]
    pub fn handle(&self) -> TransactionHandle {
        TransactionHandle {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Resolve successfully: enlisted snapshots become garbage.
    pub fn commit(mut self) {
        self.resolve(TransactionStatus::Committed);
    }

    /// Resolve by aborting: enlisted participants restore their snapshots
    /// at their next settlement point.
    pub fn rollback(mut self) {
        self.resolve(TransactionStatus::RolledBack);
    }

    fn resolve(&mut self, status: TransactionStatus) {
        self.shared.status.set(status);
        STACK.with(|stack| {
            stack.borrow_mut().retain(|shared| shared.id != self.shared.id);
        });
        self.resolved = true;
        debug!(id = self.shared.id, ?status, "transaction resolved");
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.resolved {
            debug!(id = self.shared.id, "transaction dropped unresolved; rolling back");
            self.resolve(TransactionStatus::RolledBack);
        }
    }
}
