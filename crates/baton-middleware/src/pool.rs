//! Reusable pool of [`Context`] instances.

use crate::context::Context;
use crate::settings::AppSettings;
use crate::types::{Request, ResponseSink};
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Thread-safe free list of contexts for one application.
///
/// The pool grows without bound and never evicts; it only saves allocations.
#[derive(Debug)]
pub struct ContextPool {
    app: Arc<AppSettings>,
    free: Mutex<Vec<Box<Context>>>,
    allocated: AtomicUsize,
}

impl ContextPool {
    /// Creates an empty pool whose contexts point back at `app`.
    #[must_use]
    pub fn new(app: Arc<AppSettings>) -> Self {
        Self {
            app,
            free: Mutex::new(Vec::new()),
            allocated: AtomicUsize::new(0),
        }
    }

    /// Settings shared by every context of this pool.
    #[must_use]
    pub fn app(&self) -> &Arc<AppSettings> {
        &self.app
    }

    /// Takes a context from the pool (allocating one if none is idle) and
    /// binds it to `request` and `sink`.
    ///
    /// The context goes back to the pool when the guard is dropped.
    pub fn acquire(&self, request: Request, sink: ResponseSink) -> PooledContext<'_> {
        let reused = self.free.lock().pop();
        let mut ctx = reused.unwrap_or_else(|| {
            self.allocated.fetch_add(1, Ordering::Relaxed);
            Box::new(Context::new(Arc::clone(&self.app)))
        });
        ctx.bind(request, sink);
        PooledContext {
            pool: self,
            ctx: Some(ctx),
        }
    }

    fn release(&self, mut ctx: Box<Context>) {
        ctx.clear();
        self.free.lock().push(ctx);
    }

    /// Contexts currently waiting in the free list.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Contexts ever created by this pool.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// A context on loan from a [`ContextPool`].
#[derive(Debug)]
pub struct PooledContext<'a> {
    pool: &'a ContextPool,
    ctx: Option<Box<Context>>,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        // Only `drop` takes the box out.
        self.ctx.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.release(ctx);
        }
    }
}
