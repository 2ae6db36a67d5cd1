//! Worker pool and draw-call synchronization.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use tracing::debug;

use super::rectangle::RectChunk;
use super::triangle::TriChunk;

/// One tile of one draw call, ready to be processed by any worker.
pub(crate) enum Chunk {
    Rectangle(RectChunk),
    Triangle(TriChunk),
}

impl Chunk {
    fn process(self) {
        // The wait group is signaled on drop so a panicking shader
        // cannot strand the issuing draw call.
        let _done = DoneGuard(Arc::clone(match &self {
            Chunk::Rectangle(c) => c.wait_group(),
            Chunk::Triangle(c) => c.wait_group(),
        }));
        match self {
            Chunk::Rectangle(c) => c.run(),
            Chunk::Triangle(c) => c.run(),
        }
    }
}

struct DoneGuard(Arc<WaitGroup>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// The rasterizer's worker pool.
///
/// Workers are spawned lazily on the first draw call and live for the
/// rest of the process. The work queue is bounded to the worker count,
/// so submitting blocks once every worker is busy and the queue is
/// full.
pub struct Rasterizer {
    /// Worker thread count; 0 means one per available core.
    pub workers: usize,

    queue: Option<SyncSender<Chunk>>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Rasterizer {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            queue: None,
        }
    }

    /// Start the worker pool. Idempotent; draw calls invoke this
    /// themselves, so calling it up front is optional.
    pub fn run(&mut self) {
        if self.queue.is_some() {
            return;
        }
        if self.workers == 0 {
            self.workers = thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
        }
        let (tx, rx) = sync_channel::<Chunk>(self.workers);
        let rx = Arc::new(Mutex::new(rx));
        for i in 0..self.workers {
            let rx = Arc::clone(&rx);
            thread::Builder::new()
                .name(format!("raster-{i}"))
                .spawn(move || worker_loop(&rx))
                .expect("failed to spawn rasterizer worker");
        }
        debug!(workers = self.workers, "rasterizer worker pool started");
        self.queue = Some(tx);
    }

    /// Enqueue a chunk, blocking while the queue is full.
    pub(crate) fn submit(&self, chunk: Chunk) {
        // run() precedes any submission, so the queue exists; send only
        // fails if every worker died, which expect() surfaces loudly.
        self.queue
            .as_ref()
            .expect("rasterizer not started")
            .send(chunk)
            .expect("rasterizer workers gone");
    }
}

fn worker_loop(rx: &Mutex<Receiver<Chunk>>) {
    loop {
        let chunk = {
            let rx = rx.lock().unwrap_or_else(|e| e.into_inner());
            rx.recv()
        };
        match chunk {
            Ok(chunk) => chunk.process(),
            // Channel closed: the rasterizer was dropped.
            Err(_) => return,
        }
    }
}

/// Per-draw-call completion counter: the issuing thread waits until
/// every submitted chunk reports done.
pub(crate) struct WaitGroup {
    pending: Mutex<usize>,
    zero: Condvar,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(0),
            zero: Condvar::new(),
        }
    }

    pub fn add(&self, n: usize) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending += n;
    }

    pub fn done(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        *pending -= 1;
        if *pending == 0 {
            self.zero.notify_all();
        }
    }

    pub fn wait(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        while *pending > 0 {
            pending = self
                .zero
                .wait(pending)
                .unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Raw view over a draw call's destination pixels, shared with worker
/// threads.
///
/// Safety invariant: the chunks of one draw call write disjoint
/// offsets, and the draw call blocks on its wait group before the
/// `&mut [u8]` this was created from goes out of scope, so no write
/// aliases another and no write outlives the buffer.
#[derive(Clone, Copy)]
pub(crate) struct SharedPixels {
    ptr: *mut u8,
    len: usize,
}

unsafe impl Send for SharedPixels {}
unsafe impl Sync for SharedPixels {}

impl SharedPixels {
    pub fn new(pixels: &mut [u8]) -> Self {
        Self {
            ptr: pixels.as_mut_ptr(),
            len: pixels.len(),
        }
    }

    #[inline]
    pub fn set(&self, offset: usize, value: u8) {
        debug_assert!(offset < self.len);
        if offset < self.len {
            unsafe {
                *self.ptr.add(offset) = value;
            }
        }
    }
}
