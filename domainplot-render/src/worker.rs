//! Background rendering with generation-numbered result delivery.
//!
//! The interactive side owns a [`PlotRenderer`]. Each call to
//! [`PlotRenderer::request`] copies the plot into a [`RenderJob`], cancels
//! whatever is in flight and hands the job to a dedicated worker thread.
//! Completed renders come back over a channel and are installed by
//! [`PlotRenderer::poll`] or [`PlotRenderer::wait`] on the caller's thread,
//! but only if their generation is still the latest one requested.

use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use domainplot_core::{ColorParams, Notifier, PlotRequest};

use crate::error::RenderError;
use crate::events::PlotEvent;
use crate::renderer::{render_request, RenderCancel, RenderOutput};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A self-contained snapshot of everything one render needs.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub generation: u64,
    pub request: PlotRequest,
    pub width: u32,
    pub height: u32,
    pub params: ColorParams,
}

struct RenderResponse {
    generation: u64,
    request: PlotRequest,
    result: crate::Result<RenderOutput>,
}

/// The most recently installed image and the plot it shows.
#[derive(Debug, Clone)]
pub struct Frame {
    pub generation: u64,
    pub request: PlotRequest,
    pub output: RenderOutput,
}

// ---------------------------------------------------------------------------
// PlotRenderer
// ---------------------------------------------------------------------------

/// Owns the render worker thread and the authoritative current frame.
pub struct PlotRenderer {
    tx_request: Option<mpsc::Sender<RenderJob>>,
    rx_response: mpsc::Receiver<RenderResponse>,
    cancel: Arc<RenderCancel>,
    generation: u64,
    current: Option<Frame>,
    notifier: Notifier<PlotEvent>,
    worker: Option<JoinHandle<()>>,
}

impl PlotRenderer {
    /// Spawn the worker thread.
    pub fn new() -> crate::Result<Self> {
        let (tx_req, rx_req) = mpsc::channel::<RenderJob>();
        let (tx_resp, rx_resp) = mpsc::channel::<RenderResponse>();
        let cancel = Arc::new(RenderCancel::new());

        let cancel_clone = Arc::clone(&cancel);
        let worker = std::thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || render_worker(rx_req, tx_resp, cancel_clone))?;

        Ok(Self {
            tx_request: Some(tx_req),
            rx_response: rx_resp,
            cancel,
            generation: 0,
            current: None,
            notifier: Notifier::new(),
            worker: Some(worker),
        })
    }

    /// Supersede any in-flight render and start rendering `request`.
    ///
    /// Returns the generation assigned to the new job.
    pub fn request(
        &mut self,
        request: PlotRequest,
        width: u32,
        height: u32,
        params: ColorParams,
    ) -> crate::Result<u64> {
        self.cancel.cancel();
        self.generation += 1;

        debug!(
            generation = self.generation,
            width,
            height,
            expression = request.expression.source(),
            "Requesting render"
        );

        let job = RenderJob {
            generation: self.generation,
            request,
            width,
            height,
            params,
        };
        let tx = self.tx_request.as_ref().ok_or(RenderError::WorkerGone)?;
        tx.send(job).map_err(|_| RenderError::WorkerGone)?;
        Ok(self.generation)
    }

    /// Abandon the in-flight render. No result requested before this call
    /// will be installed afterwards.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.generation += 1;
        info!(generation = self.generation, "Render cancelled");
    }

    /// Install any completed renders without blocking.
    ///
    /// Returns the generation of the frame installed by this call, if any.
    pub fn poll(&mut self) -> crate::Result<Option<u64>> {
        let mut installed = None;
        loop {
            match self.rx_response.try_recv() {
                Ok(resp) => {
                    if let Some(gen) = self.deliver(resp)? {
                        installed = Some(gen);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(installed),
                Err(TryRecvError::Disconnected) => return Err(RenderError::WorkerGone),
            }
        }
    }

    /// Block until the frame for `generation` is installed, the request is
    /// superseded, or `timeout` elapses.
    ///
    /// Returns the frame only if it belongs to `generation`.
    pub fn wait(&mut self, generation: u64, timeout: Duration) -> crate::Result<Option<&Frame>> {
        let deadline = Instant::now() + timeout;
        while generation == self.generation
            && self
                .current
                .as_ref()
                .map_or(true, |frame| frame.generation < generation)
        {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.rx_response.recv_timeout(remaining) {
                Ok(resp) => {
                    self.deliver(resp)?;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Err(RenderError::WorkerGone),
            }
        }
        Ok(self
            .current
            .as_ref()
            .filter(|frame| frame.generation == generation))
    }

    /// Block until the most recently requested render is installed.
    pub fn wait_latest(&mut self, timeout: Duration) -> crate::Result<Option<&Frame>> {
        let generation = self.generation;
        self.wait(generation, timeout)
    }

    /// Accept a response only if no newer render has been requested since.
    fn deliver(&mut self, resp: RenderResponse) -> crate::Result<Option<u64>> {
        if resp.generation != self.generation {
            debug!(
                stale = resp.generation,
                latest = self.generation,
                "Discarding stale render"
            );
            return Ok(None);
        }
        let output = resp.result.map_err(|e| {
            warn!(generation = resp.generation, "Render failed: {e}");
            e
        })?;
        self.current = Some(Frame {
            generation: resp.generation,
            request: resp.request,
            output,
        });
        self.notifier.notify(&PlotEvent::ImageReady {
            generation: resp.generation,
        });
        Ok(Some(resp.generation))
    }

    /// The last installed frame.
    pub fn current(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Generation of the most recent request.
    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    /// Rows finished by the in-flight render, as `(done, total)`.
    pub fn progress(&self) -> (usize, usize) {
        self.cancel.progress()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&PlotEvent) + Send + 'static,
    {
        self.notifier.subscribe(listener);
    }

    pub fn subscribe_channel(&mut self) -> mpsc::Receiver<PlotEvent> {
        self.notifier.subscribe_channel()
    }

    /// Forward an event that originated outside the renderer to every
    /// listener.
    pub fn notify(&self, event: PlotEvent) {
        self.notifier.notify(&event);
    }
}

impl Drop for PlotRenderer {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Closing the request channel ends the worker loop.
        drop(self.tx_request.take());
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Render worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for PlotRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotRenderer")
            .field("generation", &self.generation)
            .field("current", &self.current.as_ref().map(|c| c.generation))
            .field("listeners", &self.notifier.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Worker thread
// ---------------------------------------------------------------------------

fn drain_latest(initial: RenderJob, rx: &mpsc::Receiver<RenderJob>) -> RenderJob {
    let mut job = initial;
    while let Ok(newer) = rx.try_recv() {
        job = newer;
    }
    job
}

fn render_worker(
    rx: mpsc::Receiver<RenderJob>,
    tx: mpsc::Sender<RenderResponse>,
    cancel: Arc<RenderCancel>,
) {
    debug!("Render worker started");
    while let Ok(initial) = rx.recv() {
        let job = drain_latest(initial, &rx);
        let result = render_request(&job.request, job.width, job.height, &job.params, &cancel);

        if let Err(RenderError::Cancelled) = result {
            debug!(generation = job.generation, "Render abandoned");
            continue;
        }

        let resp = RenderResponse {
            generation: job.generation,
            request: job.request,
            result,
        };
        if tx.send(resp).is_err() {
            break;
        }
    }
    debug!("Render worker exiting");
}
