//! Streaming bridge from the frame producer to the overlay encoder subprocess.
//!
//! Frames are composited and PNG-encoded on the calling thread, then handed to a writer thread
//! over a bounded channel. The producer blocks while the channel is full, so pipe backpressure
//! limits how far rendering runs ahead of the encoder.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::encode::overlay::{DEFAULT_ENCODER_TIMEOUT, DEFAULT_STDERR_TAIL_BYTES, EncoderOpts};
use crate::encode::png::encode_png;
use crate::foundation::core::{CancelToken, FrameIndex};
use crate::foundation::error::{StridashError, StridashResult};
use crate::render::backend::FrameRGBA;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Bridge tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct BridgeOpts {
    /// Encoded stills allowed to queue between producer and writer.
    pub capacity: usize,
    pub timeout: Duration,
    pub stderr_tail_bytes: usize,
}

impl Default for BridgeOpts {
    fn default() -> Self {
        Self {
            capacity: 4,
            timeout: DEFAULT_ENCODER_TIMEOUT,
            stderr_tail_bytes: DEFAULT_STDERR_TAIL_BYTES,
        }
    }
}

impl BridgeOpts {
    pub fn from_encoder(capacity: usize, enc: &EncoderOpts) -> Self {
        Self {
            capacity,
            timeout: enc.timeout,
            stderr_tail_bytes: enc.stderr_tail_bytes,
        }
    }
}

/// Counters from one bridge run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub frames_produced: u64,
    pub frames_written: u64,
    pub bytes_written: u64,
    /// Largest number of encoded stills held at once (queued, being written, or awaiting send).
    pub max_in_flight: usize,
    /// The encoder closed its input before all stills were written.
    pub encoder_closed_early: bool,
}

#[derive(Default)]
struct WriteOutcome {
    frames: u64,
    bytes: u64,
    closed_early: bool,
}

/// Encode `frames` as PNG stills and write them in order to `writer`.
///
/// Stops early when `should_stop` returns `true` between frames. A downstream-closed pipe ends
/// the stream without error; any other write failure is returned. `writer` is dropped before
/// returning, which signals end-of-stream.
pub fn pump_stills<I, W>(
    frames: I,
    writer: W,
    capacity: usize,
    should_stop: &dyn Fn() -> bool,
) -> StridashResult<BridgeStats>
where
    I: Iterator<Item = StridashResult<(FrameIndex, FrameRGBA)>>,
    W: Write + Send,
{
    let cap = capacity.max(1);
    let in_flight = AtomicUsize::new(0);
    let mut stats = BridgeStats::default();

    let (produced, written) = std::thread::scope(|scope| {
        let (tx, rx) = mpsc::sync_channel::<(FrameIndex, Vec<u8>)>(cap);
        let in_flight = &in_flight;

        let writer_thread = scope.spawn(move || -> StridashResult<WriteOutcome> {
            let mut writer = writer;
            let mut out = WriteOutcome::default();
            for (idx, png) in rx {
                match writer.write_all(&png) {
                    Ok(()) => {
                        out.frames += 1;
                        out.bytes += png.len() as u64;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        tracing::warn!(frame = idx.0, "encoder closed its input early");
                        out.closed_early = true;
                        return Ok(out);
                    }
                    Err(e) => {
                        return Err(StridashError::encode(format!(
                            "failed to write frame {} to encoder stdin: {e}",
                            idx.0
                        )));
                    }
                }
            }
            match writer.flush() {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => out.closed_early = true,
                Err(e) => {
                    return Err(StridashError::encode(format!(
                        "failed to flush encoder stdin: {e}"
                    )));
                }
            }
            Ok(out)
        });

        let mut produced = Ok(());
        for item in frames {
            if should_stop() {
                break;
            }
            let (idx, frame) = match item {
                Ok(v) => v,
                Err(e) => {
                    produced = Err(e);
                    break;
                }
            };
            let png = match encode_png(&frame) {
                Ok(png) => png,
                Err(e) => {
                    produced = Err(e);
                    break;
                }
            };
            stats.frames_produced += 1;
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            stats.max_in_flight = stats.max_in_flight.max(now);
            if tx.send((idx, png)).is_err() {
                // Writer stopped; its outcome says why.
                break;
            }
        }
        drop(tx);

        let written = writer_thread
            .join()
            .map_err(|_| StridashError::encode("encoder writer thread panicked"))
            .and_then(|r| r);
        (produced, written)
    });

    produced?;
    let written = written?;
    stats.frames_written = written.frames;
    stats.bytes_written = written.bytes;
    stats.encoder_closed_early = written.closed_early;
    Ok(stats)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Spawn `cmd` (stdin and stderr piped) and stream `frames` into it as PNG stills.
///
/// The encoder is killed on cancellation, on timeout, and on any producer or write failure.
/// A non-zero exit is an error carrying the tail of the encoder's stderr.
#[tracing::instrument(skip_all, fields(capacity = opts.capacity))]
pub fn run_encoder<I>(
    mut cmd: Command,
    frames: I,
    opts: &BridgeOpts,
    cancel: &CancelToken,
) -> StridashResult<BridgeStats>
where
    I: Iterator<Item = StridashResult<(FrameIndex, FrameRGBA)>>,
{
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd.spawn().map_err(|e| {
        StridashError::encode(format!(
            "failed to spawn {program} (is it installed and on PATH?): {e}"
        ))
    })?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| StridashError::encode("failed to open encoder stdin (unexpected)"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| StridashError::encode("failed to open encoder stderr (unexpected)"))?;
    let tail_cap = opts.stderr_tail_bytes;
    let stderr_drain = std::thread::spawn(move || drain_tail(stderr, tail_cap));
    tracing::debug!(%program, "encoder spawned");

    let deadline = Instant::now() + opts.timeout;
    let child = Mutex::new(child);
    let interrupt = Mutex::new(None::<Interrupt>);
    let finished = AtomicBool::new(false);

    let interrupt_with = |why: Interrupt| {
        let mut slot = interrupt.lock().unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            *slot = Some(why);
            kill(&child);
        }
    };

    let (pumped, status) = std::thread::scope(|scope| {
        scope.spawn(|| {
            while !finished.load(Ordering::SeqCst) {
                if cancel.is_cancelled() {
                    interrupt_with(Interrupt::Cancelled);
                    return;
                }
                if Instant::now() >= deadline {
                    interrupt_with(Interrupt::TimedOut);
                    return;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        });

        let should_stop = || cancel.is_cancelled() || Instant::now() >= deadline;
        let pumped = pump_stills(frames, stdin, opts.capacity, &should_stop);
        if pumped.is_err() {
            kill(&child);
        } else if cancel.is_cancelled() {
            interrupt_with(Interrupt::Cancelled);
        } else if Instant::now() >= deadline {
            interrupt_with(Interrupt::TimedOut);
        }

        let status = loop {
            let polled = child
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .try_wait();
            match polled {
                Ok(Some(status)) => break Ok(status),
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill(&child);
                    break Err(StridashError::encode(format!(
                        "failed to wait for encoder: {e}"
                    )));
                }
            }
        };
        finished.store(true, Ordering::SeqCst);
        (pumped, status)
    });

    let tail = match stderr_drain.join() {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).trim().to_owned(),
        Ok(Err(e)) => format!("<stderr read failed: {e}>"),
        Err(_) => "<stderr drain thread panicked>".to_owned(),
    };

    match *interrupt.lock().unwrap_or_else(|p| p.into_inner()) {
        Some(Interrupt::Cancelled) => {
            tracing::info!("encoder cancelled");
            return Err(StridashError::Cancelled);
        }
        Some(Interrupt::TimedOut) => {
            return Err(StridashError::timeout(format!(
                "encoder exceeded {:?} and was killed: {tail}",
                opts.timeout
            )));
        }
        None => {}
    }

    let stats = match pumped {
        Ok(stats) => stats,
        Err(StridashError::Encode(msg)) if !tail.is_empty() => {
            return Err(StridashError::encode(format!("{msg}: {tail}")));
        }
        Err(e) => return Err(e),
    };
    let status = status?;
    if !status.success() {
        return Err(StridashError::encode(format!(
            "encoder exited with status {status}: {tail}"
        )));
    }

    tracing::info!(
        frames = stats.frames_written,
        bytes = stats.bytes_written,
        max_in_flight = stats.max_in_flight,
        "encoder finished"
    );
    Ok(stats)
}

fn kill(child: &Mutex<Child>) {
    let mut child = child.lock().unwrap_or_else(|p| p.into_inner());
    // Fails harmlessly when the process already exited.
    let _ = child.kill();
}

/// Read `r` to the end, keeping only the last `cap` bytes.
pub(crate) fn drain_tail(mut r: impl Read, cap: usize) -> std::io::Result<Vec<u8>> {
    let mut tail = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match r.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        tail.extend_from_slice(&buf[..n]);
        if tail.len() > cap {
            let excess = tail.len() - cap;
            tail.drain(..excess);
        }
    }
    Ok(tail)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/bridge.rs"]
mod tests;
