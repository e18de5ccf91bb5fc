use std::path::{Path, PathBuf};
use std::time::Instant;

/// Observer for accumulator events.
///
/// Decouples the accumulator from where its events end up (log crate,
/// a host UI, nothing at all in tests).
pub trait PipelineLogger: Send {
    /// Frames received this invocation and the buffer length afterwards.
    fn buffered(&mut self, incoming: usize, buffered: usize);

    /// A batch of `frames` was dumped. `path` is `None` when saving was
    /// skipped.
    fn dumped(&mut self, path: Option<&Path>, frames: usize, encode_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn buffered(&mut self, _incoming: usize, _buffered: usize) {}
    fn dumped(&mut self, _path: Option<&Path>, _frames: usize, _encode_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Forwards events to the `log` crate and keeps totals for a summary.
pub struct LogPipelineLogger {
    start_time: Instant,
    invocations: usize,
    frames_received: usize,
    batches: Vec<(Option<PathBuf>, usize)>,
    encode_ms: Vec<f64>,
}

impl LogPipelineLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            invocations: 0,
            frames_received: 0,
            batches: Vec::new(),
            encode_ms: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing happened.
    pub fn summary_string(&self) -> Option<String> {
        if self.invocations == 0 {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Run summary ({} invocations, {} frames received, {elapsed:.1}s total):",
            self.invocations, self.frames_received
        )];

        let saved: Vec<_> = self
            .batches
            .iter()
            .filter_map(|(path, frames)| path.as_ref().map(|p| (p, frames)))
            .collect();
        lines.push(format!(
            "  batches: {} dumped, {} saved",
            self.batches.len(),
            saved.len()
        ));
        for (path, frames) in saved {
            lines.push(format!("  {} ({frames} frames)", path.display()));
        }

        if !self.encode_ms.is_empty() {
            let total: f64 = self.encode_ms.iter().sum();
            let avg = total / self.encode_ms.len() as f64;
            lines.push(format!("  encode: avg {avg:.1}ms  total {total:.0}ms"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn buffered(&mut self, incoming: usize, buffered: usize) {
        self.invocations += 1;
        self.frames_received += incoming;
        log::debug!("Buffered frames: {buffered} (+{incoming})");
    }

    fn dumped(&mut self, path: Option<&Path>, frames: usize, encode_ms: f64) {
        match path {
            Some(p) => {
                log::info!("Saved video to {} ({frames} frames, {encode_ms:.0}ms)", p.display());
                self.encode_ms.push(encode_ms);
            }
            None => log::info!("Dumped {frames} frames without saving"),
        }
        self.batches.push((path.map(Path::to_path_buf), frames));
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
