use std::any::Any;
use std::fs;
use std::io::{BufReader, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::core::command::EngineCommand;
use crate::core::error::ConvertError;
use crate::core::event::{classify_log_line, LogLevel, RunEvent};
use crate::core::formatter::format_summary_line;
use crate::core::locator::Locator;
use crate::core::outcome::{ConversionOutcome, ProgressEvent};
use crate::core::request::{ConversionRequest, ValidRequest};
use crate::core::state::RunState;
use crate::core::summary::{parse_summary_line, EncodeSummary};

/// Runs conversions. Holds no mutable state, so clones can run concurrently.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    locator: Locator,
}

struct Completed {
    request: ValidRequest,
    summary: Option<EncodeSummary>,
}

impl Runner {
    pub fn new(locator: Locator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Converts one file, blocking until ffmpeg exits.
    ///
    /// `on_progress` is called exactly once, with 100 on success or 0 on
    /// failure. A successful outcome carries `output_path` exactly as given
    /// in the request. Must not be called from an interactive thread.
    pub fn run<F>(&self, request: ConversionRequest, mut on_progress: F) -> ConversionOutcome
    where
        F: FnMut(ProgressEvent),
    {
        self.run_observed(request, |event| {
            if let RunEvent::Progress(progress) = event {
                on_progress(progress);
            }
        })
    }

    /// Like [`Runner::run`], also reporting state changes and engine output.
    pub fn run_observed<F>(&self, request: ConversionRequest, mut on_event: F) -> ConversionOutcome
    where
        F: FnMut(RunEvent),
    {
        let span = tracing::info_span!(
            "convert",
            input = %request.input_path.trim(),
            output = %request.output_path.trim()
        );
        let _enter = span.enter();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&request, &mut on_event)))
            .unwrap_or_else(|panic| Err(ConvertError::unexpected(panic_message(panic.as_ref()))));

        let (outcome, progress) = match result {
            Ok(completed) => {
                let message = success_message(&completed);
                tracing::info!("{message}");
                enter(&mut on_event, RunState::Succeeded);
                let outcome = ConversionOutcome::Success {
                    output_path: request.output_path.clone(),
                };
                (outcome, ProgressEvent::completed(message))
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), "conversion failed: {err}");
                enter(&mut on_event, RunState::Failed);
                let progress = ProgressEvent::failed(err.to_string());
                (ConversionOutcome::from(err), progress)
            }
        };

        on_event(RunEvent::Progress(progress));
        outcome
    }

    /// Runs the conversion on a dedicated worker thread.
    pub fn start(&self, request: ConversionRequest) -> ConversionHandle {
        let runner = self.clone();
        let (event_tx, event_rx) = mpsc::channel::<RunEvent>();

        let worker = thread::spawn(move || {
            runner.run_observed(request, |event| {
                let _ = event_tx.send(event);
            })
        });

        ConversionHandle {
            events: event_rx,
            worker,
        }
    }

    fn execute<F>(
        &self,
        request: &ConversionRequest,
        on_event: &mut F,
    ) -> Result<Completed, ConvertError>
    where
        F: FnMut(RunEvent),
    {
        enter(on_event, RunState::Validating);
        let valid = request.validate()?;
        if !valid.input.is_file() {
            return Err(ConvertError::InputNotFound {
                path: valid.input.clone(),
            });
        }

        enter(on_event, RunState::PreparingOutput);
        prepare_output_dir(&valid.output)?;

        enter(on_event, RunState::Locating);
        let engine = self.locator.locate();
        tracing::info!(engine = %engine.display(), "using ffmpeg");

        enter(on_event, RunState::Launching);
        let command = EngineCommand {
            input: valid.input.clone(),
            output: valid.output.clone(),
        };
        let mut child = command
            .build(&engine)
            .spawn()
            .map_err(|source| ConvertError::EngineNotFound {
                program: engine.display(),
                source,
            })?;

        enter(on_event, RunState::Running);
        tracing::debug!(pid = child.id(), args = ?command.to_args(), "ffmpeg started");

        let (line_tx, line_rx) = mpsc::channel::<String>();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, line_tx.clone()));
        }
        drop(line_tx);

        let mut last_error = None;
        let mut summary = None;

        for line in line_rx {
            match classify_log_line(&line) {
                LogLevel::Error => {
                    tracing::warn!(target: "ffconvert::engine", "{line}");
                    last_error = Some(line.clone());
                }
                LogLevel::Summary => {
                    tracing::debug!(target: "ffconvert::engine", "{line}");
                    if let Some(parsed) = parse_summary_line(&line) {
                        summary = Some(parsed);
                    }
                }
                _ => {
                    tracing::trace!(target: "ffconvert::engine", "{line}");
                }
            }
            on_event(RunEvent::Log(line));
        }

        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait().map_err(ConvertError::unexpected)?;
        tracing::debug!(%status, "ffmpeg exited");

        if status.success() {
            Ok(Completed {
                request: valid,
                summary,
            })
        } else {
            Err(ConvertError::EngineNonZeroExit {
                code: status.code(),
                last_error,
            })
        }
    }
}

/// A conversion running on its own thread.
pub struct ConversionHandle {
    events: Receiver<RunEvent>,
    worker: thread::JoinHandle<ConversionOutcome>,
}

impl ConversionHandle {
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    pub fn join(self) -> ConversionOutcome {
        match self.worker.join() {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("conversion worker panicked: {message}");
                ConversionOutcome::from(ConvertError::unexpected(message))
            }
        }
    }
}

fn enter<F: FnMut(RunEvent)>(on_event: &mut F, state: RunState) {
    tracing::debug!(%state, "conversion state");
    on_event(RunEvent::State(state));
}

fn prepare_output_dir(output: &Path) -> Result<(), ConvertError> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Ok(()),
    };

    if dir.is_dir() {
        return Ok(());
    }

    tracing::debug!(dir = %dir.display(), "creating output directory");
    fs::create_dir_all(dir).map_err(|source| ConvertError::OutputDirUnavailable {
        dir: dir.to_path_buf(),
        source,
    })
}

fn success_message(completed: &Completed) -> String {
    let base = format!(
        "Conversion finished: '{}' → '{}'",
        completed.request.input.display(),
        completed.request.output.display()
    );
    match &completed.summary {
        Some(summary) => format!("{base} ({})", format_summary_line(summary)),
        None => base,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker thread panicked".to_string()
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(
    reader: R,
    sender: Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        read_lines(reader, |line| {
            let _ = sender.send(line);
        });
    })
}

/// Splits on `\r` as well as `\n`, since ffmpeg redraws its status line with `\r`.
fn read_lines<R: Read>(reader: R, mut emit: impl FnMut(String)) {
    let mut reader = BufReader::new(reader);
    let mut line_buf: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match byte[0] {
            b'\r' | b'\n' => flush_line(&mut line_buf, &mut emit),
            other => line_buf.push(other),
        }
    }

    flush_line(&mut line_buf, &mut emit);
}

fn flush_line(line_buf: &mut Vec<u8>, emit: &mut impl FnMut(String)) {
    if line_buf.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(line_buf).trim_end().to_string();
    line_buf.clear();
    if !line.is_empty() {
        emit(line);
    }
}
