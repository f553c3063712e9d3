use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::{
    check_engine, ConversionOutcome, ConversionRequest, Locator, RunEvent, RunState, Runner,
};

#[derive(Debug, Parser)]
#[command(name = "ffconvert", version, about = "Convert media files with ffmpeg")]
pub struct Cli {
    /// Path to the ffmpeg executable, bypassing bundled and PATH lookup
    #[arg(long, global = true, value_name = "PATH")]
    pub engine: Option<PathBuf>,
    /// Directory holding the bundled ffmpeg/bin layout [default: working directory]
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace with engine output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert one file and exit
    Convert(ConvertArgs),
    /// Show which ffmpeg would be used
    Engine,
}

#[derive(Debug, Parser)]
pub struct ConvertArgs {
    #[arg(short = 'i', long = "input")]
    pub input: String,
    #[arg(short = 'o', long = "output")]
    pub output: String,
}

impl Cli {
    pub fn locator(&self) -> Locator {
        let mut locator = Locator::new();
        if let Some(root) = &self.root {
            locator = locator.with_root(root);
        }
        if let Some(engine) = &self.engine {
            locator = locator.with_engine(engine);
        }
        locator
    }
}

/// Commands typed into the interactive session.
#[derive(Debug, Parser)]
#[command(name = "ffconvert", no_binary_name = true, disable_help_flag = true)]
struct SessionCli {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    Convert { input: String, output: String },
    Engine,
    Clear,
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TuiCommand {
    Convert(ConversionRequest),
    Engine,
    Help,
    Clear,
    Exit,
}

pub const SESSION_HELP: [&str; 6] = [
    "Commands:",
    "  convert <input> <output>   quote paths containing spaces",
    "  engine                     show which ffmpeg will be used",
    "  clear                      clear the session log",
    "  exit / quit",
    "  PgUp/PgDn/Up/Down/Home/End scroll, Esc or Ctrl-C quits when idle",
];

pub fn parse_line(line: &str) -> Result<TuiCommand, String> {
    let tokens = shell_words::split(line).map_err(|err| err.to_string())?;
    if tokens
        .first()
        .is_some_and(|first| first.eq_ignore_ascii_case("help"))
    {
        return Ok(TuiCommand::Help);
    }

    let parsed = SessionCli::try_parse_from(tokens).map_err(|err| err.to_string())?;
    Ok(match parsed.command {
        SessionCommand::Convert { input, output } => {
            TuiCommand::Convert(ConversionRequest::new(input, output))
        }
        SessionCommand::Engine => TuiCommand::Engine,
        SessionCommand::Clear => TuiCommand::Clear,
        SessionCommand::Exit => TuiCommand::Exit,
    })
}

/// Runs one conversion on a worker thread and reports on the terminal.
pub fn convert(runner: &Runner, args: ConvertArgs) -> ConversionOutcome {
    let handle = runner.start(ConversionRequest::new(args.input, args.output));

    for event in handle.events() {
        match event {
            RunEvent::State(RunState::Running) => eprintln!("Converting..."),
            RunEvent::Progress(progress) => {
                println!("[{:>3}%] {}", progress.percent, progress.message)
            }
            _ => {}
        }
    }

    handle.join()
}

pub fn engine_lines(locator: &Locator) -> Vec<String> {
    let location = locator.locate();
    let info = check_engine(&location);

    let mut lines = vec![format!("Engine    : {}", info.program)];
    if let Some(path) = &info.resolved {
        lines.push(format!("Resolved  : {}", path.display()));
    }
    match (info.available, &info.version) {
        (true, Some(version)) => lines.push(format!("Version   : {version}")),
        (true, None) => lines.push("Version   : unknown".to_string()),
        (false, _) => lines.push(
            "Status    : not runnable; place ffmpeg under ffmpeg/bin/ or install it on PATH"
                .to_string(),
        ),
    }
    lines
}
