use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use switchport_config::{BoardDescriptor, ScenarioScript};
use switchport_core::{Simulator, SystemBus};
use switchport_loader::VerilogStyle;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(author, version, about = "SwitchPort firmware simulator and image tools", long_about = None)]
struct Cli {
    /// Enable debug-level tracing of bus traffic and phase changes
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the control loop against simulated devices, driven by a scenario script (YAML).
    Run(RunArgs),

    /// Convert an Intel HEX (or ELF) image into Verilog memory text.
    Hex2v(Hex2vArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the scenario script
    #[arg(short, long)]
    script: PathBuf,

    /// Board descriptor (YAML); overrides the script's `board`
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Directory to write result.json into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Echo UART transmissions to stdout
    #[arg(long)]
    uart_stdout: bool,
}

#[derive(Parser, Debug)]
struct Hex2vArgs {
    /// Input image (.hex/.ihex as Intel HEX, anything else as ELF)
    infile: PathBuf,

    /// Word width in bytes (1-8)
    bytes_per_word: usize,

    /// Emit `memory[i] = ...;` assignments instead of bare hex words
    #[arg(long)]
    memory: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so converted images can be piped from stdout.
    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run_scenario(args),
        Commands::Hex2v(args) => match hex2v(&args) {
            Ok(()) => ExitCode::from(EXIT_PASS),
            Err(e) => {
                error!("{:#}", e);
                ExitCode::from(EXIT_CONFIG_ERROR)
            }
        },
    }
}

fn hex2v(args: &Hex2vArgs) -> Result<()> {
    let image = switchport_loader::load_image(&args.infile)?;
    let style = if args.memory {
        VerilogStyle::Memory
    } else {
        VerilogStyle::Plain
    };

    use std::io::Write;
    let mut out = std::io::BufWriter::new(std::io::stdout().lock());
    switchport_loader::write_verilog(&image, args.bytes_per_word, style, &mut out)?;
    out.flush()?;
    Ok(())
}

fn load_board(args: &RunArgs, script: &ScenarioScript) -> Result<(BoardDescriptor, Option<PathBuf>)> {
    let path = match (&args.board, &script.board) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(rel)) => Some(
            args.script
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(rel),
        ),
        (None, None) => None,
    };

    match path {
        Some(path) => {
            info!("Loading board descriptor: {:?}", path);
            Ok((BoardDescriptor::from_file(&path)?, Some(path)))
        }
        None => {
            info!("Using default board");
            Ok((BoardDescriptor::default_board(), None))
        }
    }
}

fn script_hash(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

fn run_scenario(args: RunArgs) -> ExitCode {
    info!("Loading scenario script: {:?}", args.script);
    let script = match ScenarioScript::from_file(&args.script) {
        Ok(script) => script,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let (board, board_path) = match load_board(&args, &script) {
        Ok(board) => board,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let bus = match SystemBus::from_config(&board) {
        Ok(bus) => bus,
        Err(e) => {
            error!("Invalid board '{}': {:#}", board.name, e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut sim = match Simulator::new(bus) {
        Ok(sim) => sim,
        Err(e) => {
            error!("Board '{}' cannot run the firmware: {}", board.name, e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    sim.set_uart_echo(args.uart_stdout);

    info!(
        "Running {} stimulus events (max {} steps) on {}",
        script.stimulus.len(),
        script.limits.max_steps,
        board.name
    );
    let outcome = sim.run_script(&script);
    info!(
        "Finished: {} ({:?}) after {} steps, output {:#010x}",
        outcome.status,
        outcome.stop_reason,
        outcome.steps,
        sim.output()
    );

    if let Some(dir) = &args.output_dir {
        let hash = match script_hash(&args.script) {
            Ok(hash) => hash,
            Err(e) => {
                error!("{:#}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        };
        let result = serde_json::json!({
            "result_schema_version": RESULT_SCHEMA_VERSION,
            "status": outcome.status,
            "stop_reason": outcome.stop_reason,
            "steps": outcome.steps,
            "script": args.script,
            "script_hash": hash,
            "board": {
                "name": board.name,
                "path": board_path,
            },
            "stimulus": outcome.stimulus,
            "failures": outcome.failures,
            "faults": outcome.faults,
            "snapshot": outcome.snapshot,
            "metrics": outcome.metrics,
        });
        if let Err(e) = write_result(dir, &result) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    if !outcome.faults.is_empty() {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else if outcome.passed() {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_ASSERT_FAIL)
    }
}

fn write_result(dir: &Path, result: &serde_json::Value) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join("result.json");
    let text = serde_json::to_string_pretty(result)?;
    std::fs::write(&path, text).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {:?}", path);
    Ok(())
}
