use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;

use axefx::message::{bank_dump_request, preset_dump_request};
use axefx::{Bank, Content, PresetId, PresetSummary, SysExParser};

fn parse_preset_id(s: &str) -> Result<PresetId, std::num::ParseIntError> {
    if s.eq_ignore_ascii_case("edit") {
        return Ok(PresetId::EditBuffer);
    }
    Ok(PresetId::Slot(s.parse()?))
}

/// Inspect and rewrite Axe-Fx II sysex files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the presets in one or more sysex files
    List {
        /// Sysex files, e.g. the three bank files of a backup
        #[arg(required = true)]
        sysex_files: Vec<PathBuf>,
    },
    /// Print presets as JSON
    Json {
        sysex_file: PathBuf,

        /// Only this preset: a slot number or "edit"
        #[arg(long, value_parser = parse_preset_id)]
        preset: Option<PresetId>,
    },
    /// Parse a sysex file and write it back out
    Resave { input: PathBuf, output: PathBuf },
    /// Print the bytes of a dump request
    Request {
        #[command(subcommand)]
        what: RequestKind,
    },
}

#[derive(Subcommand, Debug)]
enum RequestKind {
    /// The preset in the edit buffer
    Edit,
    /// A stored preset
    Slot { number: u16 },
    /// A whole preset bank
    Bank {
        #[arg(value_enum)]
        bank: BankArg,
    },
    /// System settings
    System,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BankArg {
    A,
    B,
    C,
}

fn read_into(parser: &mut SysExParser, path: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading sysex file '{}'", path.display()))?;
    let report = parser.parse_buffer(&bytes);
    if !report.is_clean() {
        warn!(
            "{}: {} errors, first: {}",
            path.display(),
            report.errors.len(),
            report.errors[0]
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::List { sysex_files } => {
            let mut parser = SysExParser::new();
            let mut failed = 0;
            for path in &sysex_files {
                if let Err(e) = read_into(&mut parser, path) {
                    eprintln!("Error: {:#}", e);
                    failed += 1;
                }
            }

            for (id, preset) in parser.presets() {
                println!("{}: {}", id, preset.name());
            }
            for ir in parser.irs() {
                println!("IR {}: {}", ir.id(), ir.name());
            }
            if let Some(firmware) = parser.firmware() {
                println!("firmware: {} words", firmware.len());
            }

            if failed > 0 {
                bail!("{} of {} files could not be read", failed, sysex_files.len());
            }
        }
        Commands::Json { sysex_file, preset } => {
            let mut parser = SysExParser::new();
            read_into(&mut parser, &sysex_file)?;

            let json = match preset {
                Some(id) => {
                    let preset = parser
                        .presets()
                        .get(&id)
                        .ok_or_else(|| anyhow!("no preset {} in '{}'", id, sysex_file.display()))?;
                    serde_json::to_string_pretty(&PresetSummary::new(preset))?
                }
                None => {
                    let summaries: Vec<_> =
                        parser.presets().values().filter_map(PresetSummary::new).collect();
                    serde_json::to_string_pretty(&summaries)?
                }
            };
            println!("{}", json);
        }
        Commands::Resave { input, output } => {
            let mut parser = SysExParser::new();
            read_into(&mut parser, &input)?;

            match parser.content() {
                Content::Empty => bail!("nothing to save in '{}'", input.display()),
                Content::Mixed => bail!("'{}' holds a mix of data kinds", input.display()),
                _ => {}
            }

            let mut bytes = Vec::new();
            parser.serialize(&mut |msg: &[u8]| bytes.extend_from_slice(msg))?;
            std::fs::write(&output, &bytes)
                .with_context(|| format!("writing '{}'", output.display()))?;
        }
        Commands::Request { what } => {
            let msg = match what {
                RequestKind::Edit => preset_dump_request(PresetId::EditBuffer),
                RequestKind::Slot { number } => {
                    if number >= axefx::preset::PRESET_ID_LIMIT {
                        bail!("preset {} is out of range", number);
                    }
                    preset_dump_request(PresetId::Slot(number))
                }
                RequestKind::Bank { bank } => bank_dump_request(match bank {
                    BankArg::A => Bank::A,
                    BankArg::B => Bank::B,
                    BankArg::C => Bank::C,
                }),
                RequestKind::System => bank_dump_request(Bank::System),
            };
            let hex: Vec<String> = msg.iter().map(|b| format!("{:02X}", b)).collect();
            println!("{}", hex.join(" "));
        }
    }

    Ok(())
}
