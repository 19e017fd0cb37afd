mod render;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use cxxlens_core::memory::CachedMemory;
use cxxlens_core::snapshot::Snapshot;
use cxxlens_core::types::Address;
use cxxlens_core::{FormatterEngine, LensError, Limits, Result as LensResult, Value};
use cxxlens_utils::{debug, info, init_logging, init_logging_with_level, LogFormat, LogLevel};

use crate::render::Renderer;

/// Render C++, RTL and UNO values from WebAssembly memory snapshots.
#[derive(Parser, Debug)]
#[command(name = "cxxlens")]
#[command(version)]
#[command(about = "Render C++, RTL and UNO values from WebAssembly memory snapshots", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Format a value stored in a snapshot and print its expanded tree
    Format
    {
        /// Path to the JSON memory snapshot
        snapshot: PathBuf,
        /// Type of the value
        #[arg(long = "type")]
        type_name: String,
        /// Address of the value (hex format: 0x1000 or decimal)
        #[arg(long, value_parser = parse_address)]
        address: u32,
        /// How many levels of children to expand
        #[arg(long, default_value_t = 3)]
        depth: usize,
        /// Longest string, in bytes, to decode
        #[arg(long)]
        max_string_len: Option<u32>,
        /// Bytes read per step while scanning for a terminator
        #[arg(long)]
        page_size: Option<u32>,
        /// Lowest address a raw string pointer is followed at
        #[arg(long, value_parser = parse_address)]
        safe_heap_start: Option<u32>,
    },
    /// Show which formatter a type in a snapshot resolves to
    Match
    {
        /// Path to the JSON memory snapshot
        snapshot: PathBuf,
        /// Type name to look up
        #[arg(long = "type")]
        type_name: String,
    },
    /// List the built-in formatters in precedence order
    Formatters,
}

fn main()
{
    let cli = Cli::parse();

    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, LogFormat::Pretty),
        None => init_logging(),
    };
    let _guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Commands) -> LensResult<()>
{
    match command {
        Commands::Format {
            snapshot,
            type_name,
            address,
            depth,
            max_string_len,
            page_size,
            safe_heap_start,
        } => {
            let mut limits = Limits::default();
            if let Some(max_string_len) = max_string_len {
                limits = limits.with_max_string_len(max_string_len);
            }
            if let Some(page_size) = page_size {
                limits = limits.with_page_size(page_size);
            }
            if let Some(safe_heap_start) = safe_heap_start {
                limits = limits.with_safe_heap_start(safe_heap_start);
            }

            let snapshot = Snapshot::load(&snapshot)?;
            let memory = CachedMemory::new(snapshot.memory()?);
            let types = snapshot.type_table();
            let engine = FormatterEngine::with_limits(limits)?;
            info!(type_name = %type_name, address = %Address::new(address), "formatting value");

            let value = Value::of_type(&memory, &types, Address::new(address), &type_name)?;
            for line in Renderer::new(&engine, depth).render(&type_name, value) {
                println!("{line}");
            }
            debug!(pages = memory.cached_pages(), "memory pages read");
            Ok(())
        }
        Commands::Match { snapshot, type_name } => {
            let types = Snapshot::load(&snapshot)?.type_table();
            let info = types.lookup(&type_name).ok_or_else(|| LensError::UnknownType(type_name.clone()))?;
            let engine = FormatterEngine::new()?;
            match engine.registry().resolve(info) {
                Some(formatter) => println!("{type_name}: {}", formatter.name()),
                None => println!("{type_name}: no formatter, shown by raw layout"),
            }
            Ok(())
        }
        Commands::Formatters => {
            let engine = FormatterEngine::new()?;
            for (position, formatter) in engine.registry().iter().enumerate() {
                println!("{:>3}. {:<22} {:?}", position + 1, formatter.name(), formatter.matcher());
            }
            Ok(())
        }
    }
}

/// Parse an address as `0x`-prefixed hex or decimal.
fn parse_address(text: &str) -> Result<u32, String>
{
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid address '{text}': {e}"))
}

#[cfg(test)]
mod tests
{
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_parse_address()
    {
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("0XfF"), Ok(0xff));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0x").is_err());
        assert!(parse_address("0x1_0000_0000").is_err());
        assert!(parse_address("-1").is_err());
    }

    #[test]
    fn test_cli_definition()
    {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_format_command()
    {
        let cli = Cli::try_parse_from([
            "cxxlens",
            "format",
            "snap.json",
            "--type",
            "rtl::OUString",
            "--address",
            "0x40",
            "--page-size",
            "64",
        ])
        .unwrap();
        match cli.command {
            Commands::Format {
                type_name,
                address,
                depth,
                page_size,
                ..
            } => {
                assert_eq!(type_name, "rtl::OUString");
                assert_eq!(address, 0x40);
                assert_eq!(depth, 3);
                assert_eq!(page_size, Some(64));
            }
            other => panic!("Expected format command, got {other:?}"),
        }
    }
}
