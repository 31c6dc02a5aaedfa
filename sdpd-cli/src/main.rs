//! Command-line interface for the sd prompt dumper
//!
//! Reads the generation parameters stable-diffusion.cpp stores in its PNG files and prints
//! the `sd` invocation that would reproduce each image.
//!
//! Usage:
//!   sd-prompt-dumper [OPTIONS] `<file>`...      - Print one command line per file
//!   sd-prompt-dumper --list-fields            - List the understood metadata labels
//!   sd-prompt-dumper --endian                 - Print the host byte order
//!
//! The exit status is the number of files that could not be processed (at most 255).

mod cli;
mod dump;

use clap::ArgMatches;
use sdpd_config::{ConfigError, Loader, Settings};
use sdpd_parser::png::byte_order::Endian;
use sdpd_parser::{FieldRegistry, Formatter};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE_HINT: &str = "Please supply the path of an image generated by stable-diffusion.cpp\n\
Use -h or --help for more information";

fn main() {
    let matches = cli::build_cli().get_matches();

    init_tracing(matches.get_flag("verbose"));

    if matches.get_flag("endian") {
        println!("{}", Endian::host().name());
        return;
    }

    let registry = FieldRegistry::standard().unwrap_or_else(|e| {
        eprintln!("Failed to build the field table: {}", e);
        process::exit(1);
    });

    if matches.get_flag("list-fields") {
        handle_list_fields_command(&registry);
        return;
    }

    let files: Vec<&String> = matches
        .get_many::<String>("files")
        .map(|files| files.collect())
        .unwrap_or_default();
    if files.is_empty() {
        println!("{}", USAGE_HINT);
        return;
    }

    let settings = load_settings(&matches).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    });

    handle_dump_command(&files, &registry, &settings);
}

/// Log to stderr. `RUST_LOG` wins over `--verbose` when both are given.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Layer the user file, `--config` and the individual flags over the defaults
fn load_settings(matches: &ArgMatches) -> Result<Settings, ConfigError> {
    let mut loader = Loader::new().with_user_file();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }

    let flag = |id: &str| matches.get_one::<String>(id).cloned();
    loader
        .set_override_option("model-dir", flag("model"))?
        .set_override_option("lora-dir", flag("lora"))?
        .set_override_option("bin-dir", flag("bin"))?
        .set_override_option("vae-path", flag("vae"))?
        .set_override_option("abbreviate", matches.get_flag("abrv").then_some(true))?
        .build()
}

/// Handle the default command: dump every file given on the command line
fn handle_dump_command(files: &[&String], registry: &FieldRegistry, settings: &Settings) {
    let options = settings.render_options();
    let stdout = io::stdout();
    let failures = dump::dump_files(&mut stdout.lock(), files, registry, &options)
        .unwrap_or_else(|e| {
            eprintln!("Error writing output: {}", e);
            process::exit(1);
        });

    process::exit(dump::exit_code(failures));
}

/// Handle the list-fields command
fn handle_list_fields_command(registry: &FieldRegistry) {
    println!("Understood metadata labels:\n");
    println!("  {:<18} {:<20} {:<6} FORMAT", "LABEL", "SWITCH", "SHORT");

    for field in registry.definitions() {
        let (long, short) = match (field.switch, field.formatter) {
            (Some(switch), _) => (
                switch.long.to_string(),
                switch.short.map(|c| format!("-{c}")).unwrap_or_default(),
            ),
            (None, Formatter::Dimensions { width, height }) => (
                format!("{} {}", width.long, height.long),
                String::new(),
            ),
            (None, _) => (String::new(), String::new()),
        };
        println!(
            "  {:<18} {:<20} {:<6} {}",
            field.label,
            long,
            short,
            field.formatter.name()
        );
    }
}
