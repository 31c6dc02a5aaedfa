// Shared with build.rs, which includes this file to generate shell completions.
// Keep it free of crate-local imports.

use clap::{Arg, ArgAction, Command, ValueHint};

pub fn build_cli() -> Command {
    Command::new("sd-prompt-dumper")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_version_flag(true)
        .about("Prints the stable-diffusion.cpp command line that produced a PNG")
        .after_help(
            "Example:\n  sd-prompt-dumper --model ~/.models/ --vae ./myVAE.safetensors aLovelyCat.png",
        )
        .arg(
            Arg::new("model")
                .long("model")
                .short('M')
                .value_name("DIR")
                .help("Directory the model named in the metadata is resolved against")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("lora")
                .long("lora")
                .short('L')
                .value_name("DIR")
                .help("Directory holding LoRA models, passed as --lora-model-dir")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("bin")
                .long("bin")
                .short('B')
                .value_name("DIR")
                .help("Directory holding the sd executable")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("vae")
                .long("vae")
                .short('V')
                .value_name("FILE")
                .help("VAE model file, passed as --vae")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("abrv")
                .long("abrv")
                .short('a')
                .help("Use single character switches where sd has them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("endian")
                .long("endian")
                .short('e')
                .help("Print the byte order of this machine and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Extra TOML configuration file, layered over the user file")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("list-fields")
                .long("list-fields")
                .help("List the metadata labels that are understood and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log chunk scanning and tokenizing to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("files")
                .help("PNG files written by stable-diffusion.cpp")
                .index(1)
                .action(ArgAction::Append)
                .value_hint(ValueHint::FilePath),
        )
}
