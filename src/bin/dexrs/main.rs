use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "dexrs", about = "Parse a DEX file and print a short summary")]
struct Args {
    /// Path to the .dex file to parse
    path: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let bytes = match fs::read(&args.path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error reading {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let file = match dexrs::parse(&bytes) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error parsing {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let external_classes = file.classes.iter().filter(|c| c.is_external()).count();
    println!("strings:    {}", file.strings.len());
    println!("types:      {}", file.types.len());
    println!("prototypes: {}", file.prototypes.len());
    println!("fields:     {}", file.fields.len());
    println!("methods:    {}", file.methods.len());
    println!(
        "classes:    {} ({} local, {} external)",
        file.classes.len(),
        file.classes.len() - external_classes,
        external_classes
    );

    for class in file.classes.iter().filter(|c| !c.is_external()) {
        let descriptor = file.string_at(class.descriptor).unwrap_or("<unknown>");
        println!("  {}", dexrs::desc_names::pretty_desc(descriptor));
    }

    ExitCode::SUCCESS
}
