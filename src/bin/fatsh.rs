//! Thin interactive shell over [`fat12_engine::Fat12Volume`].
//!
//! This binary is deliberately small: argument parsing, a read-eval-print
//! loop, and mapping engine errors to human-readable lines. All FAT12
//! semantics live in the library; this is just ambient plumbing around it.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fat12_engine::{Fat12Volume, FsError};

/// Interactive shell over a FAT12 disk image.
#[derive(Parser, Debug)]
#[command(name = "fatsh", about = "Browse and edit a FAT12 disk image")]
struct Args {
    /// Path to the FAT12 image file.
    image: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();

    let mut image = fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;

    {
        let mut volume = Fat12Volume::mount(&mut image)
            .with_context(|| format!("{} is not a FAT12 volume", args.image.display()))?;
        run_repl(&mut volume)?;
    }

    fs::write(&args.image, &image)
        .with_context(|| format!("writing {}", args.image.display()))?;
    Ok(())
}

fn run_repl(volume: &mut Fat12Volume) -> Result<()> {
    let stdin = io::stdin();
    print!("fatsh> ");
    io::stdout().flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            print!("fatsh> ");
            io::stdout().flush()?;
            continue;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();

        match dispatch(volume, command, &rest) {
            Ok(Control::Continue) => {}
            Ok(Control::Exit) => break,
            Err(err) => println!("error: {err}"),
        }

        print!("fatsh> ");
        io::stdout().flush()?;
    }
    println!();
    Ok(())
}

enum Control {
    Continue,
    Exit,
}

fn dispatch(volume: &mut Fat12Volume, command: &str, args: &[&str]) -> Result<Control, FsError> {
    match command {
        "ls" => {
            for entry in volume.ls()? {
                let marker = if entry.is_dir { "/" } else { "" };
                println!("{}{marker}", entry.name);
            }
        }
        "cd" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            volume.cd(name)?;
        }
        "pwd" => {
            println!("{}", volume.current_depth());
        }
        "cat" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            let bytes = volume.cat(name)?;
            io::stdout().write_all(&bytes).ok();
            println!();
        }
        "touch" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            volume.touch(name)?;
        }
        "append" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            let text = args[1..].join(" ");
            volume.append(name, text.as_bytes())?;
        }
        "mkdir" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            volume.mkdir(name)?;
        }
        "rm" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            volume.rm(name)?;
        }
        "rmdir" => {
            let name = args.first().ok_or(FsError::InvalidArgument)?;
            volume.rmdir(name)?;
        }
        "exit" | "quit" => return Ok(Control::Exit),
        "help" => {
            println!("ls | cd NAME | pwd | cat NAME | touch NAME | append NAME TEXT | mkdir NAME | rm NAME | rmdir NAME | exit");
        }
        other => {
            println!("unknown command: {other} (try 'help')");
        }
    }
    Ok(Control::Continue)
}
