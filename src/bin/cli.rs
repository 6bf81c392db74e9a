//! SegKV CLI Client
//!
//! Talks to a running server, or inspects a data directory offline.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use segkv::codec::SegmentEntry;
use segkv::protocol::{read_response, write_command, Command, Status};
use segkv::storage::{IntegrityChecker, SegmentReader};

/// SegKV CLI
#[derive(Parser, Debug)]
#[command(name = "segkv-cli")]
#[command(about = "CLI for the SegKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,

    /// Check segment checksums in a data directory (offline)
    Verify {
        /// Data directory of a stopped server
        #[arg(short, long, default_value = "./segkv_data")]
        data_dir: PathBuf,
    },

    /// Print every entry of one segment file (offline)
    Dump {
        /// Path to a segment file
        segment: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let outcome = match args.command {
        Commands::Get { key } => remote(&args.server, Command::Get { key: key.into_bytes() }),
        Commands::Set { key, value } => remote(
            &args.server,
            Command::Set {
                key: key.into_bytes(),
                value: value.into_bytes(),
            },
        ),
        Commands::Del { key } => remote(&args.server, Command::Delete { key: key.into_bytes() }),
        Commands::Ping => remote(&args.server, Command::Ping),
        Commands::Verify { data_dir } => verify(data_dir),
        Commands::Dump { segment } => dump(segment),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn remote(addr: &str, command: Command) -> segkv::Result<ExitCode> {
    let stream = TcpStream::connect(addr)
        .map_err(|e| segkv::SegError::Network(format!("cannot connect to {}: {}", addr, e)))?;
    let mut writer = BufWriter::new(stream.try_clone()?);
    let mut reader = BufReader::new(stream);

    write_command(&mut writer, &command)?;
    let response = read_response(&mut reader)?;

    let payload = response
        .payload
        .map(|p| String::from_utf8_lossy(&p).into_owned());

    match response.status {
        Status::Ok => {
            println!("{}", payload.unwrap_or_else(|| "OK".to_string()));
            Ok(ExitCode::SUCCESS)
        }
        Status::NotFound => {
            println!("(not found)");
            Ok(ExitCode::SUCCESS)
        }
        Status::Error => {
            eprintln!("server error: {}", payload.unwrap_or_default());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn verify(data_dir: PathBuf) -> segkv::Result<ExitCode> {
    let reports = IntegrityChecker::check_all(&data_dir.join("segments"))?;
    let mut failed = false;

    for report in &reports {
        match &report.status {
            segkv::storage::IntegrityStatus::Ok => println!("{} - Ok", report.file_name()),
            segkv::storage::IntegrityStatus::Fail { reason } => {
                failed = true;
                println!("{} - Fail ({})", report.file_name(), reason);
            }
        }
    }
    println!("{} segment(s) checked", reports.len());

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn dump(segment: PathBuf) -> segkv::Result<ExitCode> {
    let mut reader = SegmentReader::open(&segment)?;
    let header = reader.header().clone();

    println!(
        "entries={} smallest_key={:?} largest_key={:?} version={}",
        header.entry_count,
        String::from_utf8_lossy(&header.smallest_key),
        String::from_utf8_lossy(&header.largest_key),
        header.version
    );

    for entry in reader.iter()? {
        match entry? {
            SegmentEntry::Set { key, value } => println!(
                "S {:?} = {:?}",
                String::from_utf8_lossy(&key),
                String::from_utf8_lossy(&value)
            ),
            SegmentEntry::Delete { key } => println!("D {:?}", String::from_utf8_lossy(&key)),
        }
    }

    Ok(ExitCode::SUCCESS)
}
