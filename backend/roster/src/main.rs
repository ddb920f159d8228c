use std::fs;

use anyhow::Context;
use attendance_server::{
    database::{Database, RedisDatabase},
    utils::password_digest,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use roster::{Roster, parse_roster};

const BATCH_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add every roll number in a file, one per line
    Import { file: String },

    /// Add roll numbers given on the command line
    Add {
        #[arg(required = true)]
        roll_numbers: Vec<String>,
    },

    /// Replace the teacher password
    Password { password: String },

    /// Open attendance without a teacher login
    Open,

    /// Close attendance
    Close,

    /// Print every attendance record
    Results,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let database = RedisDatabase::connect(&args.redis_url)
        .await
        .with_context(|| format!("failed to connect to {}", args.redis_url))?;

    match args.command {
        Command::Import { file } => {
            let text = fs::read_to_string(&file).with_context(|| format!("failed to read {file}"))?;
            import(&database, parse_roster(&text)).await?;
        }
        Command::Add { roll_numbers } => {
            import(&database, parse_roster(&roll_numbers.join("\n"))).await?;
        }
        Command::Password { password } => {
            database.save_credential(&password_digest(&password)).await?;
            println!("Teacher password updated.");
        }
        Command::Open => {
            database.set_accessible(true).await?;
            println!("Attendance open.");
        }
        Command::Close => {
            database.set_accessible(false).await?;
            println!("Attendance closed.");
        }
        Command::Results => print_results(&database).await?,
    }

    Ok(())
}

async fn import(database: &impl Database, roster: Roster) -> anyhow::Result<()> {
    for (line, entry) in &roster.rejected {
        println!("Skipping line {line}: {entry:?} is not a roll number");
    }

    let pb = ProgressBar::new(roster.roll_numbers.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut added = 0;
    for batch in roster.roll_numbers.chunks(BATCH_SIZE) {
        added += database.add_users(batch).await?;
        pb.inc(batch.len() as u64);
    }

    pb.finish_with_message("Done");

    println!("\nNew Users: {added}");
    println!("Already Known: {}", roster.roll_numbers.len() - added);
    println!("Duplicates In Input: {}", roster.duplicates);
    println!("Rejected: {}", roster.rejected.len());

    Ok(())
}

async fn print_results(database: &impl Database) -> anyhow::Result<()> {
    let results = database.results().await?;

    if results.is_empty() {
        println!("No attendance recorded.");
        return Ok(());
    }

    println!("{:<16} {:>6} {:>12} {:>10}", "Roll Number", "Count", "Last Marked", "Distance");

    for record in results {
        let last_marked = record
            .last_marked
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<16} {:>6} {:>12} {:>9.1}m",
            record.roll_number, record.attendance_count, last_marked, record.distance
        );
    }

    Ok(())
}
