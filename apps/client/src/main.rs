use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod api;
mod history;
mod input;

use api::{BackendClient, PdfUpload};
use history::History;
use input::{Command, Input, LineBuffer};

const HELP: &str = "\
Type a question (several lines allowed) and finish it with an empty line.
Examples: \"Extract the resume\", \"Generate MCQs\", \"Check skill gaps for a Data Analyst role\"

Commands:
  :file <path>   load a PDF to ask about
  :history       show the conversation so far
  :clear         forget the conversation
  :help          show this text
  :quit          exit";

/// Agentic PDF Assistant - ask questions about a PDF through the agent backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// URL of the backend query endpoint
    #[arg(long, default_value = "http://localhost:8000/query")]
    backend_url: String,

    /// PDF to load at startup
    #[arg(long)]
    file: Option<PathBuf>,

    /// Seconds to wait for an answer
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", env!("CARGO_CRATE_NAME")))),
        )
        .with_writer(std::io::stderr)
        .init();

    let backend = BackendClient::new(cli.backend_url.clone(), cli.timeout_secs)?;
    let mut pdf: Option<PdfUpload> = None;
    let mut history = History::new();

    println!("Agentic PDF Assistant");
    println!("Backend: {}", backend.url());
    println!("{HELP}\n");

    if let Some(path) = cli.file {
        pdf = load_pdf(&path);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buffer = LineBuffer::new();

    loop {
        prompt(&buffer);
        let Some(line) = lines.next_line().await? else {
            // End of input still submits a question in progress.
            if let Some(Input::Question(question)) = buffer.finish() {
                ask(&backend, pdf.as_ref(), &mut history, &question).await;
            }
            break;
        };

        match buffer.push_line(&line) {
            None => {}
            Some(Input::Question(question)) => {
                ask(&backend, pdf.as_ref(), &mut history, &question).await;
            }
            Some(Input::Command(command)) => match command {
                Command::File(path) => {
                    if let Some(loaded) = load_pdf(&path) {
                        pdf = Some(loaded);
                    }
                }
                Command::History => println!("{}", history.render()),
                Command::Clear => {
                    history.clear();
                    println!("History cleared.");
                }
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Invalid(message) => eprintln!("{message}"),
            },
        }
    }

    Ok(())
}

fn prompt(buffer: &LineBuffer) {
    print!("{}", if buffer.is_collecting() { "... " } else { "> " });
    let _ = std::io::stdout().flush();
}

fn load_pdf(path: &std::path::Path) -> Option<PdfUpload> {
    match PdfUpload::from_path(path) {
        Ok(upload) => {
            println!("Loaded {} ({} bytes)", upload.file_name, upload.data.len());
            Some(upload)
        }
        Err(e) => {
            eprintln!("{e}");
            None
        }
    }
}

async fn ask(backend: &BackendClient, pdf: Option<&PdfUpload>, history: &mut History, question: &str) {
    let Some(pdf) = pdf else {
        eprintln!("Please load a PDF first with :file <path>");
        return;
    };
    if question.trim().is_empty() {
        eprintln!("Please enter a question");
        return;
    }

    println!("Agent is thinking...");
    match backend.ask(pdf, question).await {
        Ok(answer) => {
            history.push(question, answer);
            println!("{}", history.render());
        }
        Err(e) => eprintln!("{e}"),
    }
}
