mod error;
mod models;
mod services;
mod utils;

use anyhow::{Context, Result};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use services::git_platforms::GitHubClient;
use services::wrapped_job::{WrappedJob, WrappedRequest};
use std::io::{self, BufRead, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;
use utils::config::Config;
use utils::validators::{current_year, parse_year, validate_token, validate_username};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=================================================");
    println!("🎁 GitHub Wrapped");
    println!("=================================================");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("❌").red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let term = Term::stdout();

    let request = prompt_request(&term, &config)?;

    let client = GitHubClient::new()?;
    let job = WrappedJob::new(&client, &config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = job.run(&request, |stage| pb.set_message(stage.to_string())).await;
    pb.finish_and_clear();

    let outcome = result?;
    let summary = &outcome.summary;

    println!(
        "📊 {} commits, {} pull requests, {} issues in {}",
        summary.total_commits, summary.total_pull_requests, summary.total_issues, summary.year
    );
    println!(
        "{} Saved your wrapped card to {}",
        style("✅").green(),
        style(outcome.output_path.display()).bold()
    );

    Ok(())
}

fn prompt_request(term: &Term, config: &Config) -> Result<WrappedRequest> {
    let interactive = io::stdin().is_terminal();

    term.write_str("👤 GitHub username: ")?;
    let username = read_answer(term, interactive, false)?.trim().to_string();
    validate_username(&username)?;

    let token = match &config.token {
        Some(token) => {
            log::info!("Using access token from GITHUB_TOKEN");
            token.clone()
        }
        None => {
            term.write_str("🔑 Personal access token: ")?;
            let token = read_answer(term, interactive, true)?.trim().to_string();
            validate_token(&token)?;
            token
        }
    };

    let this_year = current_year();
    term.write_str(&format!("📅 Year [{}]: ", this_year))?;
    let year = parse_year(&read_answer(term, interactive, false)?, this_year)?;

    Ok(WrappedRequest {
        username,
        token,
        year,
    })
}

/// `Term` only reads from a terminal, so piped answers come from stdin directly
fn read_answer(term: &Term, interactive: bool, secret: bool) -> io::Result<String> {
    match (interactive, secret) {
        (true, true) => term.read_secure_line(),
        (true, false) => term.read_line(),
        (false, _) => read_piped_line(&mut io::stdin().lock()),
    }
}

fn read_piped_line(reader: &mut impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_piped_line() {
        let mut input = Cursor::new("octocat\r\nghp_token\n\n");

        assert_eq!(read_piped_line(&mut input).unwrap(), "octocat");
        assert_eq!(read_piped_line(&mut input).unwrap(), "ghp_token");
        assert_eq!(read_piped_line(&mut input).unwrap(), "");
        // Exhausted input reads as an empty answer
        assert_eq!(read_piped_line(&mut input).unwrap(), "");
    }
}
