//! Send feature feedback or a survey to a feedback service.
//!
//! The CAPTCHA challenge is replaced by a fixed token (`--token`), which the
//! development stub in `feedback-web` accepts by default.
//!
//! # Examples
//!
//! ```sh
//! # Thumbs up on a feature, with a comment
//! feedback --service-url http://127.0.0.1:3002/api/feedback \
//!   feature --id search-filters --vote up --comment "Saved me a lot of time"
//!
//! # Answer a survey defined in a JSON file
//! feedback survey --id onboarding --questions survey.json \
//!   --vote 0=down --comment 1="Too many steps"
//! ```
//!
//! A survey file is a JSON array of question definitions:
//!
//! ```json
//! [
//!   {"questionText": "Was setup easy?", "type": "vote", "required": true},
//!   {"questionText": "What would you change?", "type": "comment"},
//!   {"questionText": "client", "type": "extra", "extraInfo": "cli"}
//! ]
//! ```

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use feedback_rs::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Send feature feedback or a survey to a feedback service.
#[derive(Parser)]
#[command(name = "feedback")]
struct Cli {
    /// Feedback service endpoint
    #[arg(long, global = true, default_value = "http://127.0.0.1:3002/api/feedback")]
    service_url: String,

    /// CAPTCHA token to send with the submission
    #[arg(long, global = true, default_value = "dev-token")]
    token: String,

    /// Time limit for each step of the submission, in milliseconds
    #[arg(long, global = true, default_value_t = 8000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Vote on a single feature
    Feature {
        /// Feature identifier
        #[arg(long)]
        id: String,

        /// `up` or `down`
        #[arg(long)]
        vote: Vote,

        /// Optional comment
        #[arg(long)]
        comment: Option<String>,
    },
    /// Answer and submit a survey
    Survey {
        /// Survey identifier
        #[arg(long)]
        id: String,

        /// JSON file with the survey's questions
        #[arg(long)]
        questions: String,

        /// Vote on a question, as `INDEX=up` or `INDEX=down` (repeatable)
        #[arg(long = "vote")]
        votes: Vec<String>,

        /// Comment on a question, as `INDEX=text` (repeatable)
        #[arg(long = "comment")]
        comments: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(summary) => println!("{summary}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<String, String> {
    let backend = HttpFeedbackService::new(FeedbackClientConfig::new(&cli.service_url))
        .map_err(|e| format!("failed to create HTTP client: {e}"))?;
    let backend: Arc<dyn FeedbackBackend> = Arc::new(backend);
    let captcha: Arc<dyn CaptchaProvider> = Arc::new(StaticTokenProvider::new(&cli.token));
    let timeout = std::time::Duration::from_millis(cli.timeout_ms);

    match &cli.command {
        Command::Feature { id, vote, comment } => {
            let widget = FeatureFeedbackWidget::new(FeatureConfig::new(id).with_submit_timeout(timeout))
                .with_backend(backend)
                .with_captcha(captcha);
            widget.select(*vote);
            if let Some(comment) = comment {
                widget.set_comment(comment.as_str());
            }
            match widget.submit().await.map_err(|e| e.to_string())? {
                SubmissionState::Submitted => Ok(format!("Submitted {vote} for feature '{id}'.")),
                _ => Err(widget.error_message().unwrap_or_else(|| "submission failed".into())),
            }
        }
        Command::Survey {
            id,
            questions,
            votes,
            comments,
        } => {
            let questions = load_questions(Path::new(questions))?;
            let survey = SubmissionCoordinator::for_questions(
                SurveyConfig::new(id).with_submit_timeout(timeout),
                questions,
            )
            .with_backend(backend)
            .with_captcha(captcha)
            .with_observer(LoggingObserver);

            for assignment in votes {
                let (index, vote) = parse_assignment(assignment)?;
                let vote: Vote = vote.parse()?;
                survey
                    .set_vote(QuestionId(index), vote)
                    .map_err(|e| e.to_string())?;
            }
            for assignment in comments {
                let (index, text) = parse_assignment(assignment)?;
                survey
                    .set_comment(QuestionId(index), text)
                    .map_err(|e| e.to_string())?;
            }

            match survey.submit().await.map_err(|e| e.to_string())? {
                SubmissionState::Submitted => {
                    let count = survey.last_receipt().map_or(0, |r| r.response_count);
                    Ok(format!("Submitted survey '{id}' with {count} response(s)."))
                }
                _ => {
                    let mut message = survey
                        .error_message()
                        .unwrap_or_else(|| "submission failed".into());
                    let failing = survey.failing_questions();
                    if !failing.is_empty() {
                        let list: Vec<String> = failing.iter().map(|q| q.index().to_string()).collect();
                        message.push_str(&format!(" (questions {})", list.join(", ")));
                    }
                    Err(message)
                }
            }
        }
    }
}

/// Read a JSON array of question definitions.
fn load_questions(path: &Path) -> Result<Vec<Question>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read survey file '{}': {e}", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse survey file '{}': {e}", path.display()))
}

/// Split `INDEX=value` into a question position and its value.
fn parse_assignment(arg: &str) -> Result<(usize, &str), String> {
    let (index, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got '{arg}'"))?;
    let index = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid question index '{index}'"))?;
    Ok((index, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_assignments() {
        assert_eq!(parse_assignment("0=up"), Ok((0, "up")));
        assert_eq!(parse_assignment("2=a=b"), Ok((2, "a=b")));
        assert!(parse_assignment("up").is_err());
        assert!(parse_assignment("x=up").is_err());
    }

    #[test]
    fn loads_survey_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"questionText": "Was setup easy?", "type": "vote", "required": true}},
                {{"questionText": "client", "type": "extra", "extraInfo": "cli"}}
            ]"#
        )
        .unwrap();

        let questions = load_questions(file.path()).unwrap();
        assert_eq!(questions.len(), 2);
        assert!(questions[0].is_required());
        assert_eq!(questions[1].extra_info(), Some("cli"));
    }

    #[test]
    fn reports_bad_survey_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(load_questions(&missing).unwrap_err().contains("failed to read"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(load_questions(&bad).unwrap_err().contains("failed to parse"));
    }

    #[test]
    fn cli_accepts_repeated_assignments() {
        let cli = Cli::try_parse_from([
            "feedback",
            "survey",
            "--id",
            "s",
            "--questions",
            "q.json",
            "--vote",
            "0=up",
            "--comment",
            "1=hi",
            "--comment",
            "2=there",
            "--timeout-ms",
            "100",
        ])
        .unwrap();
        assert_eq!(cli.timeout_ms, 100);
        match cli.command {
            Command::Survey { votes, comments, .. } => {
                assert_eq!(votes, vec!["0=up"]);
                assert_eq!(comments, vec!["1=hi", "2=there"]);
            }
            Command::Feature { .. } => panic!("expected survey"),
        }
    }
}
