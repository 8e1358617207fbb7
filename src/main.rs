//! event-forms - command line client for event application and review forms
//!
//! Loads forms, responses and guest lists from the events backend and
//! prints them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use event_forms::app::{App, AssignmentOutcome, InviteOutcome, ReviewSession};
use event_forms::backend::HttpBackend;
use event_forms::config::AppConfig;
use event_forms::state::{FormDocument, FormEditor, LoadState, StageState};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "event-forms", version, about)]
struct Cli {
    /// Event to operate on; falls back to the configured event
    #[arg(short, long, global = true)]
    event: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a form
    Show(FormArgs),
    /// Report what would block saving a form
    Check(FormArgs),
    /// Print an applicant's response
    Response {
        /// Response id
        id: i64,
    },
    /// List invited guests
    Guests,
    /// Invite a registered user as a guest
    Invite {
        email: String,
        #[arg(short, long)]
        role: String,
    },
    /// List reviewers with their allocated and completed reviews
    Reviewers,
    /// Give a reviewer more responses to review
    Assign {
        email: String,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// List reviews already written, newest first
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// List the event's tags
    Tags,
    /// Print the resolved configuration
    Config,
}

#[derive(Debug, clap::Args)]
struct FormArgs {
    /// Use the review form instead of the application form
    #[arg(long)]
    review: bool,
    /// Review stage; defaults to the event's current stage
    #[arg(long, requires = "review")]
    stage: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "event_forms=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to read configuration")?;

    if let Command::Config = cli.command {
        print_config(&config);
        return Ok(());
    }

    let event_id = cli
        .event
        .or(config.event_id)
        .context("no event given and none configured")?;
    let backend = HttpBackend::new(&config.api_url())?;
    let language = config.display_language();
    let app = App::new(backend, config)?;

    match cli.command {
        Command::Show(args) => {
            let editor = load_editor(&app, event_id, &args).await?;
            print_form(editor.document(), &language);
        }
        Command::Check(args) => {
            let editor = load_editor(&app, event_id, &args).await?;
            let issues = editor.readiness_issues();
            if issues.is_empty() {
                println!("ready to save");
            } else {
                for issue in &issues {
                    println!("{issue}");
                }
                bail!("{} issue(s) block saving", issues.len());
            }
        }
        Command::Response { id } => match app.load_response(event_id, id).await {
            LoadState::Ready(view) => print!("{view}"),
            LoadState::Error(message) => bail!(message),
            LoadState::Loading => {}
        },
        Command::Guests => match app.guest_list(event_id).await {
            LoadState::Ready(guests) => {
                for guest in guests {
                    println!(
                        "{} {} <{}> {}",
                        guest.user.firstname, guest.user.lastname, guest.user.email, guest.role
                    );
                }
            }
            LoadState::Error(message) => bail!(message),
            LoadState::Loading => {}
        },
        Command::Invite { email, role } => match app.invite_guest(event_id, &email, &role).await {
            InviteOutcome::Added => println!("invited {email} as {role}"),
            InviteOutcome::UserNotFound => bail!("no registered user with email {email}"),
            InviteOutcome::AlreadyInvited => bail!("{email} is already invited"),
            InviteOutcome::Invalid(reason) | InviteOutcome::Failed(reason) => bail!(reason),
        },
        Command::Reviewers => match app.reviewer_overview(event_id).await {
            LoadState::Ready(overview) => {
                for reviewer in &overview.reviewers {
                    let name = [reviewer.firstname.as_deref(), reviewer.lastname.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!(
                        "{name} <{}> {}/{} completed",
                        reviewer.email, reviewer.reviews_completed, reviewer.reviews_allocated
                    );
                }
                println!("unallocated: {}", overview.unallocated);
            }
            LoadState::Error(message) => bail!(message),
            LoadState::Loading => {}
        },
        Command::Assign { email, count } => {
            match app.assign_reviewer(event_id, &email, count).await {
                AssignmentOutcome::Assigned => println!("assigned {count} review(s) to {email}"),
                AssignmentOutcome::ReviewerNotFound => {
                    bail!("no registered user with email {email}")
                }
                AssignmentOutcome::Invalid(reason) | AssignmentOutcome::Failed(reason) => {
                    bail!(reason)
                }
            }
        }
        Command::History { page, limit } => match app.review_history(event_id, page, limit).await {
            LoadState::Ready(history) => {
                for entry in &history.reviews {
                    let submitted = entry
                        .submitted_timestamp
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "draft".to_string());
                    println!(
                        "response {} applicant {} {submitted}",
                        entry.review_response_id,
                        entry.reviewed_user_id.as_deref().unwrap_or("-")
                    );
                }
                println!("{} review(s) in total", history.num_entries);
            }
            LoadState::Error(message) => bail!(message),
            LoadState::Loading => {}
        },
        Command::Tags => match app.tag_list(event_id).await {
            LoadState::Ready(tags) => {
                for tag in tags {
                    println!("{} {}", tag.id, tag.name);
                }
            }
            LoadState::Error(message) => bail!(message),
            LoadState::Loading => {}
        },
        Command::Config => {}
    }
    Ok(())
}

async fn load_editor(app: &App<HttpBackend>, event_id: i64, args: &FormArgs) -> Result<FormEditor> {
    if !args.review {
        return match app.load_application_form(event_id).await {
            LoadState::Ready(editor) => Ok(editor),
            LoadState::Error(message) => bail!(message),
            LoadState::Loading => bail!("application form is still loading"),
        };
    }

    let mut session: ReviewSession = app.open_review_session(event_id).await;
    if let Some(stage) = args.stage {
        if session.tracker.stage() != Some(stage) {
            app.select_stage(&mut session, stage).await;
        }
    }
    match session.tracker.state() {
        StageState::Error(message) => bail!(message.clone()),
        StageState::Loading(_) => bail!("review form is still loading"),
        StageState::Ready(_) => {}
    }
    session.editor.context("review form did not load")
}

fn print_form(document: &FormDocument, language: &str) {
    let state = if document.backend_id().is_some() { "" } else { " (new)" };
    println!("{} form for event {}{state}", document.kind(), document.event_id);
    if let Some(settings) = document.review_settings() {
        println!(
            "stage {} active={} deadline={}",
            settings.stage,
            settings.active,
            settings
                .deadline
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "none".to_string())
        );
    }
    for section in &document.sections {
        println!();
        println!("{}. {}", section.order, section.name.text(language));
        for question in &section.questions {
            let kind = question.question_type.map_or("untyped", |t| t.as_str());
            let required = if question.required { " *" } else { "" };
            println!(
                "  {}. [{kind}] {}{required}",
                question.order,
                question.headline.text(language)
            );
        }
    }
}

fn print_config(config: &AppConfig) {
    match AppConfig::config_path() {
        Some(path) => println!("config file: {}", path.display()),
        None => println!("config file: unavailable"),
    }
    println!("api url: {}", config.api_url());
    println!("languages: {}", config.language_codes().join(", "));
    println!("display language: {}", config.display_language());
    if let Some(event_id) = config.event_id {
        println!("event: {event_id}");
    }
}
