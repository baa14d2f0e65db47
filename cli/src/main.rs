use std::path::Path;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docconnect::config::{Config, ConfigError};
use docconnect::drafts::{CaseDraft, EventDraft, MessageDraft, ProfileDraft};
use docconnect::filters::{CaseFilter, DoctorFilter, EventFilter, LocationMode, filter_conversations, parse_status_filter, split_events};
use docconnect::models::{CaseComment, Conversation, DoctorProfile, MedicalEvent};
use docconnect::poll::UNREAD_BADGE_POLL;
use docconnect::ranking::DoctorSort;
use docconnect::services::{self, ServiceError, Session};
use docconnect::store::http::HttpStore;
use docconnect::store::memory::MemoryStore;
use docconnect::store::{EntityStore, EntityStoreExt, FileUpload, StoreError};
use docconnect::votes::VoteKind;
use serde_json::Value;
use time::OffsetDateTime;

mod render;
mod seed;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("set up a doctor profile first (`profile edit`)")]
    MissingProfile,
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("upload of {0} failed")]
    Upload(String),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "docconnect-cli", about = "DocConnect doctor network CLI")]
struct Cli {
    #[arg(long, env = "DOCCONNECT_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "DOCCONNECT_APP_ID")]
    app_id: Option<String>,

    #[arg(long, env = "DOCCONNECT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Run against an in-memory demo network instead of the platform.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Print raw records as JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in account and profile status.
    Whoami,
    /// Home feed: top doctors, open cases, upcoming events.
    Home,
    Cases(CasesCommand),
    Doctors(DoctorsCommand),
    Chats(ChatsCommand),
    Events(EventsCommand),
    Profile(ProfileCommand),
}

// =============================================================================
// CASES
// =============================================================================

#[derive(Args, Debug)]
struct CasesCommand {
    #[command(subcommand)]
    command: CasesSubcommand,
}

#[derive(Subcommand, Debug)]
enum CasesSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// all, open, resolved, or closed
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long)]
        specialty: Option<String>,
    },
    Show {
        case_id: String,
    },
    New {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        age: String,
        #[arg(long, default_value = "Not Specified")]
        gender: String,
        #[arg(long, default_value = "")]
        complaint: String,
        #[arg(long, default_value = "")]
        history: String,
        #[arg(long, default_value = "")]
        question: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long = "attach")]
        attachments: Vec<String>,
    },
    Comment {
        case_id: String,
        content: String,
        #[arg(long, default_value_t = false)]
        treatment: bool,
    },
    Reply {
        comment_id: String,
        content: String,
    },
    Vote {
        comment_id: String,
        #[arg(value_enum)]
        kind: VoteArg,
    },
    Resolve {
        case_id: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VoteArg {
    Like,
    Dislike,
}

// =============================================================================
// DOCTORS
// =============================================================================

#[derive(Args, Debug)]
struct DoctorsCommand {
    #[command(subcommand)]
    command: DoctorsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DoctorsSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long, default_value = "")]
        location: String,
        /// response_rate, qualifications, or experience
        #[arg(long, default_value = "response_rate")]
        sort: String,
    },
    Cities,
}

// =============================================================================
// CHATS
// =============================================================================

#[derive(Args, Debug)]
struct ChatsCommand {
    #[command(subcommand)]
    command: ChatsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ChatsSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Print a thread and mark it read.
    Open {
        conversation_id: String,
    },
    Send {
        conversation_id: String,
        #[arg(default_value = "")]
        content: String,
        #[arg(long)]
        attach: Option<String>,
    },
    /// Open (or reuse) a conversation with the doctor owning `account`.
    Start {
        account: String,
    },
    Unread {
        /// Keep polling on the badge interval.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
}

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Args, Debug)]
struct EventsCommand {
    #[command(subcommand)]
    command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EventsSubcommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "type")]
        event_type: Option<String>,
        /// all, online, or in-person
        #[arg(long, default_value = "all")]
        location: String,
        #[arg(long, default_value_t = false)]
        past: bool,
    },
    Attend {
        event_id: String,
    },
    Interest {
        event_id: String,
    },
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        time: String,
        #[arg(long = "type", default_value = "Conference")]
        event_type: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        venue: String,
        #[arg(long, default_value_t = false)]
        online: bool,
        #[arg(long, default_value_t = false)]
        free: bool,
        #[arg(long, default_value = "")]
        organizer: String,
    },
}

// =============================================================================
// PROFILE
// =============================================================================

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Edit(ProfileEditArgs),
}

#[derive(Args, Debug)]
struct ProfileEditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    specialty: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    years: Option<String>,
    /// `DEGREE[:INSTITUTION[:YEAR]]`
    #[arg(long = "add-degree")]
    add_degrees: Vec<String>,
    #[arg(long = "add-interest")]
    add_interests: Vec<String>,
    #[arg(long = "remove-interest")]
    remove_interests: Vec<String>,
    #[arg(long)]
    photo: Option<String>,
}

// =============================================================================
// ENTRY
// =============================================================================

struct Ctx {
    store: Box<dyn EntityStore>,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store: Box<dyn EntityStore> = if cli.offline {
        let store = MemoryStore::new();
        seed::seed_demo(&store).await?;
        tracing::info!("using offline demo network");
        Box::new(store)
    } else {
        let config = Config::from_lookup(|key| match key {
            "DOCCONNECT_BASE_URL" => cli.base_url.clone(),
            "DOCCONNECT_APP_ID" => cli.app_id.clone(),
            "DOCCONNECT_TOKEN" => cli.token.clone(),
            other => std::env::var(other).ok(),
        })?;
        tracing::debug!(base_url = %config.base_url, app_id = %config.app_id, "using platform");
        Box::new(HttpStore::new(&config)?)
    };
    let ctx = Ctx { store, json: cli.json };

    match cli.command {
        Command::Whoami => run_whoami(&ctx).await,
        Command::Home => run_home(&ctx).await,
        Command::Cases(cmd) => run_cases(&ctx, cmd.command).await,
        Command::Doctors(cmd) => run_doctors(&ctx, cmd.command).await,
        Command::Chats(cmd) => run_chats(&ctx, cmd.command).await,
        Command::Events(cmd) => run_events(&ctx, cmd.command).await,
        Command::Profile(cmd) => run_profile(&ctx, cmd.command).await,
    }
}

async fn session(ctx: &Ctx) -> Result<Session, CliError> {
    Ok(services::session::load_session(&*ctx.store).await?)
}

fn today() -> time::Date {
    OffsetDateTime::now_utc().date()
}

fn emit<T: serde::Serialize>(ctx: &Ctx, records: &T, table: impl FnOnce() -> String) -> Result<(), CliError> {
    if ctx.json {
        print_json(&serde_json::to_value(records)?)
    } else {
        print!("{}", table());
        Ok(())
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

async fn run_whoami(ctx: &Ctx) -> Result<(), CliError> {
    let session = session(ctx).await?;
    println!("{} <{}>", session.display_name(), session.email());
    if services::session::needs_profile(&session) {
        println!("no doctor profile yet; run `profile edit`");
    }
    Ok(())
}

async fn run_home(ctx: &Ctx) -> Result<(), CliError> {
    let session = session(ctx).await?;
    let feed = services::network::load_home(&*ctx.store, session.email(), today()).await?;
    if ctx.json {
        return print_json(&serde_json::json!({
            "top_doctors": feed.top_doctors,
            "open_cases": feed.open_cases,
            "upcoming_events": feed.upcoming_events,
        }));
    }
    println!("Top doctors");
    print!("{}", render::doctor_table(&feed.top_doctors));
    println!("\nOpen cases");
    print!("{}", render::case_table(&feed.open_cases));
    println!("\nUpcoming events");
    print!("{}", render::event_table(&feed.upcoming_events, session.email(), today()));
    Ok(())
}

// =============================================================================
// CASE COMMANDS
// =============================================================================

async fn run_cases(ctx: &Ctx, command: CasesSubcommand) -> Result<(), CliError> {
    let store = &*ctx.store;
    match command {
        CasesSubcommand::List { search, status, specialty } => {
            let filter = CaseFilter { search, status: parse_status_filter(&status), specialty };
            let cases = filter.apply(&services::cases::list_cases(store).await?);
            emit(ctx, &cases, || render::case_table(&cases))
        }
        CasesSubcommand::Show { case_id } => {
            let case = services::cases::load_case(store, &case_id)
                .await?
                .ok_or(CliError::NotFound { entity: "case", id: case_id.clone() })?;
            let threads = services::cases::load_discussion(store, &case_id).await?;
            if ctx.json {
                let comments: Vec<&CaseComment> = threads.iter().map(|t| &t.comment).collect();
                return print_json(&serde_json::json!({ "case": case, "comments": comments }));
            }
            print!("{}", render::case_detail(&case, &threads));
            Ok(())
        }
        CasesSubcommand::New { title, age, gender, complaint, history, question, tags, attachments } => {
            let session = session(ctx).await?;
            let mut draft = CaseDraft {
                title,
                patient_age: age,
                patient_gender: gender,
                chief_complaint: complaint,
                history,
                question,
                ..CaseDraft::default()
            };
            for tag in &tags {
                draft.toggle_specialty(tag);
            }
            for path in &attachments {
                let file = read_upload(path)?;
                if let Some(url) = services::uploads::upload(store, file).await {
                    draft.attachments.push(url);
                }
            }
            let case = services::cases::create_case(store, &session, &draft).await?;
            println!("posted case {}", case.id);
            Ok(())
        }
        CasesSubcommand::Comment { case_id, content, treatment } => {
            let session = session(ctx).await?;
            let case = services::cases::load_case(store, &case_id)
                .await?
                .ok_or(CliError::NotFound { entity: "case", id: case_id.clone() })?;
            let comment = services::cases::add_comment(store, &session, &case, &content, treatment).await?;
            println!("posted comment {}", comment.id);
            Ok(())
        }
        CasesSubcommand::Reply { comment_id, content } => {
            let session = session(ctx).await?;
            let comment = find_comment(store, &comment_id).await?;
            let reply = services::cases::add_reply(store, &session, &comment, &content).await?;
            println!("posted reply {}", reply.id);
            Ok(())
        }
        CasesSubcommand::Vote { comment_id, kind } => {
            let session = session(ctx).await?;
            let comment = find_comment(store, &comment_id).await?;
            let kind = match kind {
                VoteArg::Like => VoteKind::Like,
                VoteArg::Dislike => VoteKind::Dislike,
            };
            let updated = services::cases::vote(store, &session, &comment, kind).await?;
            println!("{} likes, {} dislikes", updated.likes, updated.dislikes);
            Ok(())
        }
        CasesSubcommand::Resolve { case_id } => {
            let session = session(ctx).await?;
            let case = services::cases::load_case(store, &case_id)
                .await?
                .ok_or(CliError::NotFound { entity: "case", id: case_id.clone() })?;
            let case = services::cases::mark_resolved(store, &session, &case).await?;
            println!("case {} is {}", case.id, case.status.as_str());
            Ok(())
        }
    }
}

async fn find_comment(store: &dyn EntityStore, comment_id: &str) -> Result<CaseComment, CliError> {
    store
        .entities::<CaseComment>()
        .find(comment_id)
        .await?
        .ok_or_else(|| CliError::NotFound { entity: "comment", id: comment_id.to_owned() })
}

// =============================================================================
// DOCTOR COMMANDS
// =============================================================================

async fn run_doctors(ctx: &Ctx, command: DoctorsSubcommand) -> Result<(), CliError> {
    let session = session(ctx).await?;
    let doctors = services::network::list_doctors(&*ctx.store).await?;
    match command {
        DoctorsSubcommand::List { search, specialty, location, sort } => {
            let filter = DoctorFilter { search, specialty, location };
            let sort = DoctorSort::parse(&sort).unwrap_or_default();
            let found = services::network::browse(&doctors, session.email(), &filter, sort);
            emit(ctx, &found, || render::doctor_table(&found))
        }
        DoctorsSubcommand::Cities => {
            let cities = docconnect::filters::unique_cities(&doctors);
            emit(ctx, &cities, || cities.iter().map(|c| format!("{c}\n")).collect())
        }
    }
}

// =============================================================================
// CHAT COMMANDS
// =============================================================================

async fn run_chats(ctx: &Ctx, command: ChatsSubcommand) -> Result<(), CliError> {
    let store = &*ctx.store;
    let session = session(ctx).await?;
    let me = session.email();
    match command {
        ChatsSubcommand::List { search } => {
            let conversations = services::chat::conversations_for(store, me).await?;
            let shown = filter_conversations(&conversations, me, &search);
            emit(ctx, &shown, || render::conversation_table(&shown, me, OffsetDateTime::now_utc()))
        }
        ChatsSubcommand::Open { conversation_id } => {
            let conversation = find_conversation(store, me, &conversation_id).await?;
            let messages = services::chat::messages_in(store, &conversation.id).await?;
            if ctx.json {
                print_json(&serde_json::to_value(&messages)?)?;
            } else {
                print!("{}", render::thread(&messages, me));
            }
            services::chat::mark_conversation_read(store, me, &conversation, &messages).await?;
            Ok(())
        }
        ChatsSubcommand::Send { conversation_id, content, attach } => {
            let conversation = find_conversation(store, me, &conversation_id).await?;
            let attachment = match attach {
                Some(path) => Some(
                    services::uploads::upload_attachment(store, read_upload(&path)?)
                        .await
                        .ok_or(CliError::Upload(path))?,
                ),
                None => None,
            };
            let draft = MessageDraft { content, attachment };
            let message = services::chat::send_message(store, &session, &conversation, &draft).await?;
            println!("sent {}", message.id);
            Ok(())
        }
        ChatsSubcommand::Start { account } => {
            let query = docconnect::query::Query::new().equals("created_by", account.as_str());
            let doctor = store
                .entities::<DoctorProfile>()
                .filter(&query, None, Some(1))
                .await?
                .into_iter()
                .next()
                .ok_or(CliError::NotFound { entity: "doctor", id: account })?;
            let conversation = services::chat::start_conversation(store, &session, &doctor).await?;
            println!("conversation {}", conversation.id);
            Ok(())
        }
        ChatsSubcommand::Unread { watch } => {
            if !watch {
                println!("{}", services::chat::total_unread(store, me).await?);
                return Ok(());
            }
            let mut interval = tokio::time::interval(UNREAD_BADGE_POLL);
            loop {
                interval.tick().await;
                match services::chat::total_unread(store, me).await {
                    Ok(total) => println!("{total}"),
                    Err(e) => tracing::warn!(error = %e, "unread poll failed"),
                }
            }
        }
    }
}

async fn find_conversation(store: &dyn EntityStore, viewer: &str, id: &str) -> Result<Conversation, CliError> {
    services::chat::conversations_for(store, viewer)
        .await?
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| CliError::NotFound { entity: "conversation", id: id.to_owned() })
}

// =============================================================================
// EVENT COMMANDS
// =============================================================================

async fn run_events(ctx: &Ctx, command: EventsSubcommand) -> Result<(), CliError> {
    let store = &*ctx.store;
    match command {
        EventsSubcommand::List { search, event_type, location, past } => {
            let session = session(ctx).await?;
            let filter = EventFilter {
                search,
                event_type,
                location: LocationMode::parse(&location).unwrap_or_default(),
            };
            let split = split_events(filter.apply(&services::events::list_events(store).await?), today());
            let shown = if past { split.past } else { split.upcoming };
            emit(ctx, &shown, || render::event_table(&shown, session.email(), today()))
        }
        EventsSubcommand::Attend { event_id } => {
            let session = session(ctx).await?;
            let event = find_event(store, &event_id).await?;
            let event = services::events::toggle_attendance(store, &event, session.email()).await?;
            println!("{} attending", event.attendees.len());
            Ok(())
        }
        EventsSubcommand::Interest { event_id } => {
            let session = session(ctx).await?;
            let event = find_event(store, &event_id).await?;
            let event = services::events::toggle_interest(store, &event, session.email()).await?;
            println!("{} interested", event.interested.len());
            Ok(())
        }
        EventsSubcommand::New { title, date, time, event_type, city, venue, online, free, organizer } => {
            let draft = EventDraft {
                title,
                date,
                time,
                event_type,
                location_city: city,
                venue,
                is_online: online,
                is_free: free,
                organizer,
                ..EventDraft::default()
            };
            let event = services::events::create_event(store, &draft).await?;
            println!("created event {}", event.id);
            Ok(())
        }
    }
}

async fn find_event(store: &dyn EntityStore, event_id: &str) -> Result<MedicalEvent, CliError> {
    store
        .entities::<MedicalEvent>()
        .find(event_id)
        .await?
        .ok_or_else(|| CliError::NotFound { entity: "event", id: event_id.to_owned() })
}

// =============================================================================
// PROFILE COMMANDS
// =============================================================================

async fn run_profile(ctx: &Ctx, command: ProfileSubcommand) -> Result<(), CliError> {
    let store = &*ctx.store;
    let session = session(ctx).await?;
    match command {
        ProfileSubcommand::Show => {
            let profile = session.profile.clone().ok_or(CliError::MissingProfile)?;
            let cases = services::profile::my_cases(store, session.email()).await?;
            let comments = services::profile::my_comments(store, session.email()).await?;
            if ctx.json {
                return print_json(&serde_json::json!({ "profile": profile, "cases": cases, "comments": comments.len() }));
            }
            print!("{}", render::profile_card(&profile, cases.len(), comments.len()));
            Ok(())
        }
        ProfileSubcommand::Edit(args) => {
            let base = session.profile.clone().unwrap_or_else(|| DoctorProfile {
                full_name: session.display_name(),
                ..DoctorProfile::default()
            });
            let mut draft = ProfileDraft::from(&base);
            apply_profile_edits(&mut draft, &args);
            if let Some(path) = &args.photo {
                if let Some(url) = services::uploads::upload(store, read_upload(path)?).await {
                    draft.base.profile_photo = Some(url);
                }
            }
            let profile = draft.to_profile().map_err(ServiceError::from)?;
            let saved = services::profile::save_profile(store, &profile).await?;
            println!("saved profile {}", saved.id);
            Ok(())
        }
    }
}

fn apply_profile_edits(draft: &mut ProfileDraft, args: &ProfileEditArgs) {
    let fields = [
        (&args.name, &mut draft.base.full_name),
        (&args.specialty, &mut draft.base.specialty),
        (&args.city, &mut draft.base.location_city),
        (&args.country, &mut draft.base.location_country),
        (&args.bio, &mut draft.base.bio),
    ];
    for (value, field) in fields {
        if let Some(value) = value {
            value.clone_into(field);
        }
    }
    if let Some(years) = &args.years {
        years.clone_into(&mut draft.years_experience);
    }
    for spec in &args.add_degrees {
        let mut parts = spec.splitn(3, ':');
        let degree = parts.next().unwrap_or_default();
        let institution = parts.next().unwrap_or_default();
        let year = parts.next().unwrap_or_default();
        if let Err(e) = draft.add_qualification(degree, institution, year) {
            tracing::warn!(spec = %spec, error = %e, "skipping qualification");
        }
    }
    for interest in &args.add_interests {
        draft.add_interest(interest);
    }
    for interest in &args.remove_interests {
        draft.remove_interest(interest);
    }
}

fn read_upload(path: &str) -> Result<FileUpload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadFile { path: path.to_owned(), source })?;
    let file_name = Path::new(path)
        .file_name()
        .map_or_else(|| path.to_owned(), |n| n.to_string_lossy().into_owned());
    let content_type = render::content_type_for(&file_name).to_owned();
    Ok(FileUpload { file_name, content_type, bytes })
}
