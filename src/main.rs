use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use dialoguer::{Confirm, Input, Password};
use dotenvy::dotenv;

use tutorlink::modules::auth::AuthService;
use tutorlink::modules::dashboard::DashboardState;
use tutorlink::modules::invitations::{
    InvitationService, InvitationStep, InvitationWizard, ProfileFields,
};
use tutorlink::modules::notifications::{NotificationService, NotificationsState, UnreadCounter};
use tutorlink::modules::payments::monitor::{PAYMENTS_STREAM, TRANSACTIONS_STREAM, WEBHOOKS_STREAM};
use tutorlink::modules::payments::{ApprovalInbox, PaymentMonitor};
use tutorlink::modules::receipts::ReceiptService;
use tutorlink::modules::scheduler::SchedulerService;
use tutorlink::modules::students::StudentService;
use tutorlink::modules::tasks::TaskService;
use tutorlink::modules::teachers::TeacherService;
use tutorlink::utils::wizard::WizardStep;
use tutorlink::{ApiClient, PageQuery, TokenStore};
use tutorlink_config::{ApiConfig, PollConfig, RealtimeConfig, StorageConfig};
use tutorlink_models::ParentId;
use tutorlink_models::analytics::AnalyticsPeriod;
use tutorlink_models::auth::LoginRequest;
use tutorlink_models::invitations::InvitationFilterParams;
use tutorlink_models::notifications::NotificationFilterParams;
use tutorlink_models::receipts::ReceiptFilterParams;
use tutorlink_models::scheduler::ClassFilterParams;
use tutorlink_models::students::StudentFilterParams;
use tutorlink_models::tasks::TaskFilterParams;
use tutorlink_models::teachers::TeacherFilterParams;
use tutorlink_realtime::ConnectionState;

#[derive(Parser)]
#[command(name = "tutorlink")]
#[command(about = "TutorLink CLI - Command-line client for the TutorLink backend", long_about = None)]
struct Cli {
    /// Rows per page for list commands
    #[arg(long, global = true, default_value = "20")]
    page_size: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List tasks
    Tasks,
    /// List notifications
    Notifications {
        /// Only unread notifications
        #[arg(short = 'u', long)]
        unread: bool,
    },
    /// Mark every unread notification on the first page as read
    MarkAllRead,
    /// List students
    Students {
        #[arg(short = 's', long)]
        search: Option<String>,
    },
    /// List teachers
    Teachers {
        #[arg(short = 's', long)]
        search: Option<String>,

        #[arg(long)]
        subject: Option<String>,
    },
    /// List receipts
    Receipts,
    /// List teacher invitations
    Invitations,
    /// List scheduled classes
    Classes,
    /// Show the dashboard summary, upcoming classes and unread count
    Dashboard {
        #[arg(long, value_enum, default_value = "month")]
        period: Period,
    },
    /// Follow a live event stream until Ctrl-C
    Watch {
        #[arg(value_enum)]
        stream: StreamKind,

        /// Parent whose approvals to follow (required for `approvals`)
        #[arg(long)]
        parent_id: Option<i64>,
    },
    /// Poll the unread notification count until Ctrl-C
    Unread {
        /// Seconds between polls (defaults to POLL_INTERVAL_SECS)
        #[arg(short = 'i', long)]
        interval: Option<u64>,
    },
    /// Accept a teacher invitation interactively
    AcceptInvitation {
        /// Invitation token from the email link
        token: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    Week,
    Month,
    Quarter,
    Year,
}

impl From<Period> for AnalyticsPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::Week => Self::Week,
            Period::Month => Self::Month,
            Period::Quarter => Self::Quarter,
            Period::Year => Self::Year,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StreamKind {
    Payments,
    Transactions,
    Webhooks,
    Approvals,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = run().await {
        eprintln!("\n❌ {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let realtime = RealtimeConfig::from_env();
    tutorlink_observability::init_tracing(realtime.debug)
        .context("Failed to initialize logging")?;

    let cli = Cli::parse();

    let tokens = TokenStore::from_config(&StorageConfig::from_env());
    tokens
        .restore()
        .await
        .context("Failed to restore the saved session")?;
    let api = ApiClient::new(&ApiConfig::from_env(), tokens)
        .context("Failed to create the API client")?;
    let page = PageQuery::first(cli.page_size);

    match cli.command {
        Commands::Login { email, password } => handle_login(&api, email, password).await,
        Commands::Logout => handle_logout(&api).await,
        Commands::Whoami => handle_whoami(&api).await,
        Commands::Tasks => handle_tasks(&api, page).await,
        Commands::Notifications { unread } => handle_notifications(&api, page, unread).await,
        Commands::MarkAllRead => handle_mark_all_read(&api, cli.page_size).await,
        Commands::Students { search } => handle_students(&api, page, search).await,
        Commands::Teachers { search, subject } => {
            handle_teachers(&api, page, search, subject).await
        }
        Commands::Receipts => handle_receipts(&api, page).await,
        Commands::Invitations => handle_invitations(&api, page).await,
        Commands::Classes => handle_classes(&api, page).await,
        Commands::Dashboard { period } => handle_dashboard(&api, period.into()).await,
        Commands::Watch { stream, parent_id } => {
            return handle_watch(&api, &realtime, stream, parent_id).await;
        }
        Commands::Unread { interval } => handle_unread(&api, interval).await,
        Commands::AcceptInvitation { token } => {
            return handle_accept_invitation(&api, &token).await;
        }
    }
    Ok(())
}

fn fail(action: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ Error {action}: {message}");
    std::process::exit(1);
}

async fn handle_login(api: &ApiClient, email: Option<String>, password: Option<String>) {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .unwrap_or_else(|e| fail("reading email", e)),
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .unwrap_or_else(|e| fail("reading password", e)),
    };

    match AuthService::login(api, LoginRequest { email, password }).await {
        Ok(session) => {
            println!("\n✅ Signed in as {}", session.user.email);
            println!("   Name: {}", session.user.full_name());
            println!("   Role: {:?}", session.user.role);
        }
        Err(e) => fail("signing in", e.user_message()),
    }
}

async fn handle_logout(api: &ApiClient) {
    match AuthService::logout(api).await {
        Ok(()) => println!("✅ Signed out"),
        Err(e) => fail("signing out", e.user_message()),
    }
}

async fn handle_whoami(api: &ApiClient) {
    if !api.tokens().is_authenticated() {
        fail("loading account", "not signed in. Run `tutorlink login` first.");
    }
    match AuthService::current_user(api).await {
        Ok(user) => {
            println!("{} <{}>", user.full_name(), user.email);
            println!("Role: {:?}", user.role);
        }
        Err(e) => fail("loading account", e.user_message()),
    }
}

async fn handle_tasks(api: &ApiClient, page: PageQuery) {
    match TaskService::list(api, &TaskFilterParams::default(), page).await {
        Ok(tasks) => {
            println!("{} tasks", tasks.count);
            for task in tasks.results {
                let due = task
                    .due_date
                    .map(|d| format!(" (due {d})"))
                    .unwrap_or_default();
                println!(
                    "  #{} [{:?}/{:?}] {}{due}",
                    task.id, task.status, task.priority, task.title
                );
            }
        }
        Err(e) => fail("listing tasks", e.user_message()),
    }
}

async fn handle_notifications(api: &ApiClient, page: PageQuery, unread_only: bool) {
    let filters = if unread_only {
        NotificationFilterParams::unread_only()
    } else {
        NotificationFilterParams::default()
    };
    match NotificationService::list(api, &filters, page).await {
        Ok(notifications) => {
            println!("{} notifications", notifications.count);
            for n in notifications.results {
                let marker = if n.is_read { " " } else { "•" };
                println!("  {marker} #{} {} - {}", n.id, n.title, n.message);
            }
        }
        Err(e) => fail("listing notifications", e.user_message()),
    }
}

async fn handle_mark_all_read(api: &ApiClient, page_size: u32) {
    let mut state = NotificationsState::new(page_size);
    state.set_unread_only(true);
    if !state.refresh(api).await {
        fail(
            "loading notifications",
            state.error().unwrap_or("unknown error"),
        );
    }

    let summary = state.mark_all_read(api).await;
    if summary.total() == 0 {
        println!("✅ Nothing to mark as read");
    } else if summary.is_complete() {
        println!("✅ Marked {} notifications as read", summary.succeeded_count());
    } else {
        for (id, error) in &summary.failed {
            eprintln!("   #{id}: {error}");
        }
        fail("marking notifications as read", summary.describe());
    }
}

async fn handle_students(api: &ApiClient, page: PageQuery, search: Option<String>) {
    let filters = StudentFilterParams {
        search,
        ..Default::default()
    };
    match StudentService::list(api, &filters, page).await {
        Ok(students) => {
            println!("{} students", students.count);
            for s in students.results {
                let grade = s.grade_level.as_deref().unwrap_or("-");
                println!("  #{} {} <{}> grade {grade}", s.id, s.full_name(), s.email);
            }
        }
        Err(e) => fail("listing students", e.user_message()),
    }
}

async fn handle_teachers(
    api: &ApiClient,
    page: PageQuery,
    search: Option<String>,
    subject: Option<String>,
) {
    let filters = TeacherFilterParams { search, subject };
    match TeacherService::list(api, &filters, page).await {
        Ok(teachers) => {
            println!("{} teachers", teachers.count);
            for t in teachers.results {
                let rate = t.hourly_rate.as_deref().unwrap_or("-");
                println!(
                    "  #{} {} [{}] {rate}/h",
                    t.id,
                    t.full_name(),
                    t.subjects.join(", ")
                );
            }
        }
        Err(e) => fail("listing teachers", e.user_message()),
    }
}

async fn handle_receipts(api: &ApiClient, page: PageQuery) {
    match ReceiptService::list(api, &ReceiptFilterParams::default(), page).await {
        Ok(receipts) => {
            println!("{} receipts", receipts.count);
            for r in receipts.results {
                println!(
                    "  #{} {} {} {} ({})",
                    r.id,
                    r.receipt_number,
                    r.total,
                    r.currency,
                    r.issued_at.format("%Y-%m-%d")
                );
            }
        }
        Err(e) => fail("listing receipts", e.user_message()),
    }
}

async fn handle_invitations(api: &ApiClient, page: PageQuery) {
    match InvitationService::list(api, &InvitationFilterParams::default(), page).await {
        Ok(invitations) => {
            println!("{} invitations", invitations.count);
            for i in invitations.results {
                println!(
                    "  #{} {} {} <{}> {:?}, expires {}",
                    i.id,
                    i.first_name,
                    i.last_name,
                    i.email,
                    i.status,
                    i.expires_at.format("%Y-%m-%d")
                );
            }
        }
        Err(e) => fail("listing invitations", e.user_message()),
    }
}

async fn handle_classes(api: &ApiClient, page: PageQuery) {
    match SchedulerService::list_classes(api, &ClassFilterParams::default(), page).await {
        Ok(classes) => {
            println!("{} classes", classes.count);
            for c in classes.results {
                println!(
                    "  #{} {} with {} at {} ({} min, {:?})",
                    c.id,
                    c.title,
                    c.teacher_name,
                    c.start_time.format("%Y-%m-%d %H:%M"),
                    c.duration_minutes(),
                    c.status
                );
            }
        }
        Err(e) => fail("listing classes", e.user_message()),
    }
}

async fn handle_dashboard(api: &ApiClient, period: AnalyticsPeriod) {
    let mut dashboard = DashboardState::with_period(period);
    dashboard.refresh(api).await;

    println!("Dashboard ({period})");
    match (dashboard.summary().data(), dashboard.summary().error()) {
        (Some(s), _) => {
            println!("  Students: {}", s.total_students);
            println!("  Active teachers: {}", s.active_teachers);
            println!(
                "  Classes: {} completed, {} upcoming",
                s.classes_completed, s.classes_upcoming
            );
            println!("  Revenue: {}", s.revenue);
            println!("  Attendance: {:.1}%", s.attendance_rate);
        }
        (None, error) => println!("  ❌ Summary unavailable: {}", error.unwrap_or("-")),
    }

    match (dashboard.upcoming().data(), dashboard.upcoming().error()) {
        (Some(classes), _) if classes.is_empty() => println!("  No classes this week"),
        (Some(classes), _) => {
            println!("  Next classes:");
            for c in classes {
                println!("    {} {}", c.start_time.format("%a %H:%M"), c.title);
            }
        }
        (None, error) => println!("  ❌ Classes unavailable: {}", error.unwrap_or("-")),
    }

    match (dashboard.unread().data(), dashboard.unread().error()) {
        (Some(count), _) => println!("  Unread notifications: {count}"),
        (None, error) => println!("  ❌ Notifications unavailable: {}", error.unwrap_or("-")),
    }

    if dashboard.has_errors() {
        std::process::exit(1);
    }
}

async fn handle_watch(
    api: &ApiClient,
    realtime: &RealtimeConfig,
    stream: StreamKind,
    parent_id: Option<i64>,
) -> anyhow::Result<()> {
    if matches!(stream, StreamKind::Approvals) {
        let parent_id = ParentId(parent_id.context("--parent-id is required for approvals")?);
        return watch_approvals(api, realtime, parent_id).await;
    }

    let path = match stream {
        StreamKind::Payments => PAYMENTS_STREAM,
        StreamKind::Transactions => TRANSACTIONS_STREAM,
        StreamKind::Webhooks | StreamKind::Approvals => WEBHOOKS_STREAM,
    };
    let monitor = PaymentMonitor::for_path(realtime, api.tokens(), path)
        .context("Failed to open the event stream")?;
    if let Err(e) = monitor.load_metrics(api).await {
        eprintln!("⚠️  Could not load current metrics: {}", e.user_message());
    }

    let _states = monitor
        .stream()
        .on_state_change(|state: &ConnectionState| println!("… stream {state}"));
    let _errors = monitor
        .stream()
        .on_error(|e| eprintln!("⚠️  {e}"));
    let _events = monitor
        .stream()
        .on_message(|message| println!("→ {}", message.kind()));

    monitor.start();
    println!("Watching {path} (Ctrl-C to stop)");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    monitor.stop().await;

    let snapshot = monitor.snapshot();
    println!("\n✅ Stopped");
    if let Some(metrics) = &snapshot.metrics {
        println!("   Revenue: {}", metrics.total_revenue);
    }
    println!("   Transactions seen: {}", snapshot.recent_transactions.len());
    println!("   Fraud alerts: {}", snapshot.fraud_alerts.len());
    Ok(())
}

async fn watch_approvals(
    api: &ApiClient,
    realtime: &RealtimeConfig,
    parent_id: ParentId,
) -> anyhow::Result<()> {
    let inbox = ApprovalInbox::new(realtime, api.tokens(), parent_id)
        .context("Failed to open the approvals stream")?;
    match inbox.load(api).await {
        Ok(count) => println!("{count} purchase approvals waiting"),
        Err(e) => eprintln!("⚠️  Could not load pending approvals: {}", e.user_message()),
    }

    let _states = inbox
        .stream()
        .on_state_change(|state: &ConnectionState| println!("… stream {state}"));
    let _events = inbox.stream().on_message(|message| {
        println!("→ {}", message.kind());
    });

    inbox.start();
    println!("Watching approvals for parent #{parent_id} (Ctrl-C to stop)");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    inbox.stop().await;

    println!("\n✅ Stopped");
    for approval in inbox.pending() {
        println!(
            "   #{} {} for {}: {}",
            approval.id, approval.item_description, approval.student_name, approval.amount
        );
    }
    Ok(())
}

async fn handle_unread(api: &ApiClient, interval: Option<u64>) {
    let config = match interval {
        Some(secs) => PollConfig::every(Duration::from_secs(secs.max(1))),
        None => PollConfig::from_env(),
    };
    let counter = UnreadCounter::new(config);
    let _exhausted = counter.on_error(|e| eprintln!("❌ {e}"));
    counter.start(api.clone());

    let mut last = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if !counter.is_running() {
                    std::process::exit(1);
                }
                let count = counter.count();
                if last != Some(count) {
                    println!("🔔 {count} unread");
                    last = Some(count);
                }
            }
        }
    }
    counter.stop();
}

async fn handle_accept_invitation(api: &ApiClient, token: &str) -> anyhow::Result<()> {
    let mut wizard = InvitationWizard::load(api, token)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    loop {
        let step = wizard.step();
        println!(
            "\n[{}/{}] {}",
            step.index() + 1,
            InvitationStep::ORDER.len(),
            step.title()
        );
        match step {
            InvitationStep::Review => {
                if let Some(reason) = wizard.blocker_at(Utc::now()) {
                    anyhow::bail!(reason);
                }
                let invitation = wizard.invitation();
                println!(
                    "   {} invited {} {} <{}>",
                    invitation.invited_by_name,
                    invitation.first_name,
                    invitation.last_name,
                    invitation.email
                );
                if let Some(message) = &invitation.message {
                    println!("   \"{message}\"");
                }
                let accept = Confirm::new()
                    .with_prompt("Accept this invitation?")
                    .default(true)
                    .interact()?;
                if !accept {
                    wizard
                        .decline(api)
                        .await
                        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                    println!("\n✅ Invitation declined");
                    return Ok(());
                }
            }
            InvitationStep::Account => {
                let password: String = Password::new().with_prompt("Choose a password").interact()?;
                let confirm: String = Password::new().with_prompt("Confirm password").interact()?;
                wizard.set_account(password, confirm);
            }
            InvitationStep::Profile => {
                let current = wizard.profile();
                let first_name: String = Input::new()
                    .with_prompt("First name")
                    .with_initial_text(current.first_name)
                    .interact_text()?;
                let last_name: String = Input::new()
                    .with_prompt("Last name")
                    .with_initial_text(current.last_name)
                    .interact_text()?;
                let phone_number: String = Input::new()
                    .with_prompt("Phone number (optional)")
                    .allow_empty(true)
                    .interact_text()?;
                let subjects: String = Input::new()
                    .with_prompt("Subjects (comma separated)")
                    .interact_text()?;
                let hourly_rate: String = Input::new()
                    .with_prompt("Hourly rate (optional)")
                    .allow_empty(true)
                    .interact_text()?;
                let bio: String = Input::new()
                    .with_prompt("Short bio (optional)")
                    .allow_empty(true)
                    .interact_text()?;

                wizard.set_profile(ProfileFields {
                    first_name,
                    last_name,
                    phone_number: Some(phone_number),
                    subjects: subjects
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                    hourly_rate: hourly_rate.trim().parse().ok(),
                    bio: Some(bio),
                });
            }
            InvitationStep::Confirm => {
                let draft = wizard.draft();
                println!("   {} {}", draft.first_name, draft.last_name);
                println!("   Subjects: {}", draft.subjects.join(", "));
                let submit = Confirm::new()
                    .with_prompt("Create your account?")
                    .default(true)
                    .interact()?;
                if !submit {
                    let _ = wizard.back();
                    continue;
                }
                match wizard.submit(api).await {
                    Ok(response) => {
                        println!("\n✅ Invitation accepted");
                        if let Some(detail) = response.detail {
                            println!("   {detail}");
                        }
                        println!("   You are now signed in.");
                        return Ok(());
                    }
                    Err(e) => {
                        eprintln!("❌ {}", e.user_message());
                        let _ = wizard.back();
                        continue;
                    }
                }
            }
        }

        if let Err(e) = wizard.next() {
            eprintln!("❌ {}", e.user_message());
            if e.field_errors().is_none() {
                anyhow::bail!(e.user_message());
            }
        }
    }
}
