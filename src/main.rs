use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use tokio::sync::mpsc;

use notification_sync::common::{Id, NotificationDraft, NotificationType};
use notification_sync::config::{self, AppConfig};
use notification_sync::network::{HttpNotificationApi, NotificationApi, PushListener};
use notification_sync::storage::NotificationCache;
use notification_sync::sync::NotificationSync;
use notification_sync::ui::ConsoleApp;
use notification_sync::ui::components::notification_list;

#[derive(Parser)]
#[command(
    name = "notification_sync",
    version,
    about = "Live notification feed client (REST pagination + WebSocket push)"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Follow notifications live (default)
    Watch,
    /// Print the last cached view without touching the network
    Cached {
        /// Drop the cached view instead of printing it
        #[arg(long)]
        clear: bool,
    },
    /// Write the effective settings to the config file (the token is never written)
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    #[command(flatten)]
    Api(ApiCommand),
}

/// One-shot calls against the REST API.
#[derive(Subcommand)]
enum ApiCommand {
    /// Print one page of notifications
    List {
        #[arg(default_value_t = 0)]
        page: u32,
    },
    /// Print the unread count
    Unread,
    /// Mark one notification as read
    MarkRead { id: String },
    /// Mark every notification as read
    MarkAllRead,
    /// Create a notification (management endpoint)
    Create(DraftArgs),
    /// Replace a notification (management endpoint)
    Update {
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Delete a notification (management endpoint)
    Delete { id: String },
}

#[derive(Args)]
struct DraftArgs {
    #[arg(long)]
    receiver: String,
    #[arg(long)]
    sender: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    kind: NotificationType,
    #[arg(long)]
    content: String,
    #[arg(long)]
    related: Option<String>,
    #[arg(long)]
    read: bool,
}

impl DraftArgs {
    fn into_draft(self) -> NotificationDraft {
        NotificationDraft {
            receiver_id: Id::from(self.receiver),
            sender_id: self.sender.map(Id::from),
            kind: self.kind,
            content: self.content,
            related_id: self.related.map(Id::from),
            read: self.read,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides();
    app_config.validate()?;

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => run_watch(app_config).await,
        Command::Cached { clear } => show_cached(&app_config, clear),
        Command::InitConfig { force } => init_config(&cli.config, &app_config, force),
        Command::Api(command) => run_one_shot(app_config, command).await,
    }
}

async fn run_watch(app_config: AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let session = app_config.signed_in_session()?;
    let api = Arc::new(HttpNotificationApi::new(
        &app_config.api_base_url,
        session.clone(),
        app_config.request_timeout(),
    )?);

    // 1. Kênh push: WebSocket listener -> actor
    let (push_tx, push_rx) = mpsc::channel(100);
    let listener = PushListener::new(
        app_config.ws_url.clone(),
        session.clone(),
        app_config.push_reconnect_delay(),
        push_tx,
    );

    // 2. Actor đồng bộ (chạy ngầm)
    let (mut sync, handle, event_rx) =
        NotificationSync::new(api, session, app_config.sync_options());
    sync = sync.with_push(push_rx);
    if let Some(path) = &app_config.cache_path {
        match NotificationCache::with_path(path) {
            Ok(cache) => sync = sync.with_cache(cache),
            Err(err) => log::warn!("Notification cache {path} unavailable: {err}"),
        }
    }

    tokio::spawn(listener.run());

    let sync_task = tokio::spawn(async move {
        if let Err(err) = sync.run().await {
            log::error!("Notification sync terminated: {err}");
        }
    });

    // 3. Tải trang đầu + số chưa đọc, rồi chạy console trên task chính
    handle.start().await?;
    ConsoleApp::new(handle, event_rx).run().await?;
    sync_task.await?;
    Ok(())
}

async fn run_one_shot(
    app_config: AppConfig,
    command: ApiCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let api = HttpNotificationApi::new(
        &app_config.api_base_url,
        app_config.session(),
        app_config.request_timeout(),
    )?;

    match command {
        ApiCommand::List { page } => {
            let fetched = api.fetch_page(page, app_config.page_size).await?;
            println!(
                "page {} of {} ({} total)",
                page + 1,
                fetched.total_pages.max(1),
                fetched.total_elements
            );
            for (index, notification) in fetched.content.iter().enumerate() {
                println!("{}", notification_list::render_row(index + 1, notification));
            }
        }
        ApiCommand::Unread => println!("{}", api.unread_count().await?),
        ApiCommand::MarkRead { id } => {
            api.mark_as_read(&Id::from(id.clone())).await?;
            log::info!("Marked {id} as read");
        }
        ApiCommand::MarkAllRead => {
            api.mark_all_as_read().await?;
            log::info!("Marked all notifications as read");
        }
        ApiCommand::Create(draft) => {
            let created = api.create(&draft.into_draft()).await?;
            println!("created {}", created.notification_id);
        }
        ApiCommand::Update { id, draft } => {
            let updated = api.update(&Id::from(id), &draft.into_draft()).await?;
            println!("updated {}", updated.notification_id);
        }
        ApiCommand::Delete { id } => {
            api.delete(&Id::from(id.clone())).await?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn show_cached(app_config: &AppConfig, clear: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(path) = &app_config.cache_path else {
        println!("cache disabled (cache_path is not set)");
        return Ok(());
    };

    let cache = NotificationCache::with_path(path)?;
    if clear {
        let removed = cache.count()?;
        cache.clear()?;
        println!("removed {removed} cached notifications");
        return Ok(());
    }

    match cache.load_snapshot()? {
        Some(cached) => {
            println!("cached at {}", cached.saved_at.format("%Y-%m-%d %H:%M:%S"));
            println!("{} unread", cached.unread_count);
            for (index, notification) in cached.notifications.iter().enumerate() {
                println!("{}", notification_list::render_row(index + 1, notification));
            }
        }
        None => println!("no cached notifications"),
    }
    Ok(())
}

fn init_config(
    path: &str,
    app_config: &AppConfig,
    force: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if Path::new(path).exists() && !force {
        return Err(format!("{path} already exists; pass --force to overwrite").into());
    }
    config::save_config(path, app_config)?;
    log::info!("Wrote config to {path}");
    println!("wrote {path}");
    Ok(())
}
