//! `relay-client` -- terminal chat client for the relay hub.
//!
//! Reads lines from stdin and sends them as chat messages. `/file <path>`
//! registers a `file_upload` job, reports its progress and shares the file;
//! `/save <id> [path]` writes a received file to disk; `/quit` exits.
//! Received messages are printed to stdout, logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable        | Default                 | Description              |
//! |-----------------|-------------------------|--------------------------|
//! | `RELAY_WS_URL`  | `ws://localhost:8080`   | Hub WebSocket endpoint   |
//! | `RELAY_API_URL` | `http://localhost:3000` | Job API base URL         |
//! | `RELAY_USER`    | random `user-xxxxxx`    | User id sent with frames |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use relay_client::backoff::ReconnectPolicy;
use relay_client::download::{self, ReceivedFiles};
use relay_client::error::ClientError;
use relay_client::jobs::JobsClient;
use relay_client::render::{render, render_job, short_id};
use relay_client::session::{self, ClientCommand, ClientEvent};
use relay_client::upload;
use relay_core::frames::InboundFrame;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "relay-client")]
#[command(version)]
#[command(about = "Terminal chat client for the relay hub")]
struct Args {
    /// WebSocket endpoint of the hub
    #[arg(long, env = "RELAY_WS_URL", default_value = "ws://localhost:8080")]
    url: String,

    /// Base URL of the job API
    #[arg(long, env = "RELAY_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// User id to post as (random when omitted)
    #[arg(long, env = "RELAY_USER")]
    user: Option<String>,

    /// Reconnect attempts before giving up
    #[arg(long, default_value = "5")]
    max_attempts: u32,

    /// Upper bound on the delay between reconnect attempts
    #[arg(long, default_value = "30")]
    max_backoff_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let user_id = args.user.unwrap_or_else(random_user_id);
    let policy = ReconnectPolicy {
        max_attempts: args.max_attempts,
        max_delay: Duration::from_secs(args.max_backoff_secs),
        ..ReconnectPolicy::default()
    };
    let jobs = JobsClient::new(args.api_url.clone());

    tracing::info!(
        url = %args.url,
        api_url = %args.api_url,
        user_id = %user_id,
        "Starting relay-client",
    );

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(32);

    let url = args.url.clone();
    let session_task = tokio::spawn(async move { session::run(&url, policy, cmd_rx, event_tx).await });

    let received = Arc::new(Mutex::new(ReceivedFiles::new()));
    let printer = tokio::spawn({
        let received = Arc::clone(&received);
        async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    ClientEvent::Connected => println!("* connected"),
                    ClientEvent::Disconnected => println!("* disconnected, reconnecting"),
                    ClientEvent::Message(message) => {
                        received.lock().await.record(&message);
                        println!("{}", render(&message));
                    }
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_task = session_task;
    let result = loop {
        let line = tokio::select! {
            result = &mut session_task => break result?,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break quit(cmd_tx, session_task).await?;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = if line == "/quit" {
            break quit(cmd_tx, session_task).await?;
        } else if let Some(path) = line.strip_prefix("/file ") {
            match share_file(&jobs, &user_id, Path::new(path.trim())).await {
                Ok(frame) => ClientCommand::Send(frame),
                Err(e) => {
                    eprintln!("! Failed to upload file: {e}");
                    continue;
                }
            }
        } else if let Some(rest) = line.strip_prefix("/save ") {
            if let Err(e) = save(&received, rest).await {
                eprintln!("! Failed to download file: {e}");
            }
            continue;
        } else {
            ClientCommand::Send(InboundFrame::Chat {
                user_id: user_id.clone(),
                content: line.to_string(),
            })
        };

        if cmd_tx.send(command).await.is_err() {
            break session_task.await?;
        }
    };

    printer.await?;
    result?;
    Ok(())
}

/// Register a `file_upload` job for `path`, follow it in the background,
/// and return the frame that shares the file with the room.
async fn share_file(
    jobs: &JobsClient,
    user_id: &str,
    path: &Path,
) -> Result<InboundFrame, ClientError> {
    let payload = upload::read_payload(path).await?;
    let job = jobs.create_file_upload(&payload).await?;
    println!("{}", render_job(&job));

    let jobs = jobs.clone();
    tokio::spawn(async move {
        match jobs.wait_for_completion(&job.id).await {
            Ok(job) => println!("{}", render_job(&job)),
            Err(e) => eprintln!("! job {}: {e}", short_id(&job.id)),
        }
    });

    Ok(upload::file_frame(user_id, payload))
}

/// Handle `/save <id-prefix> [path]`; the path defaults to the current directory.
async fn save(received: &Mutex<ReceivedFiles>, args: &str) -> Result<(), ClientError> {
    let mut parts = args.split_whitespace();
    let prefix = parts.next().unwrap_or_default();
    let dest = PathBuf::from(parts.next().unwrap_or("."));

    let message = received.lock().await.find(prefix)?.clone();
    let path = download::save_file(&message, &dest).await?;
    println!("* saved {}", path.display());
    Ok(())
}

/// Ask the session to close and wait for it.
async fn quit(
    commands: mpsc::Sender<ClientCommand>,
    session_task: JoinHandle<Result<(), ClientError>>,
) -> Result<Result<(), ClientError>, JoinError> {
    let _ = commands.send(ClientCommand::Quit).await;
    session_task.await
}

fn random_user_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("user-{}", &id[..6])
}
