//! Collaborative debug session server.
//!
//! Keeps shared code sessions in sync across WebSocket clients and runs
//! submitted code in per-session sandboxes.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-server
//! cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tsudoi_server::{
    infrastructure::{
        archive::LoggingArchiver,
        fabric::InProcessFabric,
        message_pusher::WebSocketConnectionPusher,
        repository::{InMemoryPresenceRegistry, InMemorySandboxRegistry, InMemorySessionRepository},
        sandbox::DockerCliSandboxDriver,
    },
    ui::{Server, SessionRelay, state::AppState},
    usecase::{
        ApplyEditUseCase, DisconnectConnectionUseCase, EndSessionUseCase, LeaveSessionUseCase,
        RunCodeUseCase, SendChatUseCase, StopSandboxUseCase, SubscribeSessionUseCase,
        UpdateSessionMetaUseCase,
    },
};
use tsudoi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tsudoi-server")]
#[command(about = "Collaborative debug session server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories / registries
    // 2. Fabric, pusher, driver, archiver
    // 3. UseCases
    // 4. Relay and AppState
    // 5. Server

    // 1. Create repositories (in-memory)
    let repository = Arc::new(InMemorySessionRepository::new());
    let presence = Arc::new(InMemoryPresenceRegistry::new());
    let sandbox_registry = Arc::new(InMemorySandboxRegistry::new());

    // 2. Create collaborators
    let fabric = Arc::new(InProcessFabric::new());
    let pusher = Arc::new(WebSocketConnectionPusher::new());
    let driver = Arc::new(DockerCliSandboxDriver::new());
    let archiver = Arc::new(LoggingArchiver);
    let clock = Arc::new(SystemClock);

    // 3. Create UseCases
    let apply_edit_usecase = Arc::new(ApplyEditUseCase::new(
        repository.clone(),
        archiver.clone(),
        fabric.clone(),
    ));
    let subscribe_session_usecase = Arc::new(SubscribeSessionUseCase::new(
        presence.clone(),
        fabric.clone(),
    ));
    let disconnect_connection_usecase = Arc::new(DisconnectConnectionUseCase::new(
        presence.clone(),
        pusher.clone(),
        fabric.clone(),
    ));
    let leave_session_usecase = Arc::new(LeaveSessionUseCase::new(fabric.clone()));
    let send_chat_usecase = Arc::new(SendChatUseCase::new(fabric.clone(), clock));
    let update_meta_usecase = Arc::new(UpdateSessionMetaUseCase::new(
        repository.clone(),
        fabric.clone(),
    ));
    let run_code_usecase = Arc::new(RunCodeUseCase::new(
        sandbox_registry.clone(),
        driver.clone(),
        fabric.clone(),
    ));
    let stop_sandbox_usecase = Arc::new(StopSandboxUseCase::new(
        sandbox_registry.clone(),
        driver.clone(),
        fabric.clone(),
    ));
    let end_session_usecase = Arc::new(EndSessionUseCase::new(
        repository.clone(),
        sandbox_registry,
        driver,
        fabric.clone(),
    ));

    // 4. Create relay and shared state
    let relay = Arc::new(SessionRelay::new(
        fabric,
        presence.clone(),
        pusher.clone(),
    ));
    let app_state = Arc::new(AppState {
        apply_edit_usecase,
        subscribe_session_usecase,
        disconnect_connection_usecase,
        leave_session_usecase,
        send_chat_usecase,
        update_meta_usecase,
        run_code_usecase,
        stop_sandbox_usecase,
        end_session_usecase,
        repository,
        presence,
        pusher,
        relay,
    });

    // 5. Create and run the server
    let server = Server::new(app_state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
