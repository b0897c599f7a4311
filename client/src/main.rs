use clap::{Parser, ValueEnum};
use client::chat::ChatLog;
use client::clock::SystemClock;
use client::config::{
    EngineConfig, ProjectilePolicy, DEFAULT_BUFFER_CAPACITY, DEFAULT_INTERPOLATION_OFFSET_MS,
    DEFAULT_MATCH_DISTANCE,
};
use client::events::{ConnectionEvent, EventChannel, Topic};
use client::input::{ChatInput, ChatKey, InputManager, InputSample};
use client::map::TileMap;
use client::network::{InboundFrame, WebSocketTransport, INBOUND_HEADROOM};
use client::rendering::{HudInfo, Renderer};
use client::session::{ClientSession, ConnectionState};
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::ClientCommand;
use std::path::PathBuf;
use std::time::Duration;

const CHAT_LINES_SHOWN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProjectileMode {
    /// Show the older snapshot's projectiles unchanged
    Older,
    /// Pair projectiles by proximity and interpolate
    Nearest,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the game server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000/ws")]
    server: String,

    /// Character name sent when joining
    #[arg(short = 'n', long, default_value = "Player")]
    name: String,

    /// Interpolation delay in milliseconds
    #[arg(short = 'o', long, default_value_t = DEFAULT_INTERPOLATION_OFFSET_MS)]
    offset_ms: f64,

    /// Maximum number of buffered snapshots
    #[arg(short = 'b', long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    buffer: usize,

    /// Tile map JSON drawn under the entities
    #[arg(short = 'm', long)]
    map: Option<PathBuf>,

    /// How projectiles are carried between snapshots
    #[arg(long, value_enum, default_value_t = ProjectileMode::Older)]
    projectiles: ProjectileMode,

    /// Maximum pairing distance for `--projectiles nearest`
    #[arg(long, default_value_t = DEFAULT_MATCH_DISTANCE)]
    match_distance: f32,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig, client::config::ConfigError> {
        let policy = match self.projectiles {
            ProjectileMode::Older => ProjectilePolicy::Older,
            ProjectileMode::Nearest => ProjectilePolicy::NearestMatch {
                max_distance: self.match_distance,
            },
        };
        EngineConfig::new(self.offset_ms, self.buffer, policy)
    }
}

fn window_conf() -> Conf {
    Conf {
        window_title: "MMO Client".to_owned(),
        window_width: 800,
        window_height: 600,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Client error: {}", e);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.engine_config()?;
    let join = ClientCommand::join(&args.name)?;

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!(
        "Interpolation offset {}ms, buffer {} snapshots",
        config.interpolation_offset_ms, config.buffer_capacity
    );
    info!("Controls: WASD to move, 1/2/3 or click to cast, Enter to chat, Esc to quit");

    let map = match &args.map {
        Some(path) => match TileMap::load(path) {
            Ok(map) => Some(map),
            Err(e) => {
                warn!("Failed to load map {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    let clock = SystemClock::new();
    let (transport, mut inbound) = WebSocketTransport::connect(
        runtime.handle(),
        &args.server,
        clock,
        config.buffer_capacity + INBOUND_HEADROOM,
    );

    let mut session = ClientSession::new(transport, EventChannel::new(), &config);
    session.begin_connect();

    let mut chat = ChatLog::new();
    chat.attach(session.events_mut());
    session.events_mut().subscribe(Topic::PlayerJoined, |event| {
        if let ConnectionEvent::PlayerJoined { id, name, .. } = event {
            info!("{} joined (#{})", name, id);
        }
    });
    session.events_mut().subscribe(Topic::PlayerLeft, |event| {
        if let ConnectionEvent::PlayerLeft { id } = event {
            info!("Player #{} left", id);
        }
    });

    let mut renderer = Renderer::new(map);
    let mut input = InputManager::new();
    let mut chat_input = ChatInput::new();

    loop {
        let keys = ChatKey::capture();
        if !chat_input.is_active() && keys.contains(&ChatKey::Escape) {
            break;
        }

        while let Ok(frame) = inbound.try_recv() {
            let opened = frame == InboundFrame::Opened;
            session.ingest(frame);

            if opened {
                if let Err(e) = session.send_intent(&join) {
                    error!("Error sending join: {}", e);
                }
            }
        }

        let now = clock.now();
        session.tick(now);

        let mut commands: Vec<ClientCommand> = keys
            .into_iter()
            .filter_map(|key| chat_input.handle(key))
            .collect();
        if !chat_input.is_active() {
            commands.extend(input.update(&InputSample::capture(), now));
        }

        if session.connection_state() == ConnectionState::Connected {
            for command in &commands {
                if let Err(e) = session.send_intent(command) {
                    error!("Error sending input: {}", e);
                }
            }
        }

        let hud = HudInfo {
            connection: session.connection_state(),
            buffered: session.buffer().len(),
            capacity: session.buffer().capacity(),
            last_t: session.last_t(),
            stats: session.stats(),
            chat: chat.recent(CHAT_LINES_SHOWN),
            typing: chat_input.is_active().then(|| chat_input.text().to_string()),
        };
        renderer.render(session.render_state(), &hud);

        next_frame().await;
    }

    session.shutdown();
    runtime.shutdown_timeout(Duration::from_millis(200));

    Ok(())
}
