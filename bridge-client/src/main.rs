use anyhow::{Context, Result};
use bridge_client::{ClientGame, GamePhase, ServerLink};
use clap::Parser;
use protocol::{ClientMessage, GameVariant, ServerMessage, Side, DEFAULT_PORT};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 引擎桥接终端客户端
#[derive(Parser, Debug)]
#[command(name = "bridge-client", version)]
struct Cli {
    /// 服务器地址
    #[arg(long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    addr: String,

    /// 开局变体 (three_checks / kings_cross)
    #[arg(long, default_value = "three_checks")]
    variant: String,
}

/// 一条终端命令
enum Command {
    New(Option<GameVariant>),
    Click(i32, i32),
    Ping,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    match first {
        "new" => Some(Command::New(parts.next().map(GameVariant::from_token))),
        "ping" => Some(Command::Ping),
        "quit" | "exit" => Some(Command::Quit),
        _ => {
            let row = first.parse().ok()?;
            let col = parts.next()?.parse().ok()?;
            Some(Command::Click(row, col))
        }
    }
}

fn print_status(game: &ClientGame) {
    println!("{}", game.board);
    if let (Some(white), Some(black)) = (
        game.check_count(Side::White),
        game.check_count(Side::Black),
    ) {
        println!("checks  white: {}  black: {}", white, black);
    }
    match &game.phase {
        GamePhase::Idle => println!("type `new [variant]` to start"),
        GamePhase::Playing => {
            if let Some(mv) = game.last_move {
                println!("last move {}", mv);
            }
            for square in game.markers() {
                println!("selected {}", square);
            }
        }
        GamePhase::Over(text) => println!("game over: {}", text),
        GamePhase::Unavailable(reason) => println!("engine unavailable: {}", reason),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("bridge_client=info".parse()?))
        .init();

    let cli = Cli::parse();
    let default_variant = GameVariant::from_token(&cli.variant);

    let mut link = ServerLink::connect(&cli.addr)
        .await
        .with_context(|| format!("Failed to connect to {}", cli.addr))?;
    let mut game = ClientGame::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let msg = game.start_game(default_variant);
    link.send(msg).await?;
    print_status(&game);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = parse_command(&line) else {
                    println!("commands: new [variant] | <row> <col> | ping | quit");
                    continue;
                };
                match command {
                    Command::New(variant) => {
                        let msg = game.start_game(variant.unwrap_or(default_variant));
                        link.send(msg).await?;
                        print_status(&game);
                    }
                    Command::Click(row, col) => {
                        if let Some(msg) = game.click(row, col) {
                            link.send(msg).await?;
                        }
                        print_status(&game);
                    }
                    Command::Ping => link.send(ClientMessage::Ping).await?,
                    Command::Quit => break,
                }
            }
            msg = link.recv() => {
                let Some(msg) = msg else {
                    tracing::warn!("Disconnected from server");
                    break;
                };
                tracing::debug!("Server message: {:?}", msg);
                match &msg {
                    ServerMessage::Legal => println!("move accepted"),
                    ServerMessage::Illegal => println!("illegal move"),
                    ServerMessage::Check { side } => println!("check: side {}", side.token()),
                    ServerMessage::Pong => println!("pong"),
                    _ => {}
                }
                let redraw = !matches!(msg, ServerMessage::Pong | ServerMessage::Illegal);
                game.handle_server_message(msg);
                if redraw {
                    print_status(&game);
                }
            }
        }
    }

    Ok(())
}
