use std::path::PathBuf;

use anyhow::{Context, Result};
use bridge_server::{BridgeServer, ServerConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 引擎桥接服务端
#[derive(Parser, Debug)]
#[command(name = "bridge-server", version)]
struct Cli {
    /// JSON 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,

    /// 监听地址
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(long)]
    port: Option<u16>,

    /// 引擎可执行文件
    #[arg(long)]
    engine: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.network.host = host;
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(engine) = self.engine {
            config.engine.program = engine;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("bridge_server=debug".parse()?))
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load_or_default(cli.config.as_deref())
        .context("加载配置失败")?;
    cli.apply(&mut config);

    info!(engine = %config.engine.program, "引擎桥接服务端启动中...");

    let server = BridgeServer::new(config);
    let listener = server.bind().await.context("绑定监听地址失败")?;

    server
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "无法监听退出信号");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("服务端已退出");
    Ok(())
}
