//! 服务端配置
//!
//! 加载顺序：内置默认值 → JSON 配置文件 → 命令行覆盖。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use protocol::{GameVariant, NetworkConfig, MAX_CONNECTIONS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置文件所在子目录
const CONFIG_DIR_NAME: &str = "engine-bridge";

/// 配置文件名
const CONFIG_FILE_NAME: &str = "server.json";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取失败
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析失败
    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 引擎进程配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 引擎可执行文件
    pub program: String,
    /// 所有变体共用的启动参数
    pub args: Vec<String>,
    /// 王过河变体追加的参数
    pub kings_cross_flag: String,
    /// 单次写入超时（毫秒）
    pub write_timeout_ms: u64,
}

impl EngineConfig {
    /// 指定变体的完整启动参数
    pub fn launch_args(&self, variant: GameVariant) -> Vec<String> {
        let mut args = self.args.clone();
        if variant == GameVariant::KingsCross {
            args.push(self.kings_cross_flag.clone());
        }
        args
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "./engine".to_string(),
            args: Vec::new(),
            kings_cross_flag: "-k".to_string(),
            write_timeout_ms: 2000,
        }
    }
}

/// 服务端配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub engine: EngineConfig,
    /// 最大同时连接数
    pub max_connections: usize,
    /// 退出时等待引擎关闭的宽限时间（毫秒）
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            engine: EngineConfig::default(),
            max_connections: MAX_CONNECTIONS,
            shutdown_grace_ms: 3000,
        }
    }
}

impl ServerConfig {
    /// 从 JSON 文件加载，缺省字段使用默认值
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 默认配置文件路径：`<config_dir>/engine-bridge/server.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// 指定路径时必须存在；否则尝试默认路径，不存在则使用内置默认值
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
