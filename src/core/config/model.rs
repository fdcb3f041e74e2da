use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::dns::AddrFamily;

fn default_connect_timeout_micros() -> i64 {
    15_000_000
}

fn default_listen_timeout_ms() -> i64 {
    -1
}

fn default_cache_ttl_micros() -> i64 {
    -1
}

/// 监听模式。`Off` 为普通的主动连接；`SingleClient` 绑定后等待单个客户端
/// 接入并返回该连接；`MultiClient` 绑定后直接返回监听句柄供上层 accept。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ListenMode {
    #[default]
    Off,
    SingleClient,
    MultiClient,
}

/// 拨号策略，来自主配置文件或调用方直接构造。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DialConfig {
    /// 单次连接握手超时（微秒）。非正值在使用时回退到默认 15 秒。
    #[serde(default = "default_connect_timeout_micros")]
    pub connect_timeout_micros: i64,
    /// 名称解析超时（微秒）。非正值表示在当前任务内同步解析，
    /// 不派生后台任务，也不支持取消。
    #[serde(default)]
    pub resolve_timeout_micros: i64,
    #[serde(default)]
    pub listen: ListenMode,
    /// 等待客户端接入的超时（毫秒）。负值表示无限等待，仍可被取消。
    #[serde(default = "default_listen_timeout_ms")]
    pub listen_timeout_ms: i64,
    /// 套接字接收/发送缓冲区大小（字节）。未设置时保持系统默认；
    /// 设置失败不影响连接。
    #[serde(default)]
    pub recv_buffer_size: Option<usize>,
    #[serde(default)]
    pub send_buffer_size: Option<usize>,
    /// 是否启用解析缓存。
    #[serde(default)]
    pub cache_enabled: bool,
    /// 缓存条目存活时间（微秒）。负值表示不按时间过期，
    /// 仅显式清除或连接失败时失效。
    #[serde(default = "default_cache_ttl_micros")]
    pub cache_ttl_micros: i64,
    /// 下一次使用时强制清除该主机的缓存条目。
    #[serde(default)]
    pub cache_clear_on_next_use: bool,
    /// 解析地址族提示。
    #[serde(default)]
    pub family: AddrFamily,
    /// 按地址族分次解析：同一后台任务内先 IPv4 后 IPv6，
    /// 单个地址族失败不影响其余地址族的结果。
    #[serde(default)]
    pub split_by_family: bool,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            connect_timeout_micros: default_connect_timeout_micros(),
            resolve_timeout_micros: 0,
            listen: ListenMode::default(),
            listen_timeout_ms: default_listen_timeout_ms(),
            recv_buffer_size: None,
            send_buffer_size: None,
            cache_enabled: false,
            cache_ttl_micros: default_cache_ttl_micros(),
            cache_clear_on_next_use: false,
            family: AddrFamily::default(),
            split_by_family: false,
        }
    }
}

impl DialConfig {
    /// 实际生效的连接超时；非正配置回退到默认值。
    pub fn effective_connect_timeout(&self) -> Duration {
        let micros = if self.connect_timeout_micros > 0 {
            self.connect_timeout_micros
        } else {
            default_connect_timeout_micros()
        };
        Duration::from_micros(micros as u64)
    }

    pub fn resolve_timeout(&self) -> Option<Duration> {
        if self.resolve_timeout_micros > 0 {
            Some(Duration::from_micros(self.resolve_timeout_micros as u64))
        } else {
            None
        }
    }
}
