use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// 观察者钩子的触发阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverStage {
    WillConnect,
    DidConnect,
}

/// 拨号过程中可能出现的错误类型。
///
/// 单个候选地址的失败在内部回退到下一个候选，只有在没有候选可试时
/// 才作为 [`DialError::Exhausted`] 返回；解析失败没有候选可试，立即返回。
#[derive(Debug, Error)]
pub enum DialError {
    /// 主机名或端口输入不合法。
    #[error("invalid dial target: {0}")]
    InvalidArgument(String),

    /// 底层名称解析返回错误，携带平台错误。
    #[error("failed to resolve {host}: {source}")]
    ResolveFailed {
        host: String,
        #[source]
        source: io::Error,
    },

    /// 解析或等待超时/被取消，且没有任何可用的部分结果。
    /// 与 [`DialError::ResolveFailed`] 严格区分，二者不会混用。
    #[error("operation aborted")]
    Aborted,

    /// 创建套接字失败。
    #[error("socket create failed: {0}")]
    SocketCreate(#[source] io::Error),

    /// 对单个候选地址的连接失败。
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// 绑定/监听失败。
    #[error("listen on {addr} failed: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// 等待单个客户端接入失败或超时。
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// 观察者钩子拒绝了本次尝试。
    #[error("refused by observer at {stage:?} stage")]
    ObserverRefused { stage: ObserverStage },

    /// 所有候选地址都已尝试且全部失败，附带最后一个候选的错误。
    #[error("all {attempts} candidate addresses failed; last error: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<DialError>,
    },
}

impl DialError {
    /// 是否为取消/超时产生的中止状态。
    pub fn is_aborted(&self) -> bool {
        matches!(self, DialError::Aborted)
    }

    pub(crate) fn connect_timeout(addr: SocketAddr) -> Self {
        DialError::Connect {
            addr,
            source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
        }
    }

    pub(crate) fn accept_timeout() -> Self {
        DialError::Accept(io::Error::new(io::ErrorKind::TimedOut, "accept timed out"))
    }
}
