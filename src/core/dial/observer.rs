use std::net::SocketAddr;
use std::time::Duration;

use crate::core::errors::DialError;

/// 观察者钩子的裁决：放行或拒绝当次尝试。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObserverVerdict {
    #[default]
    Proceed,
    Refuse,
}

/// 单次连接尝试的结果信息，成功与失败统一经由
/// [`DialObserver::on_did_connect`] 交给观察者。
#[derive(Debug)]
pub struct ConnectReport<'a> {
    /// 本次尝试的候选地址。
    pub addr: SocketAddr,
    pub local: Option<SocketAddr>,
    pub peer: Option<SocketAddr>,
    pub elapsed: Duration,
    /// 失败时携带错误；成功时为 `None`。
    pub error: Option<&'a DialError>,
}

/// 围绕连接尝试的应用观察者。
///
/// `on_will_connect` 在发起连接前调用，拒绝则整个拨号立即终止；
/// `on_did_connect` 在连接成功或失败后调用，对成功连接的拒绝
/// 视为该候选失败（例如基于对端地址的策略拦截），继续尝试下一个
/// 候选。两个钩子都在拨号调用方的任务上同步执行，不应阻塞。
pub trait DialObserver: Send + Sync {
    fn on_will_connect(&self, host: &str, addr: SocketAddr) -> ObserverVerdict {
        let _ = (host, addr);
        ObserverVerdict::Proceed
    }

    fn on_did_connect(&self, report: &ConnectReport<'_>) -> ObserverVerdict {
        let _ = report;
        ObserverVerdict::Proceed
    }
}

/// 默认观察者：全部放行。
pub struct NoopObserver;

impl DialObserver for NoopObserver {}
