use std::{
    io,
    net::{SocketAddr, ToSocketAddrs},
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    sync::Notify,
    time::{sleep, Instant},
};

use super::addr::{AddrEntry, AddrFamily};
use crate::core::dial::DialInterrupt;
use crate::core::errors::DialError;

/// 有界等待切片上限；解析等待、连接等待与 accept 等待共用，
/// 取消延迟由此界定。
pub(crate) const WAIT_SLICE: Duration = Duration::from_millis(100);

/// 底层阻塞解析调用的接口。实现负责一次完整的名称解析并按
/// 返回顺序给出候选地址；顺序有意义，靠前的地址先被尝试。
pub trait Lookup: Send + Sync + 'static {
    fn lookup(&self, host: &str, port: u16, family: AddrFamily) -> io::Result<Vec<SocketAddr>>;
}

/// 系统解析器：经 getaddrinfo 阻塞解析，再按地址族过滤。
pub struct SystemLookup;

impl Lookup for SystemLookup {
    fn lookup(&self, host: &str, port: u16, family: AddrFamily) -> io::Result<Vec<SocketAddr>> {
        let addrs = (host, port).to_socket_addrs()?;
        Ok(addrs.filter(|addr| family.matches(addr)).collect())
    }
}

#[derive(Default)]
struct ResolveState {
    entries: Vec<AddrEntry>,
    last_error: Option<io::Error>,
    finished: bool,
}

/// 解析请求的共享状态。等待方与后台任务各持有一个 `Arc` 引用；
/// 等待方放弃（超时/取消）后任务继续运行直至自然结束，最后一个
/// 引用释放时状态随之销毁，不存在悬挂访问。
#[derive(Default)]
struct ResolveRequest {
    state: Mutex<ResolveState>,
    done: Notify,
}

impl ResolveRequest {
    fn record_entries(&self, addrs: Vec<SocketAddr>) {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => {
                tracing::error!(target = "dns", "resolve request mutex poisoned");
                return;
            }
        };
        state.entries.extend(addrs.into_iter().map(AddrEntry::stream));
    }

    fn record_error(&self, err: io::Error) {
        if let Ok(mut state) = self.state.lock() {
            state.last_error = Some(err);
        }
    }

    fn finish(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.finished = true;
        }
        self.done.notify_one();
    }
}

fn family_passes(family: AddrFamily, split_by_family: bool) -> Vec<AddrFamily> {
    if split_by_family {
        vec![AddrFamily::V4, AddrFamily::V6]
    } else {
        vec![family]
    }
}

fn run_lookup(
    lookup: &dyn Lookup,
    req: &ResolveRequest,
    host: &str,
    port: u16,
    family: AddrFamily,
    split_by_family: bool,
) {
    for pass in family_passes(family, split_by_family) {
        match lookup.lookup(host, port, pass) {
            Ok(addrs) => req.record_entries(addrs),
            Err(err) => {
                // 单个地址族失败只记录错误码，继续解析其余地址族
                tracing::debug!(
                    target = "dns",
                    host,
                    family = ?pass,
                    error = %err,
                    "lookup pass failed"
                );
                req.record_error(err);
            }
        }
    }
    req.finish();
}

/// 同步路径：在当前线程完成解析，无后台任务，也不支持取消。
fn blocking_resolve(
    lookup: &dyn Lookup,
    host: &str,
    port: u16,
    family: AddrFamily,
    split_by_family: bool,
) -> Result<Vec<AddrEntry>, DialError> {
    let mut entries: Vec<AddrEntry> = Vec::new();
    let mut last_error: Option<io::Error> = None;
    for pass in family_passes(family, split_by_family) {
        match lookup.lookup(host, port, pass) {
            Ok(addrs) => entries.extend(addrs.into_iter().map(AddrEntry::stream)),
            Err(err) => last_error = Some(err),
        }
    }
    if entries.is_empty() {
        return Err(DialError::ResolveFailed {
            host: host.to_string(),
            source: last_error
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses returned")),
        });
    }
    Ok(entries)
}

/// 解析主机名为有序候选地址表。
///
/// `timeout` 为 `None` 时同步解析；否则派生恰好一个后台阻塞任务执行
/// 底层解析，当前任务以不超过 [`WAIT_SLICE`] 的切片等待，每次醒来
/// 依次检查任务完成、总截止时间与取消信号：
/// - 任务完成或到达截止时间：取走现有结果返回，超时但已有部分结果
///   视为成功；
/// - 取消信号：立即返回 [`DialError::Aborted`]，后台任务不被强杀，
///   继续运行至自然结束。
///
/// 解析失败与超时/取消严格区分：前者携带平台错误返回
/// [`DialError::ResolveFailed`]，后者在没有任何可用结果时返回
/// [`DialError::Aborted`]。
pub async fn resolve(
    lookup: Arc<dyn Lookup>,
    host: &str,
    port: u16,
    family: AddrFamily,
    timeout: Option<Duration>,
    interrupt: &DialInterrupt,
    split_by_family: bool,
) -> Result<Vec<AddrEntry>, DialError> {
    let Some(timeout) = timeout else {
        return blocking_resolve(lookup.as_ref(), host, port, family, split_by_family);
    };

    let req = Arc::new(ResolveRequest::default());
    let worker_req = Arc::clone(&req);
    let worker_host = host.to_string();
    // JoinHandle 被丢弃：任务脱离本调用独立运行，结果经共享状态交接
    tokio::task::spawn_blocking(move || {
        run_lookup(
            lookup.as_ref(),
            &worker_req,
            &worker_host,
            port,
            family,
            split_by_family,
        );
    });

    let deadline = Instant::now() + timeout;
    loop {
        let now = Instant::now();
        {
            let mut state = match req.state.lock() {
                Ok(s) => s,
                Err(_) => {
                    tracing::error!(target = "dns", host, "resolve request mutex poisoned");
                    return Err(DialError::Aborted);
                }
            };
            if state.finished || now >= deadline {
                let entries = std::mem::take(&mut state.entries);
                if !entries.is_empty() {
                    return Ok(entries);
                }
                return Err(match state.last_error.take() {
                    Some(source) => DialError::ResolveFailed {
                        host: host.to_string(),
                        source,
                    },
                    None => DialError::Aborted,
                });
            }
        }

        if interrupt.is_interrupted() {
            tracing::debug!(target = "dns", host, "resolve interrupted; worker left running");
            return Err(DialError::Aborted);
        }

        let slice = WAIT_SLICE.min(deadline.duration_since(now));
        tokio::select! {
            _ = req.done.notified() => {}
            _ = sleep(slice) => {}
        }
    }
}
