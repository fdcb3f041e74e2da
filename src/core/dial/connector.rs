use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use uuid::Uuid;

use super::events;
use super::interrupt::DialInterrupt;
use super::observer::{ConnectReport, DialObserver, NoopObserver, ObserverVerdict};
use super::sockio;
use crate::core::config::model::{DialConfig, ListenMode};
use crate::core::dns::addr::{AddrEntry, AddrFamily};
use crate::core::dns::cache::{obtain_global_cache, DnsCache};
use crate::core::dns::resolver::{self, Lookup, SystemLookup};
use crate::core::errors::{DialError, ObserverStage};

/// 已建立的句柄：主动连接与单客户端模式得到连接流，
/// 多客户端模式得到监听器供上层自行 accept。
#[derive(Debug)]
pub enum DialHandle {
    Stream(TcpStream),
    Listener(TcpListener),
}

impl DialHandle {
    pub fn into_stream(self) -> Option<TcpStream> {
        match self {
            DialHandle::Stream(stream) => Some(stream),
            DialHandle::Listener(_) => None,
        }
    }

    pub fn into_listener(self) -> Option<TcpListener> {
        match self {
            DialHandle::Listener(listener) => Some(listener),
            DialHandle::Stream(_) => None,
        }
    }
}

/// 拨号结果：句柄与端点元数据。
#[derive(Debug)]
pub struct Dialed {
    pub handle: DialHandle,
    pub local: Option<SocketAddr>,
    pub peer: Option<SocketAddr>,
    pub elapsed: Duration,
    /// 候选地址是否来自解析缓存。
    pub used_cache: bool,
}

/// 单个候选的失败分类：`Failed` 回退到下一候选，`Fatal` 终止整个拨号。
enum CandidateError {
    Failed(DialError),
    Fatal(DialError),
}

/// 连接建立器。
///
/// 每次 [`Connector::dial`] 调用内部：缓存命中或后台解析得到有序
/// 候选表，依次对每个候选创建套接字、应用缓冲区大小、按监听模式
/// 分派，失败则回退到下一候选；成功时按需回写缓存，全部失败且
/// 候选来自缓存时将该主机的缓存条目作废。
pub struct Connector {
    config: DialConfig,
    cache: Arc<DnsCache>,
    lookup: Arc<dyn Lookup>,
    observer: Arc<dyn DialObserver>,
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("cache_enabled", &self.config.cache_enabled)
            .field("listen", &self.config.listen)
            .finish()
    }
}

impl Connector {
    /// 以给定策略创建连接建立器，使用进程级共享缓存与系统解析器。
    pub fn new(config: DialConfig) -> Self {
        Self {
            config,
            cache: obtain_global_cache(),
            lookup: Arc::new(SystemLookup),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_cache(mut self, cache: Arc<DnsCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn Lookup>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DialObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DialConfig {
        &self.config
    }

    /// 显式作废某主机的缓存条目。
    pub fn invalidate_host(&self, host: &str) {
        self.cache.invalidate(host);
        events::emit_cache_invalidate(host, "explicit clear");
    }

    /// 建立到 `host:port` 的连接（或按监听模式建立监听/接入）。
    ///
    /// `interrupt` 在每个有界等待醒来时被轮询；观测到取消后整个
    /// 调用在一个等待切片内以 [`DialError::Aborted`] 返回。
    pub async fn dial(
        &self,
        host: &str,
        port: u16,
        interrupt: &DialInterrupt,
    ) -> Result<Dialed, DialError> {
        let listen = self.config.listen;
        if port == 0 && listen == ListenMode::Off {
            return Err(DialError::InvalidArgument(format!(
                "port missing for host {host:?}"
            )));
        }
        if host.is_empty() && listen == ListenMode::Off {
            return Err(DialError::InvalidArgument("empty hostname".into()));
        }

        let dial_id = Uuid::new_v4();
        let started = Instant::now();

        let mut used_cache = false;
        let mut candidates: Vec<AddrEntry> = Vec::new();

        if host.is_empty() {
            // 监听模式下的空主机名：按地址族提示绑定通配地址
            candidates.push(AddrEntry::stream(wildcard_addr(self.config.family, port)));
        } else {
            if self.config.cache_enabled {
                if let Some(entry) = self.cache.lookup(
                    host,
                    self.config.cache_ttl_micros,
                    self.config.cache_clear_on_next_use,
                ) {
                    events::emit_cache_hit(dial_id, host, entry.addr);
                    candidates.push(entry);
                    used_cache = true;
                }
            }
            if !used_cache {
                // 解析失败没有候选可试，立即向上返回
                candidates = resolver::resolve(
                    Arc::clone(&self.lookup),
                    host,
                    port,
                    self.config.family,
                    self.config.resolve_timeout(),
                    interrupt,
                    self.config.split_by_family,
                )
                .await?;
            }
        }

        if candidates.is_empty() {
            return Err(DialError::ResolveFailed {
                host: host.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no candidate addresses"),
            });
        }

        let total = candidates.len();
        let mut last_error: Option<DialError> = None;
        for (index, mut candidate) in candidates.into_iter().enumerate() {
            candidate.repair_missing_port(port);
            let has_more = index + 1 < total;

            match self
                .try_candidate(host, &candidate, interrupt, has_more)
                .await
            {
                Ok(mut dialed) => {
                    dialed.elapsed = started.elapsed();
                    dialed.used_cache = used_cache;
                    if !used_cache && self.config.cache_enabled && !host.is_empty() {
                        self.cache.store(host, &candidate);
                        events::emit_cache_store(dial_id, host, candidate.addr);
                    }
                    events::emit_established(
                        dial_id,
                        candidate.addr,
                        dialed.elapsed.as_millis() as u64,
                        used_cache,
                    );
                    return Ok(dialed);
                }
                Err(CandidateError::Fatal(err)) => return Err(err),
                Err(CandidateError::Failed(err)) => {
                    if has_more {
                        events::emit_candidate_fallback(
                            dial_id,
                            candidate.addr,
                            total - index - 1,
                            &err,
                        );
                    }
                    last_error = Some(err);
                }
            }
        }

        if used_cache {
            // 缓存地址被证明不可用，下次拨号重新解析
            self.cache.invalidate(host);
            events::emit_cache_invalidate(host, "connect failed with cached address");
        }
        events::emit_exhausted(dial_id, host, total);
        Err(DialError::Exhausted {
            attempts: total,
            last: Box::new(last_error.unwrap_or(DialError::Aborted)),
        })
    }

    async fn try_candidate(
        &self,
        host: &str,
        candidate: &AddrEntry,
        interrupt: &DialInterrupt,
        has_more: bool,
    ) -> Result<Dialed, CandidateError> {
        let socket = sockio::open_socket(candidate).map_err(CandidateError::Failed)?;
        sockio::apply_buffer_sizes(
            &socket,
            self.config.recv_buffer_size,
            self.config.send_buffer_size,
        );

        match self.config.listen {
            ListenMode::MultiClient => {
                let listener =
                    sockio::bind_listener(socket, candidate.addr).map_err(CandidateError::Failed)?;
                let local = listener.local_addr().ok();
                Ok(Dialed {
                    handle: DialHandle::Listener(listener),
                    local,
                    peer: None,
                    elapsed: Duration::ZERO,
                    used_cache: false,
                })
            }
            ListenMode::SingleClient => {
                let listener =
                    sockio::bind_listener(socket, candidate.addr).map_err(CandidateError::Failed)?;
                let local = listener.local_addr().ok();
                let stream =
                    sockio::accept_client(&listener, self.config.listen_timeout_ms, interrupt)
                        .await
                        .map_err(|err| match err {
                            DialError::Aborted => CandidateError::Fatal(DialError::Aborted),
                            other => CandidateError::Failed(other),
                        })?;
                let peer = stream.peer_addr().ok();
                // 原监听器在此关闭，只保留已接入的客户端连接
                Ok(Dialed {
                    handle: DialHandle::Stream(stream),
                    local,
                    peer,
                    elapsed: Duration::ZERO,
                    used_cache: false,
                })
            }
            ListenMode::Off => {
                if self.observer.on_will_connect(host, candidate.addr) == ObserverVerdict::Refuse {
                    tracing::warn!(
                        target = "dial",
                        host,
                        addr = %candidate.addr,
                        "dial refused by observer before connect"
                    );
                    return Err(CandidateError::Fatal(DialError::ObserverRefused {
                        stage: ObserverStage::WillConnect,
                    }));
                }

                let begin = Instant::now();
                match sockio::connect_stream(
                    socket,
                    candidate.addr,
                    self.config.effective_connect_timeout(),
                    interrupt,
                    has_more,
                )
                .await
                {
                    Ok(stream) => {
                        let local = stream.local_addr().ok();
                        let peer = stream.peer_addr().ok();
                        let report = ConnectReport {
                            addr: candidate.addr,
                            local,
                            peer,
                            elapsed: begin.elapsed(),
                            error: None,
                        };
                        if self.observer.on_did_connect(&report) == ObserverVerdict::Refuse {
                            tracing::warn!(
                                target = "dial",
                                addr = %candidate.addr,
                                "established connection refused by observer"
                            );
                            return Err(CandidateError::Failed(DialError::ObserverRefused {
                                stage: ObserverStage::DidConnect,
                            }));
                        }
                        Ok(Dialed {
                            handle: DialHandle::Stream(stream),
                            local,
                            peer,
                            elapsed: Duration::ZERO,
                            used_cache: false,
                        })
                    }
                    Err(err) => {
                        let report = ConnectReport {
                            addr: candidate.addr,
                            local: None,
                            peer: None,
                            elapsed: begin.elapsed(),
                            error: Some(&err),
                        };
                        if self.observer.on_did_connect(&report) == ObserverVerdict::Refuse {
                            return Err(CandidateError::Fatal(DialError::ObserverRefused {
                                stage: ObserverStage::DidConnect,
                            }));
                        }
                        if err.is_aborted() {
                            // 取消优先于候选回退，立即终止
                            return Err(CandidateError::Fatal(err));
                        }
                        Err(CandidateError::Failed(err))
                    }
                }
            }
        }
    }
}

fn wildcard_addr(family: AddrFamily, port: u16) -> SocketAddr {
    match family {
        AddrFamily::V6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
        _ => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_port_is_rejected_in_connect_mode() {
        let connector = Connector::new(DialConfig::default());
        let err = connector
            .dial("example.com", 0, &DialInterrupt::none())
            .await
            .expect_err("port 0 invalid");
        assert!(matches!(err, DialError::InvalidArgument(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_host_is_rejected_in_connect_mode() {
        let connector = Connector::new(DialConfig::default());
        let err = connector
            .dial("", 80, &DialInterrupt::none())
            .await
            .expect_err("empty host invalid");
        assert!(matches!(err, DialError::InvalidArgument(_)), "{err:?}");
    }

    #[test]
    fn wildcard_follows_family_hint() {
        assert!(wildcard_addr(AddrFamily::V4, 80).is_ipv4());
        assert!(wildcard_addr(AddrFamily::Unspec, 80).is_ipv4());
        assert!(wildcard_addr(AddrFamily::V6, 80).is_ipv6());
    }
}
