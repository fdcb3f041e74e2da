use std::net::SocketAddr;
use std::time::Duration;

use socket2::{Domain, Socket};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::{sleep, Instant};

use super::interrupt::DialInterrupt;
use crate::core::dns::addr::AddrEntry;
use crate::core::dns::resolver::WAIT_SLICE;
use crate::core::errors::DialError;

const LISTEN_BACKLOG: u32 = 16;

/// 按候选的地址族/类型/协议创建一个未连接的非阻塞套接字。
pub(crate) fn open_socket(entry: &AddrEntry) -> Result<TcpSocket, DialError> {
    let domain = match entry.addr {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, entry.socket_type, Some(entry.protocol))
        .map_err(DialError::SocketCreate)?;
    socket
        .set_nonblocking(true)
        .map_err(DialError::SocketCreate)?;
    Ok(TcpSocket::from_std_stream(socket.into()))
}

/// 尽力设置收发缓冲区大小；失败只记日志，沿用系统默认值。
pub(crate) fn apply_buffer_sizes(socket: &TcpSocket, recv: Option<usize>, send: Option<usize>) {
    if let Some(size) = recv {
        if let Err(err) = socket.set_recv_buffer_size(size as u32) {
            tracing::warn!(target = "dial", size, error = %err, "failed to set recv buffer size");
        }
    }
    if let Some(size) = send {
        if let Err(err) = socket.set_send_buffer_size(size as u32) {
            tracing::warn!(target = "dial", size, error = %err, "failed to set send buffer size");
        }
    }
}

/// 对单个候选地址发起超时受限、可取消的连接。
///
/// 连接 future 只创建一次并被 pin 住，与不超过 [`WAIT_SLICE`] 的
/// 睡眠切片竞争；每个切片醒来检查取消信号，截止时间到达即失败。
/// `has_more` 仅影响日志级别：还有候选可退时降为 warn。
pub(crate) async fn connect_stream(
    socket: TcpSocket,
    addr: SocketAddr,
    timeout: Duration,
    interrupt: &DialInterrupt,
    has_more: bool,
) -> Result<TcpStream, DialError> {
    let deadline = Instant::now() + timeout;
    let connect = socket.connect(addr);
    tokio::pin!(connect);

    loop {
        let now = Instant::now();
        if now >= deadline {
            if has_more {
                tracing::warn!(target = "dial", %addr, "connect timed out; next candidate available");
            } else {
                tracing::error!(target = "dial", %addr, "connect timed out");
            }
            return Err(DialError::connect_timeout(addr));
        }
        let slice = WAIT_SLICE.min(deadline.duration_since(now));
        tokio::select! {
            res = &mut connect => {
                return match res {
                    Ok(stream) => Ok(stream),
                    Err(source) => {
                        if has_more {
                            tracing::warn!(target = "dial", %addr, error = %source, "connect failed; next candidate available");
                        } else {
                            tracing::error!(target = "dial", %addr, error = %source, "connect failed");
                        }
                        Err(DialError::Connect { addr, source })
                    }
                };
            }
            _ = sleep(slice) => {
                if interrupt.is_interrupted() {
                    tracing::debug!(target = "dial", %addr, "connect interrupted");
                    return Err(DialError::Aborted);
                }
            }
        }
    }
}

/// 绑定并监听候选地址，返回监听器。
pub(crate) fn bind_listener(socket: TcpSocket, addr: SocketAddr) -> Result<TcpListener, DialError> {
    if let Err(err) = socket.set_reuseaddr(true) {
        tracing::debug!(target = "dial", %addr, error = %err, "failed to set SO_REUSEADDR");
    }
    socket
        .bind(addr)
        .map_err(|source| DialError::Listen { addr, source })?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|source| DialError::Listen { addr, source })
}

/// 等待单个客户端接入，超时受限且可取消。
///
/// `timeout_ms` 为负表示无限等待，但每个等待切片仍检查取消信号。
pub(crate) async fn accept_client(
    listener: &TcpListener,
    timeout_ms: i64,
    interrupt: &DialInterrupt,
) -> Result<TcpStream, DialError> {
    let deadline = if timeout_ms >= 0 {
        Some(Instant::now() + Duration::from_millis(timeout_ms as u64))
    } else {
        None
    };

    loop {
        let now = Instant::now();
        if let Some(deadline) = deadline {
            if now >= deadline {
                return Err(DialError::accept_timeout());
            }
        }
        let slice = match deadline {
            Some(deadline) => WAIT_SLICE.min(deadline.duration_since(now)),
            None => WAIT_SLICE,
        };
        tokio::select! {
            res = listener.accept() => {
                return match res {
                    Ok((stream, peer)) => {
                        tracing::debug!(target = "dial", %peer, "client accepted");
                        Ok(stream)
                    }
                    Err(source) => Err(DialError::Accept(source)),
                };
            }
            _ = sleep(slice) => {
                if interrupt.is_interrupted() {
                    return Err(DialError::Aborted);
                }
            }
        }
    }
}
