use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use socket2::{Protocol, Type};

/// 地址族，贯穿配置、解析与缓存。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum AddrFamily {
    V4,
    V6,
    #[default]
    Unspec,
}

impl AddrFamily {
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddrFamily::V4,
            SocketAddr::V6(_) => AddrFamily::V6,
        }
    }

    /// 地址是否属于本族；`Unspec` 接受任何地址。
    pub fn matches(&self, addr: &SocketAddr) -> bool {
        match self {
            AddrFamily::V4 => addr.is_ipv4(),
            AddrFamily::V6 => addr.is_ipv6(),
            AddrFamily::Unspec => true,
        }
    }
}

/// 一个已解析的候选端点：地址族、套接字类型/协议与套接字地址。
///
/// 构造后不再修改，仅在连接前允许补齐缺失端口；候选的尝试顺序
/// 即解析/缓存返回顺序，由 `Vec<AddrEntry>` 承载。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrEntry {
    pub family: AddrFamily,
    pub socket_type: Type,
    pub protocol: Protocol,
    pub addr: SocketAddr,
}

impl AddrEntry {
    /// 以流式 TCP 参数包装一个解析得到的地址。
    pub fn stream(addr: SocketAddr) -> Self {
        Self {
            family: AddrFamily::of(&addr),
            socket_type: Type::STREAM,
            protocol: Protocol::TCP,
            addr,
        }
    }

    /// 个别平台在 IPv6-only 网络下的解析结果不带端口，连接前补齐。
    pub(crate) fn repair_missing_port(&mut self, port: u16) {
        if self.family == AddrFamily::V6 && self.addr.port() == 0 && port != 0 {
            self.addr.set_port(port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[test]
    fn stream_entry_carries_family_of_address() {
        let v4 = AddrEntry::stream(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80));
        assert_eq!(v4.family, AddrFamily::V4);
        assert_eq!(v4.socket_type, Type::STREAM);
        assert_eq!(v4.protocol, Protocol::TCP);

        let v6 = AddrEntry::stream(SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 80));
        assert_eq!(v6.family, AddrFamily::V6);
    }

    #[test]
    fn family_filter_accepts_matching_addresses() {
        let v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 443);
        let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 443);
        assert!(AddrFamily::V4.matches(&v4));
        assert!(!AddrFamily::V4.matches(&v6));
        assert!(AddrFamily::V6.matches(&v6));
        assert!(AddrFamily::Unspec.matches(&v4));
        assert!(AddrFamily::Unspec.matches(&v6));
    }

    #[test]
    fn missing_port_filled_for_v6_only() {
        let mut v6 = AddrEntry::stream(SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 0));
        v6.repair_missing_port(8080);
        assert_eq!(v6.addr.port(), 8080);

        let mut v4 = AddrEntry::stream(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0));
        v4.repair_missing_port(8080);
        assert_eq!(v4.addr.port(), 0, "v4 entries are left untouched");

        let mut set = AddrEntry::stream(SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 443));
        set.repair_missing_port(8080);
        assert_eq!(set.addr.port(), 443, "present port is never overwritten");
    }
}
