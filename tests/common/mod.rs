#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use netdial::core::dns::resolver::Lookup;
use netdial::{AddrFamily, ConnectReport, DialObserver, ObserverVerdict};

/// Lookup stub returning a fixed candidate list in insertion order.
pub struct StaticLookup {
    addrs: Vec<SocketAddr>,
    pub calls: AtomicUsize,
}

impl StaticLookup {
    pub fn new(addrs: Vec<SocketAddr>) -> Self {
        Self {
            addrs,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Lookup for StaticLookup {
    fn lookup(&self, _host: &str, _port: u16, family: AddrFamily) -> io::Result<Vec<SocketAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .addrs
            .iter()
            .copied()
            .filter(|addr| family.matches(addr))
            .collect())
    }
}

/// Lookup stub that always fails with the given error kind.
pub struct FailingLookup {
    kind: io::ErrorKind,
    message: &'static str,
    pub calls: AtomicUsize,
}

impl FailingLookup {
    pub fn new(kind: io::ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Lookup for FailingLookup {
    fn lookup(&self, _host: &str, _port: u16, _family: AddrFamily) -> io::Result<Vec<SocketAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(self.kind, self.message))
    }
}

/// Lookup stub that blocks for a while before answering, to exercise
/// resolver timeouts and cancellation.
pub struct SlowLookup {
    delay: Duration,
    addrs: Vec<SocketAddr>,
}

impl SlowLookup {
    pub fn new(delay: Duration, addrs: Vec<SocketAddr>) -> Self {
        Self { delay, addrs }
    }
}

impl Lookup for SlowLookup {
    fn lookup(&self, _host: &str, _port: u16, family: AddrFamily) -> io::Result<Vec<SocketAddr>> {
        std::thread::sleep(self.delay);
        Ok(self
            .addrs
            .iter()
            .copied()
            .filter(|addr| family.matches(addr))
            .collect())
    }
}

/// Observer recording hook invocations, with per-address refusals.
#[derive(Default)]
pub struct RecordingObserver {
    pub will: Mutex<Vec<SocketAddr>>,
    pub did: Mutex<Vec<(SocketAddr, bool)>>,
    refuse_will: HashSet<SocketAddr>,
    refuse_did: HashSet<SocketAddr>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_will(mut self, addr: SocketAddr) -> Self {
        self.refuse_will.insert(addr);
        self
    }

    pub fn refusing_did(mut self, addr: SocketAddr) -> Self {
        self.refuse_did.insert(addr);
        self
    }

    pub fn will_calls(&self) -> Vec<SocketAddr> {
        self.will.lock().unwrap().clone()
    }

    pub fn did_calls(&self) -> Vec<(SocketAddr, bool)> {
        self.did.lock().unwrap().clone()
    }
}

impl DialObserver for RecordingObserver {
    fn on_will_connect(&self, _host: &str, addr: SocketAddr) -> ObserverVerdict {
        self.will.lock().unwrap().push(addr);
        if self.refuse_will.contains(&addr) {
            ObserverVerdict::Refuse
        } else {
            ObserverVerdict::Proceed
        }
    }

    fn on_did_connect(&self, report: &ConnectReport<'_>) -> ObserverVerdict {
        self.did
            .lock()
            .unwrap()
            .push((report.addr, report.error.is_none()));
        if report.error.is_none() && self.refuse_did.contains(&report.addr) {
            ObserverVerdict::Refuse
        } else {
            ObserverVerdict::Proceed
        }
    }
}

/// Grab a loopback port that nothing is listening on.
pub fn free_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}
