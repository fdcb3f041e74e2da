#![allow(dead_code)]

pub mod core;
pub mod logging;

pub use core::config::{DialConfig, ListenMode};
pub use core::dial::{
    ConnectReport, Connector, DialHandle, DialInterrupt, DialObserver, Dialed, NoopObserver,
    ObserverStage, ObserverVerdict,
};
pub use core::dns::{AddrEntry, AddrFamily, DnsCache};
pub use core::errors::DialError;
