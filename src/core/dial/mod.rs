pub mod connector;
pub mod events;
pub mod interrupt;
pub mod observer;
pub(crate) mod sockio;

pub use crate::core::errors::ObserverStage;
pub use connector::{Connector, DialHandle, Dialed};
pub use interrupt::DialInterrupt;
pub use observer::{ConnectReport, DialObserver, NoopObserver, ObserverVerdict};
