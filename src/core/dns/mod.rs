pub mod addr;
pub mod cache;
pub mod resolver;

pub use addr::{AddrEntry, AddrFamily};
pub use cache::{obtain_global_cache, set_global_cache, CacheStats, DnsCache};
pub use resolver::{Lookup, SystemLookup};
