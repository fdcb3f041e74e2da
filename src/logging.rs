use tracing_subscriber::{fmt, EnvFilter};

/// 日志过滤环境变量；未设置时回退到 `RUST_LOG`，再回退到 `info`。
const LOG_ENV: &str = "NETDIAL_LOG";

/// 初始化 tracing 输出。重复调用是空操作，进程里已有全局
/// subscriber 时也不覆盖。
pub fn init_logging() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    let subscriber = fmt()
        .with_env_filter(env_filter)
        // dial/dns 两个 target 用于区分子系统，保留在输出里
        .with_target(true)
        .with_level(true)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
    tracing::debug!(target = "dial", "tracing initialized");
}
