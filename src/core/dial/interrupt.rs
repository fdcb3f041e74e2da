use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio_util::sync::CancellationToken;

/// 每次拨号调用的协作取消信号。
///
/// 核心在每个有界等待醒来时轮询该谓词；一旦观测到取消，当次调用的
/// 所有挂起等待都会在一个等待切片内以中止状态返回。谓词本身须廉价
/// 且无副作用，可被任意次调用。
#[derive(Clone, Default)]
pub struct DialInterrupt {
    check: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl DialInterrupt {
    /// 不可取消的占位信号。
    pub fn none() -> Self {
        Self { check: None }
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            check: Some(Arc::new(f)),
        }
    }

    /// 与任务层的取消令牌对接。
    pub fn from_token(token: CancellationToken) -> Self {
        Self::from_fn(move || token.is_cancelled())
    }

    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self::from_fn(move || flag.load(Ordering::Relaxed))
    }

    pub fn is_interrupted(&self) -> bool {
        self.check.as_ref().map(|check| check()).unwrap_or(false)
    }
}

impl fmt::Debug for DialInterrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialInterrupt")
            .field("cancellable", &self.check.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_never_interrupts() {
        assert!(!DialInterrupt::none().is_interrupted());
        assert!(!DialInterrupt::default().is_interrupted());
    }

    #[test]
    fn flag_interrupt_tracks_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let interrupt = DialInterrupt::from_flag(flag.clone());
        assert!(!interrupt.is_interrupted());
        flag.store(true, Ordering::Relaxed);
        assert!(interrupt.is_interrupted());
    }

    #[test]
    fn token_interrupt_tracks_cancellation() {
        let token = CancellationToken::new();
        let interrupt = DialInterrupt::from_token(token.clone());
        assert!(!interrupt.is_interrupted());
        token.cancel();
        assert!(interrupt.is_interrupted());
    }
}
