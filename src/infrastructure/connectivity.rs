use crate::application::ports::connectivity::ConnectivityProbe;
use std::sync::atomic::{AtomicBool, Ordering};

/// ホスト側のネットワーク監視から状態を流し込むプローブ
#[derive(Debug)]
pub struct ManualConnectivity {
    connected: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    /// 直前の状態を返す
    pub fn set_connected(&self, connected: bool) -> bool {
        self.connected.swap(connected, Ordering::SeqCst)
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for ManualConnectivity {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// モックモードでは常にオンライン扱い
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }
}
