/// 端末がオンラインかどうかを同期的に答えるプローブ。
/// ユーザー起点の書き込みごとに、キューへ積むか直接呼ぶかの判断に使う。
pub trait ConnectivityProbe: Send + Sync {
    fn is_connected(&self) -> bool;
}
