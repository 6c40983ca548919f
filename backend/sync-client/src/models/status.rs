/// Latest sync counters and phase code reported by the helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub synced_count: i64,
    pub unsynced_count: i64,
    pub failed_count: i64,
    pub status_code: i64,
    /// Capability flag reported by older helpers; `None` when absent.
    pub can_sync: Option<bool>,
}
