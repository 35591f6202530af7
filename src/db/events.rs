//! Adapter lifecycle notifications.

use super::value::BindMap;

/// Observer for adapter activity.
///
/// Every method defaults to a no-op, so implementors only override the
/// hooks they care about. The adapter fires `before_query` ahead of each
/// statement it sends to the driver and `after_query` once the driver
/// returns; transaction hooks fire on successful boundary changes only.
pub trait EventNotifier {
    fn before_query(&self, _sql: &str, _binds: &BindMap) {}
    fn after_query(&self, _sql: &str) {}
    fn begin_transaction(&self) {}
    fn commit_transaction(&self) {}
    fn rollback_transaction(&self) {}
}
