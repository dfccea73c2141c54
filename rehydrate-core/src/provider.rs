use crate::bag::StateBag;

/// Capability implemented by each target type whose state should survive
/// destruction and recreation.
///
/// The runtime never inspects bag contents beyond an emptiness check; what a
/// target writes and reads is entirely its own contract with itself.
///
/// `restore_state` takes `&self` because targets are shared (`Arc`) at the
/// point of restoration; implementations use interior mutability for the
/// fields they restore.
pub trait SavedState: Send + Sync {
    /// Write this target's state into `out`.
    ///
    /// Leaving `out` empty means the target has nothing worth preserving; the
    /// runtime will not create a cache entry or durable record for it.
    fn save_state(&self, out: &mut StateBag);

    /// Read this target's state back out of `state`.
    fn restore_state(&self, state: &StateBag);
}
