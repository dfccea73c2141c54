use crate::bag::StateBag;

/// Pre/post-processing applied to a bag around provider calls.
///
/// A transform may rewrite values in place, typically replacing payloads that
/// are expensive to serialize directly with
/// [`StateValue::Wrapped`](crate::bag::StateValue::Wrapped) carriers. `wrap`
/// runs after a provider fills a bag, before it is cached and persisted;
/// `unwrap` runs after a bag is fetched, before the provider consumes it.
/// `unwrap` must reverse whatever `wrap` did.
pub trait BagTransform: Send + Sync + 'static {
    fn wrap(&self, bag: &mut StateBag);

    fn unwrap(&self, bag: &mut StateBag);
}

/// Transform that leaves bags untouched. The default for bridges that store
/// only directly-serializable values.
pub struct NoopTransform;

impl BagTransform for NoopTransform {
    fn wrap(&self, _bag: &mut StateBag) {}

    fn unwrap(&self, _bag: &mut StateBag) {}
}
