use crate::db_types::OrderId;

/// Generates a fresh public order id for storefront orders that do not originate from a checkout
/// attempt. Checkout-originated orders reuse the checkout's correlation token instead.
pub fn new_order_id() -> OrderId {
    OrderId(format!("ord-{:016x}", rand::random::<u64>()))
}

/// Generates the correlation token for a checkout attempt. This token is handed to the payment
/// widget as its order id and comes back on the redirect, so it must be unguessable enough not to
/// collide.
pub fn new_checkout_id() -> String {
    format!("chk-{:016x}", rand::random::<u64>())
}

#[cfg(test)]
mod test {
    use super::{new_checkout_id, new_order_id};

    #[test]
    fn ids_have_stable_prefixes() {
        assert!(new_order_id().as_str().starts_with("ord-"));
        assert!(new_checkout_id().starts_with("chk-"));
    }

    #[test]
    fn ids_do_not_repeat() {
        let a = new_checkout_id();
        let b = new_checkout_id();
        assert_ne!(a, b);
    }
}
