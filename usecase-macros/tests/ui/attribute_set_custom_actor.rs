use usecase_domain::actor::Actor;
use usecase_domain::attributes::AttributeSet;
use usecase_macros::attribute_set;

#[attribute_set(actor = requested_by)]
struct ApproveInvoice {
    invoice_id: u64,
    requested_by: Actor,
}

fn main() {
    let approve = ApproveInvoice {
        invoice_id: 7,
        requested_by: Actor::builder().id("u-9").build(),
    };
    assert_eq!(approve.current_user().map(|a| a.id()), Some("u-9"));
    assert_eq!(approve.invoice_id, 7);
}
