//! Lifecycle command handlers
//!
//! One file per command. Each handler implements [`CommandHandler`]:
//! it validates the actor and preconditions, performs all entity writes
//! through the context's transaction, and queues notifications, audit
//! entries and broadcast events for post-commit dispatch.
//!
//! Handlers never commit; the manager owns the transaction boundary.

mod accept_offer;
mod add_evidence;
mod cancel_order;
mod confirm_delivery;
mod create_listing;
mod create_offer;
mod expire_offers;
mod open_dispute;
mod process_payment;
mod reject_offer;
mod remove_listing;
mod resolve_dispute;
mod send_message;
mod submit_review;
mod update_listing;
mod update_shipment;
mod withdraw_offer;

pub use accept_offer::AcceptOfferAction;
pub use add_evidence::AddEvidenceAction;
pub use cancel_order::CancelOrderAction;
pub use confirm_delivery::ConfirmDeliveryAction;
pub use create_listing::CreateListingAction;
pub use create_offer::{CreateOfferAction, OfferWithThread};
pub use expire_offers::ExpireOffersAction;
pub use open_dispute::OpenDisputeAction;
pub use process_payment::{PaymentOutcome, ProcessPaymentAction};
pub use reject_offer::RejectOfferAction;
pub use remove_listing::RemoveListingAction;
pub use resolve_dispute::ResolveDisputeAction;
pub use send_message::SendMessageAction;
pub use submit_review::SubmitReviewAction;
pub use update_listing::UpdateListingAction;
pub use update_shipment::{TrackingEventInput, UpdateShipmentAction};
pub use withdraw_offer::WithdrawOfferAction;
