//! Partner-facing handlers: promo code administration, redemption, and
//! payouts.

mod create_promo_code;
mod list_partner_summaries;
mod manage_promo_code;
mod redeem_promo_code;
mod trigger_payout;

pub use create_promo_code::{CreatePromoCodeCommand, CreatePromoCodeHandler};
pub use list_partner_summaries::{ListPartnerSummariesHandler, PartnerSummary};
pub use manage_promo_code::{DeletePromoCodeHandler, SetPromoCodeActiveHandler};
pub use redeem_promo_code::{
    RedeemPromoCodeCommand, RedeemPromoCodeHandler, ValidatePromoCodeHandler,
};
pub use trigger_payout::{PayoutReceipt, TriggerPayoutCommand, TriggerPayoutHandler};
