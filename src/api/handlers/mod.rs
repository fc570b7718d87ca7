pub mod accounts;
pub mod cashbox;
pub mod periods;
pub mod postings;
pub mod transactions;
pub mod travelers;

use serde::Deserialize;

use daftar_domain::DisplayOrder;

/// `?order=newest_first|oldest_first`, newest first when absent.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub order: DisplayOrder,
}
