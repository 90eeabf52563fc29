//! Banks (ASPSPs) as returned by the upstream listing.

pub mod directory;
pub mod logo;
pub mod model;

pub use directory::{attach_logo_links, filter_banks};
pub use logo::{DEFAULT_LOGO_URL, LogoTable};
pub use model::Bank;
