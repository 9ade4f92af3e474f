pub mod error;
pub mod extract;
pub mod pagination;
pub mod result;
pub mod session;

pub use error::{Result, ScanError};
pub use pagination::{PaginationConfig, PaginationOutcome, load_all_listings};
pub use result::Listing;
pub use session::{ChromeSession, HttpSession, PageSession};
