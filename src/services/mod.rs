mod housekeeper;
mod navigation;

pub use housekeeper::{Housekeeper, MAX_FEED_RETENTION_DAYS};
pub use navigation::NavigationStateController;
