mod avatar;
mod preferences;

pub use avatar::AvatarProfile;
pub use preferences::{Preferences, Theme};
