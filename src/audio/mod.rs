pub mod adsr;
pub mod driver;
pub mod player;
pub mod voice;

pub use driver::{Driver, Sessions};
pub use player::{AudioPlayer, AudioPlayerHandle};
