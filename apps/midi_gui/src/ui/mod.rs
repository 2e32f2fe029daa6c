//! UI 模块

pub mod connection;
pub mod deck;
pub mod manager;
pub mod sidebar;
pub mod theme;

pub use connection::ConnectionBar;
pub use deck::PlayerDeck;
pub use manager::ManageWindow;
pub use sidebar::LibrarySidebar;
pub use theme::MidiTheme;
