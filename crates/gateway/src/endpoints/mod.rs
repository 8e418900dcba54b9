//! # Gatewayエンドポイント

pub mod asset;
pub mod not_found;
pub mod publish;

pub use asset::handle_asset;
pub use not_found::handle_not_found;
pub use publish::handle_publish;
