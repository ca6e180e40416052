//! Durable storage of the anchor set, one file per mapped area.

mod gateway;

pub use gateway::{AnchorGateway, GatewayError};
