// Connection registry and broadcast hub

mod broadcast;
mod connection;
mod metrics;
pub mod protocol;
mod registry;

pub use broadcast::{DeliveryReport, Hub};
pub use connection::{
    Connection, ConnectionId, DeliveryError, OutboundReceiver, OutboundSender,
};
pub use metrics::{HubMetrics, HubStats};
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::ConnectionRegistry;
