pub mod context;
pub mod direct_data;
pub mod dispatcher;
pub mod errors;
pub mod liveness;
pub mod local_network;
pub mod peer;
pub mod ping;
pub mod reply_handler;
pub mod request_handler;
pub mod transport;

pub use context::NodeContext;
pub use direct_data::{DataReply, DirectDataRpc, ObjectDataReply, RawDataReply};
pub use dispatcher::Dispatcher;
pub use errors::{HandlerError, ReplyError, TransportError};
pub use liveness::{PeerMap, PeerStatistic, PeerStatusListener};
pub use local_network::LocalNetwork;
pub use peer::Peer;
pub use ping::PingRpc;
pub use reply_handler::ReplyHandler;
pub use request_handler::{RequestHandler, SendOptions};
pub use transport::{ResponseListener, Transport};
