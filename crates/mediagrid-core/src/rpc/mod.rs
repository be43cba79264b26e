//! TCP JSON-RPC plumbing: framing, client, server, and the concrete
//! transport implementation of the messaging capability.

mod client;
mod protocol;
mod server;
mod tcp;

pub use client::RpcClient;
pub use protocol::{methods, read_frame, write_frame, RpcError, RpcRequest, RpcResponse};
pub use server::{RpcDispatch, RpcServer, RpcServerHandle};
pub use tcp::TcpTransport;
