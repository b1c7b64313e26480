/// JSON-RPC 2.0 bridge between the engine and the embedding frontend.
pub mod web_rpc;
