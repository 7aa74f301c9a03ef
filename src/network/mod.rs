//! Network layer: the gRPC server exposing the watch service.
pub mod grpc;

pub use grpc::*;
