mod response;
mod server;
mod tracing;

pub use response::{error_response, error_status, BufferedResponse, ResponseSink};
pub use server::{GatewayConfig, GatewayServer, HealthResponse};
pub use self::tracing::{tracing_middleware, TracingState, REQUEST_ID_HEADER};
