pub mod gateway;
pub mod intercept;
pub mod proxy;

pub use gateway::{BufferedResponse, GatewayConfig, GatewayServer, ResponseSink};
pub use intercept::{HandlerOptions, RequestHandler};
pub use proxy::{Proxy, Recorder, TapeProxy};
