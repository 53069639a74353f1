mod decorators;
mod handler;

pub use decorators::{MissingTapeDiagnostics, MissingTapeReport, TapeTracking};
pub use handler::{HandlerOptions, RequestHandler};
