mod engine;
mod router;

pub use engine::{BoxedHandler, Engine, Route};
pub use router::{HandlerResult, RouteBuilder, Router};
