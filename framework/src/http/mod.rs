mod body;
mod context;
mod response;

pub use body::{collect_body, parse_form, parse_json};
pub use context::Context;
pub use response::HttpResponse;
