mod relay;
mod web;

pub use relay::start_relay_server;
pub use web::start_web_server;
