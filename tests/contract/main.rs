//! Contract tests: the full login-to-profile flow against a mock Bungie.net.

mod login_flow;
mod pipeline;
mod routes;
