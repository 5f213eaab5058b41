// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) wires these modules together into the interactive client.
//
// Module responsibilities:
// - `api`: HTTP bindings for the inventory service, one method per
//   endpoint, plus the in-memory session token.
// - `error`: typed errors for everything that talks HTTP.
// - `config`: defaults, config file, environment and flag layering.
// - `render`: table and JSON rendering of responses.
// - `ui`: the two-state menu loop and the `Prompt` input seam.
// - `output` / `logging`: terminal messages and tracing setup.
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod render;
pub mod ui;

pub use api::{ApiClient, NewProduct, Product};
pub use error::{ApiError, ApiResult};
