pub mod binder;
pub mod config;
pub mod errors;
pub mod models;
pub mod page;
pub mod state;
pub mod storage;
pub mod transport;

pub use binder::{BoundPage, ClickHandlerBinder, ClickOutcome, Handler, InFlight};
pub use config::BinderConfig;
pub use errors::BinderError;
pub use page::{Element, Page};
pub use state::SharedPage;
pub use storage::{load_page, persist_page, resolve_page_path};
pub use transport::{HttpTransport, OutboundRequest, Transport};
