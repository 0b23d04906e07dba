mod dispatch;
pub use dispatch::{endpoint, DeliveryClient, Dispatcher, UPDATE_PATH};

mod http;
pub use http::HTTP;

mod transport;
pub use transport::Transport;
