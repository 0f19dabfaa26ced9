//! Service layer: session store, authenticated gateway, push registration.

mod gateway;
mod observer;
mod push;
mod session;

pub use gateway::{ApiGateway, RequestOptions};
pub use observer::{MockObserver, SessionObserver};
pub use push::register_device_token;
pub use session::{keys, LoginSession, SessionSnapshot, SessionStore};
