pub mod http;

mod listener;
pub(crate) use listener::Listener;
