// Infrastructure adapters implementing app ports
pub mod chromium_session;
