pub mod discovery;
pub mod html;
pub mod session;
