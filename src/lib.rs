pub mod calc;
pub mod draw;
pub mod gui;
pub mod logging;
pub mod session;
pub mod settings;
pub mod toast_log;
pub mod typeset;
