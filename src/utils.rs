//! 浏览器侧的杂项工具：panic 钩子与控制台日志。

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    // panic 信息会输出到浏览器控制台。
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

#[cfg(target_arch = "wasm32")]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(target_arch = "wasm32")]
pub fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

// 非 wasm 目标（原生单元测试）没有 JS 控制台。
#[cfg(not(target_arch = "wasm32"))]
pub fn log(_message: &str) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(_message: &str) {}

#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::utils::log(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        $crate::utils::warn(&format!($($arg)*))
    };
}
