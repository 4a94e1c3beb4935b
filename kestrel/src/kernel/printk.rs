//! Kernel console output, routed through the port console.

use core::fmt;

struct KhalConsole;

impl fmt::Write for KhalConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        crate::kernel::khal::console_write(s);
        Ok(())
    }
}

#[doc(hidden)]
pub fn write_fmt(args: fmt::Arguments<'_>) {
    let _ = fmt::Write::write_fmt(&mut KhalConsole, args);
}

#[macro_export]
macro_rules! printk {
    ($($arg:tt)*) => {
        $crate::kernel::printk::write_fmt(::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! printkln {
    () => {
        $crate::printk!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kernel::printk::write_fmt(::core::format_args!($($arg)*));
        $crate::printk!("\n");
    }};
}
