#![allow(unused_macros, dead_code)]
macro_rules! verbose_println {
    ($($p:expr),+) => {
        if (config::ARGS.verbose) {
            println!($($p),+);
        }
    }
}
macro_rules! info {
    ($($p:expr),+) => {
        println!(concat!(blue!("INFO"),": {}"),format_args!($($p),+))
    }
}

macro_rules! warn {
    ($($p:expr),+) => {
        println!(concat!(red!("WARNING"),": {}"),format_args!($($p),+))
    }
}
macro_rules! line_err {
    ($line:expr, $kind:expr, $msg:expr) => {
        Error::new($kind, format!("line {}: {}", $line, $msg).as_str())
    };
}
macro_rules! general_err {
    ($msg:expr) => {
        Error::new(crate::ErrorKind::Unexpected, format!("{}", $msg).as_str())
    };
}
macro_rules! format_err {
    ($($msg:expr),+) => {
        Error::new(
            crate::ErrorKind::InvalidFormat,
            format!("{} {}", red!("Format Error"), format!($($msg),+)).as_str(),
        )
    };
}
macro_rules! memory_full_err {
    ($($msg:expr),+) => {
        Error::new(
            crate::ErrorKind::MemoryFull,
            format!("{} {}", red!("Memory Full"), format!($($msg),+)).as_str(),
        )
    };
}
macro_rules! color {
    ($color: literal, $msg: expr) => {
        concat!("\x1b[", $color, "m", $msg, "\x1b[0m")
    };
}
macro_rules! red {
    ($msg:expr) => {
        color!(91, $msg)
    };
}
macro_rules! blue {
    ($msg:expr) => {
        color!(94, $msg)
    };
}
