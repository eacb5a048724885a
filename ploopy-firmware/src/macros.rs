#[allow(unused)]
#[cfg(all(not(test), not(feature = "defmt")))]
mod no_defmt {
    #[macro_export]
    macro_rules! debug {
        ($($arg:expr),*) => {{let _ = ($($arg),*);}};
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:expr),*) => {{let _ = ($($arg),*);}};
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:expr),*) => {{let _ = ($($arg),*);}};
    }

    #[macro_export]
    macro_rules! error {
        ($($arg:expr),*) => {{let _ = ($($arg),*);}};
    }
}

#[cfg(all(not(test), feature = "defmt"))]
mod defmt {
    /// Log debug messages. It will call the [defmt::debug] macro.
    ///
    /// Works with either defmt or nothing. Under `cfg(test)` the message goes to `eprintln!`, so
    /// only the `{}` / `{:?}` placeholders common to both can be used; not the
    /// [defmt::Formatter] syntax.
    #[macro_export]
    macro_rules! debug {
        ($($arg:expr),*) => {
            defmt::debug!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:expr),*) => {
            defmt::info!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:expr),*) => {
            defmt::warn!($($arg,)*)
        };
    }

    #[macro_export]
    macro_rules! error {
        ($($arg:expr),*) => {
            defmt::error!($($arg,)*)
        };
    }
}
