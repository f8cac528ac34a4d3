/// Crate-local logging macros forwarding to the `log` crate. There is no `warn`, it
/// would clash with the built-in attribute; call `log::warn!` directly.
macro_rules! make_log_macro (
    (($d:tt) $level:ident) => (
        #[allow(unused)]
        macro_rules! $level(
            ( $d($x:expr),* ) => (
                log::$level!($d($x),*)
            )
        );
        #[allow(unused_imports)]
        pub(crate) use $level;
    );
    ($($t:tt)+) => (
        make_log_macro!(($) $($t)+);
    );
);

make_log_macro!(error);
make_log_macro!(info);
make_log_macro!(debug);
make_log_macro!(trace);
