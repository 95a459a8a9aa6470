/// Parses a CSS selector once and hands out a `&'static Selector`.
///
/// The calling crate must depend on `once_cell` and `scraper`.
#[macro_export]
macro_rules! selector {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::scraper::Selector;
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($e).unwrap());
        &*SELECTOR
    }};
}

/// Compiles a regex once and hands out a `&'static Regex`.
///
/// The calling crate must depend on `once_cell` and `regex`.
#[macro_export]
macro_rules! regex {
    ($e: expr) => {{
        use ::once_cell::sync::Lazy;
        use ::regex::Regex;
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new($e).unwrap());
        &*PATTERN
    }};
}
