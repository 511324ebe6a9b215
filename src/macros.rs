/// Compile a regex once and hand out a `&'static Regex`.
///
/// Patterns are literals checked by the tests, so a bad pattern fails the
/// first scan that reaches it.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("invalid built-in pattern"));
        &*RE
    }};
}
