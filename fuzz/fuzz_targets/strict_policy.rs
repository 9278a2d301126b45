#![no_main]
use latexify_core::document;
use latexify_core::ExpressionPolicy;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|expression: &str| {
    if ExpressionPolicy::Strict.check(expression).is_ok() {
        // Accepted input never opens or closes math mode itself.
        assert_eq!(document::render(expression).matches('$').count(), 2);
    }
});
