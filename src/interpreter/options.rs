/// Native stack reserved per nested call. One call is several evaluator
/// frames, and unoptimized builds make each of them large.
const STACK_PER_CALL: usize = 128 * 1024;
const BASE_STACK: usize = 2 * 1024 * 1024;

/// Knobs for one interpreter instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterOptions {
    /// Check arguments and results of every typed function, not only `#validate` ones.
    pub strict: bool,
    /// Sleep for real when `await` advances the virtual clock.
    pub real_time: bool,
    /// Nested user calls allowed before `StackOverflow`.
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            strict: false,
            real_time: false,
            max_call_depth: 256,
        }
    }
}

impl InterpreterOptions {
    pub fn strict() -> Self {
        InterpreterOptions {
            strict: true,
            ..Default::default()
        }
    }

    /// Stack size for a thread that evaluates with these options.
    pub fn stack_size(&self) -> usize {
        self.max_call_depth
            .saturating_mul(STACK_PER_CALL)
            .saturating_add(BASE_STACK)
    }
}
