use std::cell::Cell;

/// Evaluator settings. Each thread evaluates with its own copy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// Loop on tail positions instead of recursing
    pub tail_calls: bool,
    /// Deepest nesting of non-tail evaluations before giving up
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            tail_calls: true,
            max_depth: 1000,
        }
    }
}

thread_local! {
    static CURRENT: Cell<Config> = Cell::new(Config::default());
}

impl Config {
    /// Makes this the configuration used by `evaluate` on the current thread
    pub fn install(self) {
        debug!("installing {:?}", self);
        CURRENT.with(|c| c.set(self));
    }

    pub fn current() -> Config {
        CURRENT.with(|c| c.get())
    }
}
