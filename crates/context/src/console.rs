//! A console: six leveled method slots whose implementations can be
//! swapped at runtime.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use framerelay_protocol::Level;
use framerelay_value::{Thrown, Value};

/// Implementation of one console method.
pub type ConsoleMethod = Arc<dyn Fn(&[Value]) -> Result<(), Thrown> + Send + Sync>;

fn slot(level: Level) -> usize {
    match level {
        Level::Log => 0,
        Level::Info => 1,
        Level::Warn => 2,
        Level::Error => 3,
        Level::Debug => 4,
        Level::Trace => 5,
    }
}

/// Method table of a console. A slot may be empty.
///
/// Methods are compared by identity (`Arc::ptr_eq`), so a caller that
/// captured a method can tell whether it is still installed.
#[derive(Default)]
pub struct ConsoleTable {
    methods: Mutex<[Option<ConsoleMethod>; 6]>,
}

impl ConsoleTable {
    /// A console with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// A console whose methods emit `tracing` events at the matching level.
    ///
    /// `log` maps to `info`. Arguments are joined by spaces in their text form.
    pub fn with_tracing() -> Self {
        let table = Self::new();
        for level in Level::ALL {
            table.set(
                level,
                Arc::new(move |args: &[Value]| -> Result<(), Thrown> {
                    let text = args
                        .iter()
                        .map(Value::to_display_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    match level {
                        Level::Log | Level::Info => {
                            tracing::info!(target: "framerelay::console", console = %level, "{text}")
                        }
                        Level::Warn => tracing::warn!(target: "framerelay::console", "{text}"),
                        Level::Error => tracing::error!(target: "framerelay::console", "{text}"),
                        Level::Debug => tracing::debug!(target: "framerelay::console", "{text}"),
                        Level::Trace => tracing::trace!(target: "framerelay::console", "{text}"),
                    }
                    Ok(())
                }),
            );
        }
        table
    }

    /// Currently installed method for `level`.
    pub fn get(&self, level: Level) -> Option<ConsoleMethod> {
        self.methods()[slot(level)].clone()
    }

    /// Installs `method`, returning the one it replaced.
    pub fn set(&self, level: Level, method: ConsoleMethod) -> Option<ConsoleMethod> {
        self.methods()[slot(level)].replace(method)
    }

    /// Empties the slot, returning its method.
    pub fn remove(&self, level: Level) -> Option<ConsoleMethod> {
        self.methods()[slot(level)].take()
    }

    /// Slots are always left consistent, so a poisoned lock is still usable.
    fn methods(&self) -> MutexGuard<'_, [Option<ConsoleMethod>; 6]> {
        self.methods.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls the method for `level`. An empty slot throws a `TypeError`.
    ///
    /// The table is not locked while the method runs, so methods may
    /// themselves read or replace slots.
    pub fn call(&self, level: Level, args: &[Value]) -> Result<(), Thrown> {
        match self.get(level) {
            Some(method) => method(args),
            None => Err(Thrown::error(
                "TypeError",
                format!("console.{level} is not a function"),
            )),
        }
    }
}

impl fmt::Debug for ConsoleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed: Vec<Level> = Level::ALL
            .into_iter()
            .filter(|l| self.get(*l).is_some())
            .collect();
        f.debug_struct("ConsoleTable")
            .field("installed", &installed)
            .finish()
    }
}

/// One recorded console call.
#[derive(Debug, Clone)]
pub struct ConsoleCall {
    pub level: Level,
    pub args: Vec<Value>,
}

impl ConsoleCall {
    /// Arguments in their text form.
    pub fn texts(&self) -> Vec<String> {
        self.args.iter().map(Value::to_display_string).collect()
    }
}

/// Console methods that record every call, for observing what reached a
/// console.
#[derive(Debug, Clone, Default)]
pub struct ConsoleRecorder {
    calls: Arc<Mutex<Vec<ConsoleCall>>>,
}

impl ConsoleRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recording method for `level`.
    pub fn method(&self, level: Level) -> ConsoleMethod {
        let calls = Arc::clone(&self.calls);
        Arc::new(move |args: &[Value]| -> Result<(), Thrown> {
            if let Ok(mut calls) = calls.lock() {
                calls.push(ConsoleCall {
                    level,
                    args: args.to_vec(),
                });
            }
            Ok(())
        })
    }

    /// Installs a recording method in every slot of `table`.
    pub fn install(&self, table: &ConsoleTable) {
        for level in Level::ALL {
            table.set(level, self.method(level));
        }
    }

    pub fn calls(&self) -> Vec<ConsoleCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_at(&self, level: Level) -> Vec<ConsoleCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.level == level)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}
