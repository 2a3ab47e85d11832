//! Test doubles for code using this crate.
use crate::{
    command::ZfsCommand,
    error::Result,
    executor::{BoxedExecutor, Executor, Output},
};
use std::{
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

type Handler = Box<dyn Fn(&ZfsCommand) -> Output + Send + Sync>;

/// An executor which records commands instead of running them, and answers
/// with a configurable handler.
///
/// By default every command succeeds with empty output.
pub struct FakeExecutor {
    handler: Mutex<Handler>,
    calls: Mutex<Vec<(String, ZfsCommand)>>,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self {
            handler: Mutex::new(Box::new(|_| Output::success())),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the function answering commands.
    pub fn set_handler<F>(&self, f: F)
    where
        F: Fn(&ZfsCommand) -> Output + Send + Sync + 'static,
    {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Box::new(f);
    }

    /// Perform some type coercion to get the commonly used trait object.
    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }

    /// Every command executed so far, in order.
    pub fn commands(&self) -> Vec<ZfsCommand> {
        self.lock_calls().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Argument vectors of every command executed so far.
    pub fn args(&self) -> Vec<Vec<String>> {
        self.lock_calls().iter().map(|(_, c)| c.args()).collect()
    }

    /// Programs executed so far.
    pub fn programs(&self) -> Vec<String> {
        self.lock_calls().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Number of commands executed so far.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<(String, ZfsCommand)>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Executor for FakeExecutor {
    fn execute(&self, program: &Path, command: &ZfsCommand) -> Result<Output> {
        log::debug!("fake executing {} {}", program.display(), command.args().join(" "));
        self.lock_calls()
            .push((program.display().to_string(), command.clone()));
        let handler = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(handler(command))
    }
}
