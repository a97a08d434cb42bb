use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use el_listen::exec::{CommandOutput, Runnable};

/// A scripted command:
/// - returns the next output from its script on each execution
/// - repeats the last scripted output once the script is exhausted
/// - counts how often it was executed.
pub struct FakeCommand {
    label: String,
    script: Vec<CommandOutput>,
    calls: Arc<AtomicUsize>,
}

impl FakeCommand {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            script: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A command that succeeds with each of `outputs` in turn.
    pub fn outputs<I, S>(label: &str, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        outputs
            .into_iter()
            .fold(Self::new(label), |cmd, out| cmd.then(out))
    }

    pub fn then(mut self, stdout: impl Into<String>) -> Self {
        self.script.push(CommandOutput::success(stdout));
        self
    }

    pub fn then_fail(mut self, exit_code: i32) -> Self {
        self.script.push(CommandOutput::failed(Some(exit_code)));
        self
    }

    /// Shared execution counter, readable after the command is boxed.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn boxed(self) -> Box<dyn Runnable> {
        Box::new(self)
    }
}

impl Runnable for FakeCommand {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn execute(&self) -> Pin<Box<dyn Future<Output = CommandOutput> + Send + '_>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let output = self
            .script
            .get(n)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| CommandOutput::failed(None));

        Box::pin(async move { output })
    }
}
