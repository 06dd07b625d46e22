//! Scripted [`CommandRunner`] for tests.
//!
//! Responses are matched by substring against the rendered command line;
//! the first matching rule wins. Unmatched commands succeed with empty output.

use async_trait::async_trait;
use std::sync::Mutex;

use demogrip::process::{CommandOutput, CommandRunner, CommandSpec, DemoProcess, ProcessError};

/// Pid reported for every spawned demo
pub const MOCK_PID: u32 = 4242;

/// How a command was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Run,
    Output,
    Spawn,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub mode: CallMode,
    pub spec: CommandSpec,
}

impl RecordedCall {
    pub fn line(&self) -> String {
        self.spec.to_string()
    }
}

#[derive(Default)]
pub struct MockRunner {
    responses: Mutex<Vec<(String, CommandOutput)>>,
    missing: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to any command whose line contains `pattern`
    pub fn respond(self, pattern: &str, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), output));
        self
    }

    /// Make `program` fail to start as if it were not installed
    pub fn missing(self, program: &str) -> Self {
        self.missing.lock().unwrap().push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose rendered line contains `pattern`
    pub fn calls_matching(&self, pattern: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.line().contains(pattern))
            .collect()
    }

    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.mode == CallMode::Spawn)
            .map(|c| c.spec)
            .collect()
    }

    fn record(&self, mode: CallMode, spec: &CommandSpec) -> Result<(), ProcessError> {
        self.calls.lock().unwrap().push(RecordedCall {
            mode,
            spec: spec.clone(),
        });
        if self.missing.lock().unwrap().contains(&spec.program) {
            return Err(ProcessError::NotFound(spec.program.clone()));
        }
        Ok(())
    }

    fn response_for(&self, spec: &CommandSpec) -> CommandOutput {
        let line = spec.to_string();
        self.responses
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""))
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.record(CallMode::Run, spec)?;
        let mut output = self.response_for(spec);
        output.stdout.clear();
        output.stderr.clear();
        Ok(output)
    }

    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
        self.record(CallMode::Output, spec)?;
        Ok(self.response_for(spec))
    }

    async fn spawn(&self, spec: &CommandSpec) -> Result<DemoProcess, ProcessError> {
        self.record(CallMode::Spawn, spec)?;
        Ok(DemoProcess::detached(spec.clone(), Some(MOCK_PID)))
    }
}
