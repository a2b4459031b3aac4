//! Test support utilities for hubdev-core
//!
//! Provides MockRunner for exercising the lifecycle, poller and pipeline
//! without a container runtime or build tool.

use async_trait::async_trait;
use hubdev_provider::{command_line, CommandOptions, CommandRunner, ProviderError, Result};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

/// Scripted result for a command
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    /// Exit 0 with this stdout
    Output(String),
    /// Exit with this non-zero code
    Fail(i32),
}

/// Configurable mock command runner.
///
/// Responses are registered per command-line prefix and consumed in order;
/// the last response for a prefix repeats forever. When several prefixes
/// match, the longest wins. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct MockRunner {
    calls: Mutex<Vec<(String, Option<PathBuf>)>>,
    responses: Mutex<Vec<(String, VecDeque<MockResponse>)>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for commands starting with `prefix`
    pub fn respond(&self, prefix: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        match responses.iter_mut().find(|(p, _)| p == prefix) {
            Some((_, queue)) => queue.push_back(response),
            None => responses.push((prefix.to_string(), VecDeque::from([response]))),
        }
    }

    /// Every command line run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
    }

    /// Working directory of every call, in order
    pub fn cwds(&self) -> Vec<Option<PathBuf>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, cwd)| cwd.clone())
            .collect()
    }

    /// Number of calls whose command line starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(line, _)| line.starts_with(prefix))
            .count()
    }

    fn next_response(&self, line: &str) -> Option<MockResponse> {
        let mut responses = self.responses.lock().unwrap();
        let (_, queue) = responses
            .iter_mut()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())?;

        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &str, options: &CommandOptions) -> Result<String> {
        let line = command_line(command, &options.args);
        self.calls
            .lock()
            .unwrap()
            .push((line.clone(), options.cwd.clone()));

        match self.next_response(&line) {
            Some(MockResponse::Output(output)) => Ok(output),
            Some(MockResponse::Fail(code)) => Err(ProviderError::CommandFailed {
                command: line,
                code: Some(code),
            }),
            None => Ok(String::new()),
        }
    }
}

/// `docker ps` output line for a container
pub fn ps_line(id: &str, name: &str, status_text: &str) -> String {
    format!("{}\t{}\t{}\n", id, name, status_text)
}
