//! In-process fakes for the injected capabilities.

use crate::domain::models::InstallerConfig;
use crate::services::archive::Archiver;
use crate::services::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::services::fetcher::Downloader;
use crate::services::prompt::Prompter;
use crate::services::toolbox::Toolbox;
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

pub fn toolbox<'a>(
    runner: &'a dyn CommandRunner,
    downloader: &'a dyn Downloader,
    archiver: &'a dyn Archiver,
    prompter: &'a dyn Prompter,
    config: &'a InstallerConfig,
) -> Toolbox<'a> {
    Toolbox {
        runner,
        downloader,
        archiver,
        prompter,
        config,
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        success: true,
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(stderr: &str) -> CommandOutput {
    CommandOutput {
        success: false,
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Records every command. Responses are picked by the first rule whose
/// pattern is a prefix of the rendered command line; unmatched commands
/// succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(String, CommandOutput)>,
    unstartable: Vec<String>,
    present: HashSet<String>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, prefix: &str, output: CommandOutput) -> Self {
        self.rules.push((prefix.to_string(), output));
        self
    }

    /// Commands matching `prefix` fail to start, like a missing binary.
    pub fn unstartable(mut self, prefix: &str) -> Self {
        self.unstartable.push(prefix.to_string());
        self
    }

    pub fn with_tools(mut self, tools: &[&str]) -> Self {
        self.present.extend(tools.iter().map(|t| t.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.to_string()).collect()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &CommandSpec) -> anyhow::Result<CommandOutput> {
        self.calls.borrow_mut().push(cmd.clone());
        let line = cmd.to_string();
        if self.unstartable.iter().any(|p| line.starts_with(p.as_str())) {
            anyhow::bail!("cannot start `{}`: No such file or directory", cmd.program);
        }
        Ok(self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_else(|| ok("")))
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.present
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}

/// Writes a small payload to the destination instead of fetching.
#[derive(Default)]
pub struct FakeDownloader {
    pub fail: bool,
    calls: RefCell<Vec<(String, PathBuf)>>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.borrow().clone()
    }
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        self.calls
            .borrow_mut()
            .push((url.to_string(), dest.to_path_buf()));
        if self.fail {
            anyhow::bail!("connection refused");
        }
        std::fs::write(dest, b"bundle")?;
        Ok(6)
    }
}

#[derive(Default)]
pub struct FakeArchiver {
    unpacked: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl FakeArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unpacked(&self) -> Vec<(PathBuf, PathBuf)> {
        self.unpacked.borrow().clone()
    }
}

impl Archiver for FakeArchiver {
    fn unpack(&self, archive: &Path, dest: &Path) -> anyhow::Result<()> {
        self.unpacked
            .borrow_mut()
            .push((archive.to_path_buf(), dest.to_path_buf()));
        std::fs::create_dir_all(dest)?;
        Ok(())
    }

    fn decompress_zstd(&self, _src: &Path, dest: &Path) -> anyhow::Result<()> {
        std::fs::write(dest, b"")?;
        Ok(())
    }
}

/// Answers questions from a fixed script, in order.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    questions: RefCell<Vec<String>>,
    said: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }

    pub fn said(&self) -> Vec<String> {
        self.said.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> anyhow::Result<String> {
        self.questions.borrow_mut().push(question.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted answer for: {}", question))
    }

    fn say(&self, line: &str) {
        self.said.borrow_mut().push(line.to_string());
    }
}
