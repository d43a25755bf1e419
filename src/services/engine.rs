use crate::domain::models::{ContainerEngine, ImageRef, InstallContext};
use crate::services::exec::{CommandOutput, CommandRunner, CommandSpec};
use std::path::Path;

/// The selected container engine bound to a command runner.
pub struct Engine<'a> {
    pub kind: ContainerEngine,
    runner: &'a dyn CommandRunner,
}

impl<'a> Engine<'a> {
    pub fn new(kind: ContainerEngine, runner: &'a dyn CommandRunner) -> Self {
        Self { kind, runner }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::from_invocation(self.kind.invocation())
    }

    pub fn load(&self, archive: &Path) -> anyhow::Result<CommandOutput> {
        self.runner.run(
            &self
                .command()
                .args(["load", "-i"])
                .arg(archive.display().to_string()),
        )
    }

    pub fn tag(&self, source: &ImageRef, dest: &ImageRef) -> anyhow::Result<CommandOutput> {
        self.runner
            .run(&self.command().arg("tag").arg(source.to_string()).arg(dest.to_string()))
    }

    pub fn push(&self, image: &ImageRef) -> anyhow::Result<CommandOutput> {
        self.runner.run(&self.command().arg("push").arg(image.to_string()))
    }

    /// Password goes through stdin, never argv.
    pub fn login(&self, server: &str, username: &str, password: &str) -> anyhow::Result<CommandOutput> {
        self.runner.run(
            &self
                .command()
                .args(["login", "--username", username, "--password-stdin", server])
                .stdin(password),
        )
    }

    /// Locally loaded images, without dangling `<none>` entries.
    pub fn list_images(&self) -> anyhow::Result<Vec<ImageRef>> {
        let out = self.runner.run_checked(
            &self
                .command()
                .args(["images", "--format", "{{.Repository}}:{{.Tag}}"]),
        )?;
        let mut images: Vec<ImageRef> = out.stdout.lines().filter_map(ImageRef::parse).collect();
        images.dedup();
        Ok(images)
    }
}

/// Engine recorded by `select_container_engine`, or the default when that
/// module did not run in this invocation.
pub fn resolve_engine<'a>(ctx: &InstallContext, runner: &'a dyn CommandRunner) -> Engine<'a> {
    let kind = ctx.engine().unwrap_or_else(|| {
        let fallback = ContainerEngine::default();
        tracing::info!(engine = %fallback, "no container engine selected, using default");
        fallback
    });
    Engine::new(kind, runner)
}
