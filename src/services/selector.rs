use crate::domain::errors::InstallError;
use crate::domain::models::{ContainerEngine, InstallContext};
use crate::services::exec::CommandSpec;
use crate::services::prompt::choose_or_first;
use crate::services::toolbox::Toolbox;

pub fn select_container_engine(
    ctx: &InstallContext,
    tools: &Toolbox,
) -> anyhow::Result<ContainerEngine> {
    let labels: Vec<&str> = ContainerEngine::ALL.iter().map(|e| e.label()).collect();
    let index = choose_or_first(tools.prompter, "Select container engine:", &labels)?;
    let engine = ContainerEngine::ALL[index];

    if engine.needs_socket_access() {
        open_docker_socket(tools)?;
    }

    if !ctx.set_engine(engine) {
        tracing::warn!(
            kept = ?ctx.engine(),
            "container engine already selected for this run"
        );
    }
    tracing::info!(engine = %engine, "container engine selected");
    Ok(engine)
}

fn open_docker_socket(tools: &Toolbox) -> anyhow::Result<()> {
    let socket = &tools.config.docker_socket;
    let cmd = CommandSpec::new("sudo").args(["chmod", "666", socket.as_str()]);
    let out = tools.runner.run(&cmd)?;
    if !out.success {
        return Err(InstallError::SocketPermission {
            path: socket.clone(),
            reason: out.reason(),
        }
        .into());
    }
    tracing::info!(socket = %socket, "docker socket opened for the current user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::InstallerConfig;
    use crate::services::testing::{
        failed, toolbox, FakeArchiver, FakeDownloader, FakeRunner, ScriptedPrompter,
    };

    fn select(answer: &str, runner: &FakeRunner) -> (InstallContext, anyhow::Result<ContainerEngine>) {
        let ctx = InstallContext::new("1.0", "/tmp");
        let config = InstallerConfig::default();
        let (dl, archiver, prompter) = (
            FakeDownloader::new(),
            FakeArchiver::new(),
            ScriptedPrompter::new(&[answer]),
        );
        let tools = toolbox(runner, &dl, &archiver, &prompter, &config);
        let result = select_container_engine(&ctx, &tools);
        (ctx, result)
    }

    #[test]
    fn podman_needs_no_socket_change() {
        let runner = FakeRunner::new();
        let (ctx, engine) = select("2", &runner);
        assert_eq!(engine.unwrap(), ContainerEngine::Podman);
        assert_eq!(ctx.engine(), Some(ContainerEngine::Podman));
        assert!(runner.lines().is_empty());
    }

    #[test]
    fn unrecognized_answer_means_docker_with_socket_change() {
        let runner = FakeRunner::new();
        let (ctx, engine) = select("containerd", &runner);
        assert_eq!(engine.unwrap(), ContainerEngine::Docker);
        assert_eq!(ctx.engine(), Some(ContainerEngine::Docker));
        assert_eq!(runner.lines(), vec!["sudo chmod 666 /var/run/docker.sock"]);
    }

    #[test]
    fn socket_permission_failure_is_fatal() {
        let runner = FakeRunner::new().on("sudo chmod", failed("operation not permitted"));
        let (ctx, result) = select("1", &runner);
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::SocketPermission { .. })
        ));
        assert_eq!(ctx.engine(), None);
    }
}
