use crate::domain::errors::InstallError;
use crate::domain::models::{
    ImageRef, InstallContext, IsolationPolicy, PushReport, RegistryKind, RegistryTarget,
};
use crate::services::engine::{resolve_engine, Engine};
use crate::services::prompt::choose_or_first;
use crate::services::registry;
use crate::services::toolbox::Toolbox;

/// Source image and where it goes.
pub type PushPlan = Vec<(ImageRef, ImageRef)>;

/// Splits local images into the push plan and the images the target's
/// exclusion predicate filters out.
pub fn plan_pushes(target: &RegistryTarget, images: &[ImageRef]) -> (PushPlan, Vec<ImageRef>) {
    let mut plan = Vec::new();
    let mut skipped = Vec::new();
    for image in images {
        if target.excludes(image) {
            skipped.push(image.clone());
        } else {
            plan.push((image.clone(), target.destination(image)));
        }
    }
    (plan, skipped)
}

fn push_one(engine: &Engine, source: &ImageRef, dest: &ImageRef) -> Result<(), String> {
    let tagged = engine.tag(source, dest).map_err(|e| format!("tag: {}", e))?;
    if !tagged.success {
        return Err(format!("tag: {}", tagged.reason()));
    }
    let pushed = engine.push(dest).map_err(|e| format!("push: {}", e))?;
    if !pushed.success {
        return Err(format!("push: {}", pushed.reason()));
    }
    Ok(())
}

/// One retag/push loop for every backend. `PerImage` logs a failure and
/// moves on; `AbortBatch` returns the first failure. A command that cannot
/// be started counts as a failure of that image.
pub fn push_all(engine: &Engine, plan: &PushPlan, isolation: IsolationPolicy) -> anyhow::Result<PushReport> {
    let mut report = PushReport::default();
    for (source, dest) in plan {
        match push_one(engine, source, dest) {
            Ok(()) => {
                tracing::info!(image = %dest, "pushed");
                report.pushed.push(dest.clone());
            }
            Err(reason) => match isolation {
                IsolationPolicy::PerImage => {
                    tracing::error!(image = %source, reason = %reason, "push failed, skipping image");
                    report.failed.push(source.clone());
                }
                IsolationPolicy::AbortBatch => {
                    return Err(InstallError::Push {
                        image: source.to_string(),
                        reason,
                    }
                    .into());
                }
            },
        }
    }
    Ok(report)
}

/// Choose a backend, authenticate, enumerate, provision (ECR only) and push.
/// The chosen backend is recorded on the context for `configure_values`.
pub fn publish(ctx: &InstallContext, tools: &Toolbox) -> anyhow::Result<PushReport> {
    let labels: Vec<&str> = RegistryKind::ALL.iter().map(|k| k.label()).collect();
    let kind = RegistryKind::ALL[choose_or_first(tools.prompter, "Select registry backend:", &labels)?];
    if !ctx.record_environment(kind) {
        tracing::warn!(kept = ?ctx.environment(), "environment already recorded for this run");
    }
    tracing::info!(backend = %kind, "publishing images");

    let engine = resolve_engine(ctx, tools.runner);
    let mut ecr_region = None;
    let target = match kind {
        RegistryKind::Generic => {
            let inputs = registry::collect_generic(tools)?;
            let base = registry::login_generic(&engine, &inputs)?;
            RegistryTarget::new(kind, &base, &registry::collect_prefix(tools)?)
        }
        RegistryKind::AwsEcr => {
            let inputs = registry::collect_ecr(tools)?;
            let base = registry::login_ecr(&engine, tools, &inputs)?;
            ecr_region = Some(inputs.region);
            RegistryTarget::new(kind, &base, &registry::collect_prefix(tools)?)
        }
        RegistryKind::AzureAcr => {
            let inputs = registry::collect_acr(tools)?;
            let base = registry::login_acr(&engine, tools, &inputs)?;
            RegistryTarget::new(kind, &base, &registry::collect_prefix(tools)?)
        }
        RegistryKind::GcpGar => {
            let inputs = registry::collect_gar(tools)?;
            let base = registry::login_gar(&engine, &inputs)?;
            RegistryTarget::new(kind, &base, "")
        }
    }
    .with_exclusions(&tools.config.publish.exclude);

    if kind == RegistryKind::GcpGar && !tools.config.publish.gcp_push_images {
        tracing::warn!(
            destination = %target.base_url,
            "GCP backend authenticates but does not push images; set publish.gcp_push_images to enable"
        );
        return Ok(PushReport::default());
    }

    let images = engine.list_images()?;
    tracing::info!(count = images.len(), "local images found");

    if let Some(region) = &ecr_region {
        let repos = registry::ecr_repositories(
            &target,
            &images,
            &tools.config.publish.ecr_auxiliary_repositories,
        );
        let created = registry::provision_ecr(tools, region, &repos)?;
        tracing::info!(checked = repos.len(), created, "ECR repositories provisioned");
    }

    let (plan, skipped) = plan_pushes(&target, &images);
    for image in &skipped {
        tracing::info!(image = %image, "already a registry image, not pushing");
    }
    let mut report = push_all(&engine, &plan, tools.config.publish.isolation_for(kind))?;
    report.skipped = skipped;
    tracing::info!(
        pushed = report.pushed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "push finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ContainerEngine, InstallerConfig};
    use crate::services::testing::{
        failed, ok, toolbox, FakeArchiver, FakeDownloader, FakeRunner, ScriptedPrompter,
    };

    fn run_publish(
        runner: &FakeRunner,
        answers: &[&str],
        config: &InstallerConfig,
    ) -> (InstallContext, anyhow::Result<PushReport>) {
        let ctx = InstallContext::new("1.0", "/tmp");
        let (dl, archiver, prompter) = (
            FakeDownloader::new(),
            FakeArchiver::new(),
            ScriptedPrompter::new(answers),
        );
        let tools = toolbox(runner, &dl, &archiver, &prompter, config);
        let result = publish(&ctx, &tools);
        (ctx, result)
    }

    #[test]
    fn generic_scenario_pushes_app_to_registry_root() {
        let runner = FakeRunner::new().on("docker images", ok("app:1.0\nregistry.io/other:2.0\n"));
        let (ctx, report) = run_publish(
            &runner,
            &["1", "https://harbor.example.com", "admin", "pw", "datarobot-dev"],
            &InstallerConfig::default(),
        );
        let report = report.unwrap();

        assert_eq!(ctx.environment(), Some(RegistryKind::Generic));
        assert_eq!(
            report.pushed,
            vec![ImageRef::new("harbor.example.com/app", "1.0")]
        );
        assert_eq!(report.skipped, vec![ImageRef::new("registry.io/other", "2.0")]);
        assert_eq!(runner.count_prefix("docker tag"), 1);
        assert_eq!(runner.count_prefix("docker push"), 1);
        assert!(runner
            .lines()
            .contains(&"docker tag app:1.0 harbor.example.com/app:1.0".to_string()));
        assert!(runner
            .lines()
            .contains(&"docker push harbor.example.com/app:1.0".to_string()));
    }

    #[test]
    fn generic_isolates_per_image_failures() {
        let runner = FakeRunner::new()
            .on("docker images", ok("app:1.0\nweb:2.0\n"))
            .on("docker push harbor.example.com/app:1.0", failed("denied"));
        let (_, report) = run_publish(
            &runner,
            &["1", "harbor.example.com", "admin", "pw", ""],
            &InstallerConfig::default(),
        );
        let report = report.unwrap();
        assert_eq!(report.failed, vec![ImageRef::new("app", "1.0")]);
        assert_eq!(report.pushed, vec![ImageRef::new("harbor.example.com/web", "2.0")]);
    }

    #[test]
    fn generic_drops_the_local_namespace() {
        let runner = FakeRunner::new().on("docker images", ok("datarobot/app:1.0\n"));
        let (_, report) = run_publish(
            &runner,
            &["1", "harbor.example.com", "admin", "pw", "datarobot-dev"],
            &InstallerConfig::default(),
        );
        assert_eq!(
            report.unwrap().pushed,
            vec![ImageRef::new("harbor.example.com/app", "1.0")]
        );
    }

    #[test]
    fn azure_isolates_per_image_failures() {
        let runner = FakeRunner::new()
            .on(
                "az acr login",
                ok(r#"{"accessToken":"acr-token","loginServer":"drimages.azurecr.io"}"#),
            )
            .on("docker images", ok("app:1.0\nweb:2.0\nregistry.io/base:1\n"))
            .on("docker push drimages.azurecr.io/team/app:1.0", failed("denied"));
        let (ctx, report) = run_publish(
            &runner,
            &["3", "drimages", "team"],
            &InstallerConfig::default(),
        );
        let report = report.unwrap();

        assert_eq!(ctx.environment(), Some(RegistryKind::AzureAcr));
        assert_eq!(report.failed, vec![ImageRef::new("app", "1.0")]);
        assert_eq!(report.pushed, vec![ImageRef::new("drimages.azurecr.io/team/web", "2.0")]);
        assert_eq!(report.skipped, vec![ImageRef::new("registry.io/base", "1")]);

        let login = runner
            .calls()
            .into_iter()
            .find(|c| c.to_string().starts_with("docker login"))
            .unwrap();
        assert_eq!(
            login.to_string(),
            "docker login --username 00000000-0000-0000-0000-000000000000 --password-stdin drimages.azurecr.io"
        );
        assert_eq!(login.stdin.as_deref(), Some("acr-token"));
    }

    #[test]
    fn per_image_survives_a_command_that_cannot_start() {
        let runner = FakeRunner::new().unstartable("docker push r/a");
        let engine = Engine::new(ContainerEngine::Docker, &runner);
        let plan = vec![
            (ImageRef::new("a", "1"), ImageRef::new("r/a", "1")),
            (ImageRef::new("b", "1"), ImageRef::new("r/b", "1")),
        ];
        let report = push_all(&engine, &plan, IsolationPolicy::PerImage).unwrap();
        assert_eq!(report.failed, vec![ImageRef::new("a", "1")]);
        assert_eq!(report.pushed, vec![ImageRef::new("r/b", "1")]);

        let err = push_all(&engine, &plan, IsolationPolicy::AbortBatch).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::Push { image, .. }) if image == "a:1"
        ));
    }

    #[test]
    fn failed_login_stops_before_enumeration() {
        let runner = FakeRunner::new().on("docker login", failed("unauthorized"));
        let (_, result) = run_publish(
            &runner,
            &["1", "harbor.example.com", "admin", "bad"],
            &InstallerConfig::default(),
        );
        assert!(matches!(
            result.unwrap_err().downcast_ref::<InstallError>(),
            Some(InstallError::Authentication { .. })
        ));
        assert_eq!(runner.count_prefix("docker images"), 0);
    }

    #[test]
    fn aws_provisions_before_pushing_and_aborts_on_first_failure() {
        let runner = FakeRunner::new()
            .on("aws ecr get-login-password", ok("tok"))
            .on("aws ecr describe-repositories", failed("RepositoryNotFoundException"))
            .on("docker images", ok("app:1.0\nweb:2.0\n"))
            .on("docker push", failed("denied"));
        let (ctx, result) = run_publish(
            &runner,
            &["2", "us-east-1", "123.dkr.ecr.us-east-1.amazonaws.com", "dr"],
            &InstallerConfig::default(),
        );

        assert!(matches!(
            result.unwrap_err().downcast_ref::<InstallError>(),
            Some(InstallError::Push { image, .. }) if image == "app:1.0"
        ));
        assert_eq!(ctx.environment(), Some(RegistryKind::AwsEcr));
        // two local repositories plus five auxiliary ones
        assert_eq!(runner.count_prefix("aws ecr create-repository"), 7);
        assert!(runner.lines().contains(
            &"aws ecr create-repository --region us-east-1 --repository-name dr/custom-apps/managed-image"
                .to_string()
        ));
        let lines = runner.lines();
        let last_create = lines
            .iter()
            .rposition(|l| l.starts_with("aws ecr create-repository"))
            .unwrap();
        let first_tag = lines.iter().position(|l| l.starts_with("docker tag")).unwrap();
        assert!(last_create < first_tag);
        assert_eq!(runner.count_prefix("docker push"), 1);
    }

    #[test]
    fn isolation_override_applies_to_aws() {
        let runner = FakeRunner::new()
            .on("aws ecr get-login-password", ok("tok"))
            .on("docker images", ok("app:1.0\nweb:2.0\n"))
            .on("docker push", failed("denied"));
        let mut config = InstallerConfig::default();
        config.publish.isolation = Some(IsolationPolicy::PerImage);
        let (_, result) = run_publish(
            &runner,
            &["2", "us-east-1", "123.dkr.ecr.us-east-1.amazonaws.com", "dr"],
            &config,
        );
        assert_eq!(result.unwrap().failed.len(), 2);
    }

    #[test]
    fn gcp_authenticates_but_does_not_push_by_default() {
        let var = "DR_INSTALL_TEST_PUBLISH_GAR_KEY";
        std::env::set_var(var, "e30=");
        let mut config = InstallerConfig {
            gcp_key_env: var.to_string(),
            ..InstallerConfig::default()
        };
        let runner = FakeRunner::new().on("docker images", ok("app:1.0\n"));
        let (ctx, report) = run_publish(&runner, &["4", "europe-west1", "proj", "images"], &config);
        assert_eq!(report.unwrap(), PushReport::default());
        assert_eq!(ctx.environment(), Some(RegistryKind::GcpGar));
        assert_eq!(runner.count_prefix("docker login"), 1);
        assert_eq!(runner.count_prefix("docker images"), 0);

        config.publish.gcp_push_images = true;
        let runner = FakeRunner::new().on("docker images", ok("app:1.0\n"));
        let (_, report) = run_publish(&runner, &["4", "europe-west1", "proj", "images"], &config);
        assert_eq!(
            report.unwrap().pushed,
            vec![ImageRef::new("europe-west1-docker.pkg.dev/proj/images/app", "1.0")]
        );
        std::env::remove_var(var);
    }

    #[test]
    fn plan_excludes_target_host_and_configured_extras() {
        let target = RegistryTarget::new(RegistryKind::AzureAcr, "dr.azurecr.io", "team")
            .with_exclusions(&["quay.io".to_string()]);
        let images = vec![
            ImageRef::new("dr.azurecr.io/team/app", "1.0"),
            ImageRef::new("quay.io/x", "1"),
            ImageRef::new("mongo", "6"),
        ];
        let (plan, skipped) = plan_pushes(&target, &images);
        assert_eq!(skipped.len(), 2);
        assert_eq!(
            plan,
            vec![(ImageRef::new("mongo", "6"), ImageRef::new("dr.azurecr.io/team/mongo", "6"))]
        );
    }

    #[test]
    fn abort_batch_stops_at_failed_tag() {
        let runner = FakeRunner::new().on("podman tag", failed("no such image"));
        let engine = Engine::new(ContainerEngine::Podman, &runner);
        let plan = vec![
            (ImageRef::new("a", "1"), ImageRef::new("r/a", "1")),
            (ImageRef::new("b", "1"), ImageRef::new("r/b", "1")),
        ];
        let err = push_all(&engine, &plan, IsolationPolicy::AbortBatch).unwrap_err();
        assert!(err.to_string().contains("tag: no such image"));
        assert_eq!(runner.lines().len(), 1);
    }
}
