use crate::config::{AttestationConfig, ConfigStore};
use crate::context::AttestContext;
use crate::digest::DigestComputer;
use crate::errors::{AttestError, LookupKind, Result};
use crate::identity::{lookup_group_name_str, lookup_name, IdentityResolver, SystemIdentityResolver};
use crate::process::{default_process_source, ProcRoot, ProcessIdentity, ProcessSource};
use crate::selectors::{AttributedIdentity, SelectorBuilder, SelectorValue, SupplementaryGroup};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttestationStage {
    Start,
    Inspecting,
    ResolvingNames,
    DiscoveringPath,
    Digesting,
    Building,
    Done,
    Failed,
}

impl AttestationStage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AttestationStage::Start => "starting",
            AttestationStage::Inspecting => "inspecting process",
            AttestationStage::ResolvingNames => "resolving names",
            AttestationStage::DiscoveringPath => "discovering workload path",
            AttestationStage::Digesting => "digesting",
            AttestationStage::Building => "building selectors",
            AttestationStage::Done => "done",
            AttestationStage::Failed => "failed",
        }
    }
}

impl Display for AttestationStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one in-flight attestation. Holds the config snapshot taken at `Start`.
struct AttestationRun {
    pid: u32,
    stage: AttestationStage,
    config: Arc<AttestationConfig>,
}

impl AttestationRun {
    fn start(pid: u32, config: Arc<AttestationConfig>) -> Self {
        debug!(pid, ?config, "attestation started");
        Self {
            pid,
            stage: AttestationStage::Start,
            config,
        }
    }

    fn advance(&mut self, next: AttestationStage) {
        debug!(pid = self.pid, from = %self.stage, to = %next, "attestation stage");
        self.stage = next;
    }
}

/// Derives the selector set of a local process.
///
/// Runs are independent: the engine only shares the [`ConfigStore`] and its stateless
/// collaborators between concurrent calls.
pub struct AttestationEngine {
    config: ConfigStore,
    source: Arc<dyn ProcessSource>,
    resolver: Arc<dyn IdentityResolver>,
    digest: DigestComputer,
}

impl AttestationEngine {
    pub fn new(
        config: ConfigStore,
        source: Arc<dyn ProcessSource>,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            config,
            source,
            resolver,
            digest: DigestComputer::new(),
        }
    }

    /// Engine backed by the platform process source (honouring `HOST_PROC`) and the OS
    /// identity database.
    pub fn from_store(config: ConfigStore) -> Result<Self> {
        let root = ProcRoot::from_env()?;
        debug!(root = %root.path().display(), "using process root");
        Ok(Self::new(
            config,
            default_process_source(root),
            Arc::new(SystemIdentityResolver),
        ))
    }

    pub fn with_digest_computer(mut self, digest: DigestComputer) -> Self {
        self.digest = digest;
        self
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    /// Returns the complete, ordered selector list for `pid`, or the first fatal error.
    /// Never both: partial state is dropped on failure. No stage is retried.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn attest(&self, ctx: &AttestContext, pid: u32) -> Result<Vec<SelectorValue>> {
        let mut run = AttestationRun::start(pid, self.config.snapshot());

        match self.run(ctx, &mut run).await {
            Ok(selectors) => {
                run.advance(AttestationStage::Done);
                Ok(selectors)
            }
            Err(err) => {
                debug!(pid, stage = %run.stage, error = %err, "attestation failed");
                run.advance(AttestationStage::Failed);
                Err(err)
            }
        }
    }

    async fn run(&self, ctx: &AttestContext, run: &mut AttestationRun) -> Result<Vec<SelectorValue>> {
        let pid = run.pid;
        let config = Arc::clone(&run.config);

        run.advance(AttestationStage::Inspecting);
        let source = Arc::clone(&self.source);
        let (inspector, identity) = blocking(ctx, run.stage, move || {
            let inspector = source.open(pid)?;
            let identity = ProcessIdentity::collect(inspector.as_ref())?;
            Ok((inspector, identity))
        })
        .await?;

        run.advance(AttestationStage::ResolvingNames);
        let resolver = Arc::clone(&self.resolver);
        let (mut attributed, identity) = blocking(ctx, run.stage, move || {
            let attributed = resolve_names(resolver.as_ref(), &identity)?;
            Ok((attributed, identity))
        })
        .await?;

        if config.discover_workload_path {
            run.advance(AttestationStage::DiscoveringPath);
            let path = blocking(ctx, run.stage, move || inspector.exe_path()).await?;
            attributed.path = Some(path);

            if let Some(max_bytes) = config.digest_policy().max_bytes() {
                run.advance(AttestationStage::Digesting);
                let digest = self
                    .digest
                    .sha256(&identity.namespaced_exe_path, max_bytes, ctx)
                    .await?;
                attributed.sha256 = Some(digest);
            }
        }

        run.advance(AttestationStage::Building);
        ctx.check(run.stage.as_str())?;
        Ok(SelectorBuilder::build(&attributed))
    }
}

fn resolve_names(
    resolver: &dyn IdentityResolver,
    identity: &ProcessIdentity,
) -> Result<AttributedIdentity> {
    let uid = identity.primary_uid();
    let gid = identity.primary_gid();

    let user = lookup_name(resolver, LookupKind::User, uid)?;
    let group = lookup_name(resolver, LookupKind::Group, gid)?;

    let supplementary_groups = identity
        .supplementary_group_ids
        .iter()
        .map(|gid| -> Result<SupplementaryGroup> {
            Ok(SupplementaryGroup {
                gid: gid.clone(),
                name: lookup_group_name_str(resolver, gid)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AttributedIdentity {
        uid,
        user,
        gid,
        group,
        supplementary_groups,
        path: None,
        sha256: None,
    })
}

/// Runs a blocking OS query off the async runtime, giving up when the caller's deadline
/// passes or the run is cancelled.
async fn blocking<T, F>(ctx: &AttestContext, stage: AttestationStage, task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let stage = stage.as_str();
    ctx.check(stage)?;

    let handle = tokio::task::spawn_blocking(task);
    tokio::select! {
        biased;
        _ = ctx.done() => Err(AttestError::DeadlineExceeded { stage }),
        joined = handle => match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(AttestError::DeadlineExceeded { stage }),
        },
    }
}
